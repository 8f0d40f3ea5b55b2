//! Render tree for the preview content mount.
//!
//! The tree mirrors the DOM one-to-one: every [`RenderNode`] becomes exactly
//! one DOM node, so child indices in patches line up with `childNodes`.

use markdown_weaver_escape::{escape_html, escape_html_body_text};

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderNode {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    /// Attributes in source order. Names are unique.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<RenderNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value of the same name.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(n, _)| n != name);
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: RenderNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append text, merging with a trailing text node.
    pub fn push_text(&mut self, text: &str) {
        push_text(&mut self.children, text);
    }
}

impl RenderNode {
    pub fn element(tag: impl Into<String>) -> Element {
        Element::new(tag)
    }

    pub fn text(text: impl Into<String>) -> Self {
        RenderNode::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            RenderNode::Element(el) => Some(el),
            RenderNode::Text(_) => None,
        }
    }

    /// Concatenated text of this subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            RenderNode::Text(text) => out.push_str(text),
            RenderNode::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        match self {
            RenderNode::Text(_) => 1,
            RenderNode::Element(el) => 1 + el.children.iter().map(Self::node_count).sum::<usize>(),
        }
    }

    pub fn write_html(&self, out: &mut String) {
        match self {
            RenderNode::Text(text) => {
                let _ = escape_html_body_text(&mut *out, text);
            }
            RenderNode::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    let _ = escape_html(&mut *out, value);
                    out.push('"');
                }
                out.push('>');
                if is_void_element(&el.tag) {
                    return;
                }
                for child in &el.children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

impl From<Element> for RenderNode {
    fn from(el: Element) -> Self {
        RenderNode::Element(el)
    }
}

/// Append text to a child list, merging with a trailing text node so the
/// tree never holds adjacent text siblings.
pub fn push_text(children: &mut Vec<RenderNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(RenderNode::Text(last)) = children.last_mut() {
        last.push_str(text);
    } else {
        children.push(RenderNode::Text(text.to_owned()));
    }
}

/// Append a node, merging text into a trailing text node.
pub fn push_node(children: &mut Vec<RenderNode>, node: RenderNode) {
    match node {
        RenderNode::Text(text) => push_text(children, &text),
        el => children.push(el),
    }
}

/// Serialize a list of sibling nodes.
pub fn to_html(nodes: &[RenderNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_html(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_escapes() {
        let node: RenderNode = Element::new("a")
            .with_attr("href", "x\"y")
            .with_child(RenderNode::text("1 < 2 & 3"))
            .into();
        assert_eq!(
            to_html(&[node]),
            "<a href=\"x&quot;y\">1 &lt; 2 &amp; 3</a>"
        );
    }

    #[test]
    fn test_void_elements_have_no_closing_tag() {
        let node: RenderNode = Element::new("br").into();
        assert_eq!(to_html(&[node]), "<br>");
    }

    #[test]
    fn test_push_text_merges() {
        let mut children = Vec::new();
        push_text(&mut children, "a");
        push_text(&mut children, "b");
        push_node(&mut children, Element::new("em").into());
        push_text(&mut children, "c");
        assert_eq!(children.len(), 3);
        assert_eq!(children[0], RenderNode::text("ab"));
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut el = Element::new("div").with_attr("class", "a");
        el.set_attr("class", "b");
        assert_eq!(el.attrs, vec![("class".to_string(), "b".to_string())]);
        el.remove_attr("class");
        assert!(el.attrs.is_empty());
    }
}
