//! Markdown to render tree conversion.
//!
//! Walks the `markdown-weaver` event stream and builds a [`RenderNode`] tree
//! directly, instead of producing an HTML string, so the result can be diffed
//! against the previous render. Raw HTML (block and inline) is tokenized and
//! folded into the same tree, bare URLs become links, and fenced code blocks
//! go through a [`CodeHighlighter`].

use std::collections::HashMap;
use std::sync::LazyLock;

use markdown_weaver::{Alignment, CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};
use regex_lite::Regex;

use crate::highlight::{CodeHighlighter, SyntectHighlighter};
use crate::html::{self, HtmlToken};
use crate::tree::{Element, RenderNode, is_void_element, push_node, push_text};

/// Bare URLs: `http(s)://` and `www.` prefixed, email addresses, and plain
/// host names. Trailing punctuation is left out of the link.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(?:(?P<url>(?:https?://|www\.)[^\s<>]*[^\s<>.,:;!?'")\]])|(?P<email>[a-z0-9._%+-]+@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,})|(?P<host>(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}(?::[0-9]{1,5})?(?:/(?:[^\s<>]*[^\s<>.,:;!?'")\]])?)?))"#,
    )
    .unwrap()
});

/// Generic top-level domains accepted without a scheme. Any two-letter
/// label is taken as a country code.
const FUZZY_TLDS: &[&str] = &[
    "biz", "com", "edu", "gov", "net", "org", "pro", "web", "xxx", "aero", "asia", "coop",
    "info", "museum", "name", "shop",
];

fn known_tld(host: &str) -> bool {
    let tld = host.rsplit('.').next().unwrap_or_default();
    tld.len() == 2 || FUZZY_TLDS.iter().any(|known| tld.eq_ignore_ascii_case(known))
}

pub fn default_md_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
}

/// Converts markdown text into a render tree.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer<H = SyntectHighlighter> {
    highlighter: H,
    options: Options,
    linkify: bool,
}

impl Default for MarkdownRenderer<SyntectHighlighter> {
    fn default() -> Self {
        Self::new(SyntectHighlighter)
    }
}

impl<H: CodeHighlighter> MarkdownRenderer<H> {
    pub fn new(highlighter: H) -> Self {
        Self {
            highlighter,
            options: default_md_options(),
            linkify: true,
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Toggle automatic link detection in plain text.
    pub fn with_linkify(mut self, linkify: bool) -> Self {
        self.linkify = linkify;
        self
    }

    pub fn highlighter(&self) -> &H {
        &self.highlighter
    }

    /// Render `source` to the children of the content mount.
    pub fn render(&self, source: &str) -> Vec<RenderNode> {
        let mut builder = TreeBuilder::new(&self.highlighter, self.linkify);
        for event in Parser::new_ext(source, self.options) {
            builder.event(event);
        }
        builder.finish()
    }
}

/// Why a frame is on the builder stack, and what to do when it closes.
#[derive(Debug)]
enum Role {
    Root,
    /// Opened by a markdown start tag.
    Markdown,
    /// Opened by a raw HTML tag; closed by its end tag or when an enclosing
    /// markdown frame closes.
    Html,
    /// Contributes no element; children are spliced into the parent.
    Transparent,
    /// Content is dropped (metadata blocks).
    Discard,
    /// Buffers code until the block ends.
    Code { lang: Option<String>, buffer: String },
    /// Children become the `alt` attribute.
    Image,
    Table,
    TableHead,
}

#[derive(Debug)]
struct Frame {
    role: Role,
    element: Element,
}

impl Frame {
    fn new(role: Role, tag: &str) -> Self {
        Self {
            role,
            element: Element::new(tag),
        }
    }

    fn bare(role: Role) -> Self {
        Self::new(role, "")
    }
}

struct TreeBuilder<'h, H> {
    highlighter: &'h H,
    linkify: bool,
    stack: Vec<Frame>,
    table_alignments: Vec<Alignment>,
    table_cell_index: usize,
    in_table_head: bool,
    footnote_numbers: HashMap<String, usize>,
}

impl<'h, H: CodeHighlighter> TreeBuilder<'h, H> {
    fn new(highlighter: &'h H, linkify: bool) -> Self {
        Self {
            highlighter,
            linkify,
            stack: vec![Frame::bare(Role::Root)],
            table_alignments: Vec::new(),
            table_cell_index: 0,
            in_table_head: false,
            footnote_numbers: HashMap::new(),
        }
    }

    fn finish(mut self) -> Vec<RenderNode> {
        while self.stack.len() > 1 {
            self.pop_and_attach();
        }
        self.stack
            .pop()
            .map(|root| root.element.children)
            .unwrap_or_default()
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text, self.linkify),
            Event::Code(code) => {
                let mut el = Element::new("code");
                el.push_text(&code);
                self.attach(el.into());
            }
            Event::Html(raw) | Event::InlineHtml(raw) => self.raw_html(&raw),
            Event::SoftBreak => self.text("\n", false),
            Event::HardBreak => {
                self.attach(Element::new("br").into());
                self.text("\n", false);
            }
            Event::Rule => self.attach(Element::new("hr").into()),
            Event::FootnoteReference(name) => {
                let number = self.footnote_number(&name);
                let link = Element::new("a")
                    .with_attr("href", format!("#{name}"))
                    .with_child(RenderNode::text(number.to_string()));
                let sup = Element::new("sup")
                    .with_attr("class", "footnote-reference")
                    .with_child(link.into());
                self.attach(sup.into());
            }
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input")
                    .with_attr("disabled", "")
                    .with_attr("type", "checkbox");
                if checked {
                    input.set_attr("checked", "");
                }
                self.attach(input.into());
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::new(Role::Markdown, "p"),
            Tag::Heading {
                level, id, classes, ..
            } => {
                let mut frame = Frame::new(Role::Markdown, &level.to_string());
                if let Some(id) = id {
                    frame.element.set_attr("id", id.to_string());
                }
                if !classes.is_empty() {
                    let classes: Vec<&str> = classes.iter().map(|c| c.as_ref()).collect();
                    frame.element.set_attr("class", classes.join(" "));
                }
                frame
            }
            Tag::BlockQuote(_) => Frame::new(Role::Markdown, "blockquote"),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .filter(|lang| !lang.is_empty())
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                Frame::bare(Role::Code {
                    lang,
                    buffer: String::new(),
                })
            }
            Tag::HtmlBlock => Frame::bare(Role::Transparent),
            Tag::List(Some(1)) => Frame::new(Role::Markdown, "ol"),
            Tag::List(Some(start)) => {
                let mut frame = Frame::new(Role::Markdown, "ol");
                frame.element.set_attr("start", start.to_string());
                frame
            }
            Tag::List(None) => Frame::new(Role::Markdown, "ul"),
            Tag::Item => Frame::new(Role::Markdown, "li"),
            Tag::FootnoteDefinition(label) => {
                let number = self.footnote_number(&label);
                let mut frame = Frame::new(Role::Markdown, "div");
                frame.element.set_attr("class", "footnote-definition");
                frame.element.set_attr("id", label.to_string());
                frame.element.children.push(
                    Element::new("sup")
                        .with_attr("class", "footnote-definition-label")
                        .with_child(RenderNode::text(number.to_string()))
                        .into(),
                );
                frame
            }
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                Frame::new(Role::Table, "table")
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.table_cell_index = 0;
                Frame::new(Role::TableHead, "tr")
            }
            Tag::TableRow => {
                self.table_cell_index = 0;
                Frame::new(Role::Markdown, "tr")
            }
            Tag::TableCell => {
                let tag = if self.in_table_head { "th" } else { "td" };
                let mut frame = Frame::new(Role::Markdown, tag);
                let align = match self.table_alignments.get(self.table_cell_index) {
                    Some(Alignment::Left) => Some("left"),
                    Some(Alignment::Center) => Some("center"),
                    Some(Alignment::Right) => Some("right"),
                    _ => None,
                };
                if let Some(align) = align {
                    frame
                        .element
                        .set_attr("style", format!("text-align: {align}"));
                }
                self.table_cell_index += 1;
                frame
            }
            Tag::Emphasis => Frame::new(Role::Markdown, "em"),
            Tag::Strong => Frame::new(Role::Markdown, "strong"),
            Tag::Strikethrough => Frame::new(Role::Markdown, "s"),
            Tag::Superscript => Frame::new(Role::Markdown, "sup"),
            Tag::Subscript => Frame::new(Role::Markdown, "sub"),
            Tag::DefinitionList => Frame::new(Role::Markdown, "dl"),
            Tag::DefinitionListTitle => Frame::new(Role::Markdown, "dt"),
            Tag::DefinitionListDefinition => Frame::new(Role::Markdown, "dd"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let mut frame = Frame::new(Role::Markdown, "a");
                let href = match link_type {
                    LinkType::Email => format!("mailto:{dest_url}"),
                    _ => dest_url.to_string(),
                };
                frame.element.set_attr("href", href);
                if !title.is_empty() {
                    frame.element.set_attr("title", title.to_string());
                }
                frame
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut frame = Frame::new(Role::Image, "img");
                frame.element.set_attr("src", dest_url.to_string());
                frame.element.set_attr("alt", "");
                if !title.is_empty() {
                    frame.element.set_attr("title", title.to_string());
                }
                frame
            }
            Tag::MetadataBlock(_) => Frame::bare(Role::Discard),
            _ => Frame::bare(Role::Transparent),
        };
        self.stack.push(frame);
    }

    fn end_tag(&mut self, tag: TagEnd) {
        // The frame this end tag closes is the topmost one not opened by raw HTML.
        let Some(target) = self
            .stack
            .iter()
            .rposition(|frame| !matches!(frame.role, Role::Html))
        else {
            return;
        };
        if target == 0 {
            tracing::trace!(?tag, "unbalanced markdown end tag");
            return;
        }

        // An HTML block may leave elements open for later blocks to close
        // (`<div>` ... markdown ... `</div>`). Keep them open and dissolve
        // the block frame underneath.
        if matches!(self.stack[target].role, Role::Transparent) && target + 1 < self.stack.len() {
            let frame = self.stack.remove(target);
            self.stack[target - 1]
                .element
                .children
                .extend(frame.element.children);
            return;
        }

        while self.stack.len() > target + 1 {
            self.pop_and_attach();
        }
        self.pop_and_attach();
    }

    /// Close the top frame and hand its result to the new top.
    fn pop_and_attach(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let mut element = frame.element;
        match frame.role {
            Role::Root => {
                // Never popped except by `finish`.
                self.stack.push(Frame {
                    role: Role::Root,
                    element,
                });
            }
            Role::Markdown | Role::Html => self.attach(element.into()),
            Role::Transparent => {
                for child in element.children {
                    self.attach(child);
                }
            }
            Role::Discard => {}
            Role::Code { lang, buffer } => {
                let code = self.code_block(lang.as_deref(), &buffer);
                self.attach(code.into());
            }
            Role::Image => {
                let alt: String = element
                    .children
                    .iter()
                    .map(RenderNode::text_content)
                    .collect();
                element.children.clear();
                element.set_attr("alt", alt);
                self.attach(element.into());
            }
            Role::TableHead => {
                self.in_table_head = false;
                let thead = Element::new("thead").with_child(element.into());
                self.attach(thead.into());
            }
            Role::Table => {
                let mut children = std::mem::take(&mut element.children).into_iter().peekable();
                if let Some(RenderNode::Element(head)) = children.peek() {
                    if head.tag == "thead" {
                        if let Some(head) = children.next() {
                            element.children.push(head);
                        }
                    }
                }
                let rows: Vec<RenderNode> = children.collect();
                if !rows.is_empty() {
                    let mut tbody = Element::new("tbody");
                    tbody.children = rows;
                    element.children.push(tbody.into());
                }
                self.table_alignments.clear();
                self.attach(element.into());
            }
        }
    }

    /// Add a finished node to the current top frame.
    fn attach(&mut self, node: RenderNode) {
        let Some(top) = self.stack.last_mut() else {
            return;
        };
        match &mut top.role {
            Role::Discard => {}
            Role::Code { buffer, .. } => buffer.push_str(&node.text_content()),
            _ => push_node(&mut top.element.children, node),
        }
    }

    fn text(&mut self, text: &str, linkify: bool) {
        let in_link = self.stack.iter().any(|frame| frame.element.tag == "a");
        let Some(top) = self.stack.last_mut() else {
            return;
        };
        match &mut top.role {
            Role::Discard => {}
            Role::Code { buffer, .. } => buffer.push_str(text),
            _ if linkify && !in_link => linkify_into(&mut top.element.children, text),
            _ => push_text(&mut top.element.children, text),
        }
    }

    fn raw_html(&mut self, raw: &str) {
        for token in html::tokenize(raw) {
            match token {
                HtmlToken::Open {
                    tag,
                    attrs,
                    self_closing,
                } => {
                    let mut element = Element::new(tag);
                    element.attrs = attrs;
                    if self_closing || is_void_element(&element.tag) {
                        self.attach(element.into());
                    } else {
                        self.stack.push(Frame {
                            role: Role::Html,
                            element,
                        });
                    }
                }
                HtmlToken::Close { tag } => self.close_html(&tag),
                HtmlToken::Text(text) => self.text(&text, false),
            }
        }
    }

    /// Close the nearest open raw-HTML element named `tag`. Searches through
    /// HTML and block frames but never past a markdown frame; a close tag with
    /// no match is ignored.
    fn close_html(&mut self, tag: &str) {
        let mut found = None;
        for (index, frame) in self.stack.iter().enumerate().skip(1).rev() {
            match frame.role {
                Role::Html if frame.element.tag == tag => {
                    found = Some(index);
                    break;
                }
                Role::Html | Role::Transparent => continue,
                _ => break,
            }
        }
        let Some(index) = found else {
            return;
        };

        let mut reopen = 0;
        while self.stack.len() > index + 1 {
            if matches!(
                self.stack.last().map(|frame| &frame.role),
                Some(Role::Transparent)
            ) {
                reopen += 1;
            }
            self.pop_and_attach();
        }
        self.pop_and_attach();
        for _ in 0..reopen {
            self.stack.push(Frame::bare(Role::Transparent));
        }
    }

    fn code_block(&self, lang: Option<&str>, code: &str) -> Element {
        let mut code_el = Element::new("code");
        let highlighted = lang.and_then(|lang| match self.highlighter.highlight(code, lang) {
            Ok(html) => html,
            Err(err) => {
                tracing::debug!(%err, "code highlighting failed, using plain text");
                None
            }
        });
        match highlighted {
            Some(html) => code_el.children = html::parse_fragment(&html),
            None => code_el.push_text(code),
        }
        Element::new("pre")
            .with_attr("class", "hljs")
            .with_child(code_el.into())
    }

    fn footnote_number(&mut self, name: &str) -> usize {
        let next = self.footnote_numbers.len() + 1;
        *self.footnote_numbers.entry(name.to_owned()).or_insert(next)
    }
}

/// Push `text`, turning bare URLs, hosts and email addresses into `<a>`
/// elements.
fn linkify_into(children: &mut Vec<RenderNode>, text: &str) {
    let mut last = 0;
    for caps in LINK_RE.captures_iter(text) {
        let Some(found) = caps.get(0) else {
            continue;
        };
        let link = found.as_str();
        let href = if caps.name("email").is_some() {
            known_tld(link).then(|| format!("mailto:{link}"))
        } else if caps.name("host").is_some() {
            let host = link.split(['/', ':']).next().unwrap_or_default();
            known_tld(host).then(|| format!("http://{link}"))
        } else if link.len() >= 4 && link[..4].eq_ignore_ascii_case("www.") {
            Some(format!("http://{link}"))
        } else {
            Some(link.to_owned())
        };
        let Some(href) = href else {
            continue;
        };
        push_text(children, &text[last..found.start()]);
        children.push(
            Element::new("a")
                .with_attr("href", href)
                .with_child(RenderNode::text(link))
                .into(),
        );
        last = found.end();
    }
    push_text(children, &text[last..]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HighlightError;
    use crate::tree::to_html;

    fn render(source: &str) -> String {
        to_html(&MarkdownRenderer::new(SyntectHighlighter).render(source))
    }

    struct FailingHighlighter;

    impl CodeHighlighter for FailingHighlighter {
        fn highlight(&self, _code: &str, lang: &str) -> Result<Option<String>, HighlightError> {
            Err(HighlightError {
                lang: lang.to_owned(),
                message: "boom".into(),
            })
        }
    }

    #[test]
    fn test_heading_and_paragraph() {
        insta::assert_snapshot!(
            render("# Title\n\nhello *world*"),
            @"<h1>Title</h1><p>hello <em>world</em></p>"
        );
    }

    #[test]
    fn test_inline_html_passthrough() {
        let nodes = MarkdownRenderer::new(SyntectHighlighter).render("a <span class=\"x\">b</span> c");
        assert_eq!(
            to_html(&nodes),
            "<p>a <span class=\"x\">b</span> c</p>"
        );
    }

    #[test]
    fn test_html_block_wraps_later_markdown() {
        let nodes = MarkdownRenderer::new(SyntectHighlighter).render("<div class=\"box\">\n\n*hi*\n\n</div>\n");
        let div = nodes[0].as_element().unwrap();
        assert_eq!(div.tag, "div");
        assert_eq!(div.attr("class"), Some("box"));
        assert!(
            div.children
                .iter()
                .filter_map(RenderNode::as_element)
                .any(|child| child.tag == "p")
        );
    }

    #[test]
    fn test_unclosed_inline_html_closes_with_paragraph() {
        let nodes = MarkdownRenderer::new(SyntectHighlighter).render("<b>bold\n\nnext");
        assert_eq!(nodes.len(), 2);
        assert_eq!(to_html(&nodes[..1]), "<p><b>bold</b></p>");
    }

    #[test]
    fn test_linkify() {
        assert_eq!(
            render("see https://example.com/a, or www.rust-lang.org."),
            "<p>see <a href=\"https://example.com/a\">https://example.com/a</a>, or \
             <a href=\"http://www.rust-lang.org\">www.rust-lang.org</a>.</p>"
        );
    }

    #[test]
    fn test_linkify_hosts_and_emails() {
        assert_eq!(
            render("mail a@b.co or visit example.com/docs."),
            "<p>mail <a href=\"mailto:a@b.co\">a@b.co</a> or visit \
             <a href=\"http://example.com/docs\">example.com/docs</a>.</p>"
        );
    }

    #[test]
    fn test_linkify_skips_unknown_tlds() {
        assert_eq!(render("see main.rust, e.g. 1.5"), "<p>see main.rust, e.g. 1.5</p>");
    }

    #[test]
    fn test_no_linkify_inside_links() {
        assert_eq!(
            render("[https://a.example](https://b.example)"),
            "<p><a href=\"https://b.example\">https://a.example</a></p>"
        );
    }

    #[test]
    fn test_unknown_language_falls_back_to_escaped_text() {
        assert_eq!(
            render("```klingon\n<b>qapla'</b>\n```"),
            "<pre class=\"hljs\"><code>&lt;b&gt;qapla'&lt;/b&gt;\n</code></pre>"
        );
    }

    #[test]
    fn test_highlighter_error_falls_back() {
        let renderer = MarkdownRenderer::new(FailingHighlighter);
        assert_eq!(
            to_html(&renderer.render("```rust\nlet x = 1 < 2;\n```")),
            "<pre class=\"hljs\"><code>let x = 1 &lt; 2;\n</code></pre>"
        );
    }

    #[test]
    fn test_known_language_is_highlighted() {
        let nodes = MarkdownRenderer::new(SyntectHighlighter).render("```rust\nfn main() {}\n```");
        let pre = nodes[0].as_element().unwrap();
        let code = pre.children[0].as_element().unwrap();
        assert!(code.children.iter().any(|child| child.as_element().is_some()));
        assert_eq!(code.children.iter().map(RenderNode::text_content).collect::<String>(), "fn main() {}\n");
    }

    #[test]
    fn test_table_structure() {
        insta::assert_snapshot!(
            render("| a | b |\n|:--|--:|\n| 1 | 2 |"),
            @r#"<table><thead><tr><th style="text-align: left">a</th><th style="text-align: right">b</th></tr></thead><tbody><tr><td style="text-align: left">1</td><td style="text-align: right">2</td></tr></tbody></table>"#
        );
    }

    #[test]
    fn test_image_alt_text() {
        assert_eq!(
            render("![a *cat*](cat.png \"Cat\")"),
            "<p><img src=\"cat.png\" alt=\"a cat\" title=\"Cat\"></p>"
        );
    }

    #[test]
    fn test_task_list() {
        assert_eq!(
            render("- [x] done"),
            "<ul><li><input disabled=\"\" type=\"checkbox\" checked=\"\">done</li></ul>"
        );
    }
}
