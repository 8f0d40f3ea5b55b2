//! Minimal HTML fragment tokenizer.
//!
//! Markdown passes raw HTML through in pieces (`<span class="x">`, text,
//! `</span>` may arrive as separate events), and highlighted code comes back
//! as classed `<span>` markup. Both are folded into the render tree token by
//! token, so this only needs tags, attributes, text and entities. Comments,
//! doctypes and processing instructions are dropped.

use std::borrow::Cow;

use crate::tree::{Element, RenderNode, is_void_element, push_node, push_text};

/// Elements whose content is raw text up to the matching close tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];
/// Elements whose content is text (entities decoded) up to the close tag.
const ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "title"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlToken<'a> {
    Open {
        tag: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    Close {
        tag: String,
    },
    /// Text with entities already decoded.
    Text(Cow<'a, str>),
}

/// Split an HTML fragment into tokens. Never fails: anything that does not
/// parse as markup is returned as text.
pub fn tokenize(fragment: &str) -> Vec<HtmlToken<'_>> {
    let bytes = fragment.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let rest = &fragment[pos..];

        if rest.starts_with("<!--") {
            pos = match rest[4..].find("-->") {
                Some(end) => pos + 4 + end + 3,
                None => bytes.len(),
            };
            continue;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            pos = match rest.find('>') {
                Some(end) => pos + end + 1,
                None => bytes.len(),
            };
            continue;
        }

        if rest.starts_with("</") && rest[2..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            if let Some(end) = rest.find('>') {
                let tag = tag_name(&rest[2..end]);
                tokens.push(HtmlToken::Close { tag });
                pos += end + 1;
                continue;
            }
        }

        if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            if let Some((token, consumed)) = parse_open_tag(rest) {
                pos += consumed;
                let raw_tag = match &token {
                    HtmlToken::Open {
                        tag,
                        self_closing: false,
                        ..
                    } if is_raw_text(tag) => Some(tag.clone()),
                    _ => None,
                };
                tokens.push(token);
                if let Some(tag) = raw_tag {
                    pos = consume_raw_text(fragment, pos, &tag, &mut tokens);
                }
                continue;
            }
        }

        // Plain text up to the next '<' that is not at the current position.
        let search_from = if rest.starts_with('<') { 1 } else { 0 };
        let end = rest[search_from..]
            .find('<')
            .map(|i| i + search_from)
            .unwrap_or(rest.len());
        tokens.push(HtmlToken::Text(decode_entities(&rest[..end])));
        pos += end;
    }

    tokens
}

/// Build nodes from a standalone, trusted fragment such as highlighter
/// output. Stray close tags are ignored and unclosed elements are closed at
/// the end.
pub fn parse_fragment(fragment: &str) -> Vec<RenderNode> {
    let mut stack: Vec<Element> = vec![Element::new("")];
    for token in tokenize(fragment) {
        match token {
            HtmlToken::Open {
                tag,
                attrs,
                self_closing,
            } => {
                let mut element = Element::new(tag);
                element.attrs = attrs;
                if self_closing || is_void_element(&element.tag) {
                    if let Some(top) = stack.last_mut() {
                        top.children.push(element.into());
                    }
                } else {
                    stack.push(element);
                }
            }
            HtmlToken::Close { tag } => {
                let Some(depth) = stack.iter().skip(1).rposition(|el| el.tag == tag) else {
                    continue;
                };
                while stack.len() > depth + 1 {
                    close_top(&mut stack);
                }
            }
            HtmlToken::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    push_text(&mut top.children, &text);
                }
            }
        }
    }
    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().map(|root| root.children).unwrap_or_default()
}

fn close_top(stack: &mut Vec<Element>) {
    if let Some(element) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            push_node(&mut parent.children, element.into());
        }
    }
}

fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag) || ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Emit the content of a raw-text element and its close tag. Returns the
/// new position.
fn consume_raw_text<'a>(
    fragment: &'a str,
    pos: usize,
    tag: &str,
    tokens: &mut Vec<HtmlToken<'a>>,
) -> usize {
    let rest = &fragment[pos..];
    let close = format!("</{tag}");
    let lower = rest.to_ascii_lowercase();
    let (content_end, after) = match lower.find(&close) {
        Some(start) => {
            let after = rest[start..]
                .find('>')
                .map(|i| start + i + 1)
                .unwrap_or(rest.len());
            (start, after)
        }
        None => (rest.len(), rest.len()),
    };

    let content = &rest[..content_end];
    if !content.is_empty() {
        let text = if RAW_TEXT_ELEMENTS.contains(&tag) {
            Cow::Borrowed(content)
        } else {
            decode_entities(content)
        };
        tokens.push(HtmlToken::Text(text));
    }
    if content_end < rest.len() {
        tokens.push(HtmlToken::Close {
            tag: tag.to_owned(),
        });
    }
    pos + after
}

fn tag_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ':')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Parse `<tag attr=value ...>` at the start of `input`. Returns the token
/// and the number of bytes consumed, or `None` if the tag is unterminated.
fn parse_open_tag(input: &str) -> Option<(HtmlToken<'static>, usize)> {
    let bytes = input.as_bytes();
    let mut i = 1;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-' || bytes[i] == b':')
    {
        i += 1;
    }
    let tag = input[1..i].to_ascii_lowercase();
    let mut attrs: Vec<(String, String)> = Vec::new();

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        match bytes[i] {
            b'>' => {
                return Some((
                    HtmlToken::Open {
                        tag,
                        attrs,
                        self_closing: false,
                    },
                    i + 1,
                ));
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Some((
                    HtmlToken::Open {
                        tag,
                        attrs,
                        self_closing: true,
                    },
                    i + 2,
                ));
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let name = input[name_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let mut value = String::new();
        if bytes.get(i) == Some(&b'=') {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match bytes.get(i) {
                Some(&quote @ (b'"' | b'\'')) => {
                    let start = i + 1;
                    let len = input[start..].find(quote as char)?;
                    value = decode_entities(&input[start..start + len]).into_owned();
                    i = start + len + 1;
                }
                Some(_) => {
                    let start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = decode_entities(&input[start..i]).into_owned();
                }
                None => return None,
            }
        }

        if !name.is_empty() && !attrs.iter().any(|(n, _)| *n == name) {
            attrs.push((name, value));
        }
    }
}

/// Decode character references. Unknown or malformed references are kept
/// literally.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|&end| end > 0 && end <= 32)
            .and_then(|end| decode_reference(&after[..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).filter(|&c| c != '\0');
    }
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "hellip" => '\u{2026}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(tag: &str, attrs: &[(&str, &str)]) -> HtmlToken<'static> {
        HtmlToken::Open {
            tag: tag.into(),
            attrs: attrs
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            self_closing: false,
        }
    }

    fn close(tag: &str) -> HtmlToken<'static> {
        HtmlToken::Close { tag: tag.into() }
    }

    fn text(t: &str) -> HtmlToken<'static> {
        HtmlToken::Text(Cow::Owned(t.into()))
    }

    #[test]
    fn test_element_with_attributes() {
        let tokens = tokenize(r#"<span class="hl-source" data-x='1' hidden>a &amp; b</span>"#);
        assert_eq!(
            tokens,
            vec![
                open("span", &[("class", "hl-source"), ("data-x", "1"), ("hidden", "")]),
                text("a & b"),
                close("span"),
            ]
        );
    }

    #[test]
    fn test_self_closing_and_unquoted() {
        let tokens = tokenize("<img src=a.png alt=x/>");
        assert_eq!(
            tokens,
            vec![HtmlToken::Open {
                tag: "img".into(),
                attrs: vec![
                    ("src".into(), "a.png".into()),
                    ("alt".into(), "x/".into())
                ],
                self_closing: false,
            }]
        );
        let tokens = tokenize("<br/>");
        assert!(matches!(
            &tokens[0],
            HtmlToken::Open { self_closing: true, .. }
        ));
    }

    #[test]
    fn test_comments_dropped() {
        assert_eq!(tokenize("a<!-- hidden -->b"), vec![text("a"), text("b")]);
        assert_eq!(tokenize("<!DOCTYPE html>x"), vec![text("x")]);
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        assert_eq!(tokenize("1 < 2"), vec![text("1 "), text("< 2")]);
        assert_eq!(tokenize("<div class=\"x"), vec![text("<div class=\"x")]);
    }

    #[test]
    fn test_script_content_is_raw() {
        let tokens = tokenize("<script>if (a < b && c) {}</script>");
        assert_eq!(
            tokens,
            vec![
                open("script", &[]),
                text("if (a < b && c) {}"),
                close("script"),
            ]
        );
    }

    #[test]
    fn test_uppercase_tags_are_lowercased() {
        assert_eq!(
            tokenize("<DIV ID=main></DIV>"),
            vec![open("div", &[("id", "main")]), close("div")]
        );
    }

    #[test]
    fn test_parse_fragment_nesting() {
        let nodes = parse_fragment("<span class=\"a\">x<span class=\"b\">y</span></span>z</i>");
        assert_eq!(
            crate::tree::to_html(&nodes),
            "<span class=\"a\">x<span class=\"b\">y</span></span>z"
        );
        let nodes = parse_fragment("<b>unclosed");
        assert_eq!(crate::tree::to_html(&nodes), "<b>unclosed</b>");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("plain"), "plain");
        assert_eq!(decode_entities("&lt;b&gt; &#65;&#x42;"), "<b> AB");
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }
}
