//! Code block highlighting hook.

use std::sync::LazyLock;

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::error::HighlightError;

/// Prefix for highlight classes, so theme CSS cannot clash with user CSS.
pub const CSS_PREFIX: &str = "hl-";

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(|| SyntaxSet::load_defaults_newlines());

/// Turns code into highlighted HTML.
///
/// `Ok(None)` means the language is not recognized; callers render the
/// code as escaped plain text in that case, and on `Err` too.
pub trait CodeHighlighter {
    fn highlight(&self, code: &str, lang: &str) -> Result<Option<String>, HighlightError>;
}

impl<T: CodeHighlighter + ?Sized> CodeHighlighter for &T {
    fn highlight(&self, code: &str, lang: &str) -> Result<Option<String>, HighlightError> {
        (**self).highlight(code, lang)
    }
}

/// Never highlights.
impl CodeHighlighter for () {
    fn highlight(&self, _code: &str, _lang: &str) -> Result<Option<String>, HighlightError> {
        Ok(None)
    }
}

/// `syntect` highlighter producing classed `<span>`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntectHighlighter;

impl SyntectHighlighter {
    /// Whether `lang` names a known syntax (by token, name or extension).
    pub fn knows(lang: &str) -> bool {
        SYNTAX_SET.find_syntax_by_token(lang).is_some()
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: &str) -> Result<Option<String>, HighlightError> {
        let Some(syntax) = SYNTAX_SET.find_syntax_by_token(lang) else {
            return Ok(None);
        };

        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &SYNTAX_SET,
            ClassStyle::SpacedPrefixed { prefix: CSS_PREFIX },
        );
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|e| HighlightError {
                    lang: lang.to_owned(),
                    message: e.to_string(),
                })?;
        }
        Ok(Some(generator.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_language() {
        assert!(
            SyntectHighlighter
                .highlight("x", "no-such-language")
                .unwrap()
                .is_none()
        );
        assert!(!SyntectHighlighter::knows("no-such-language"));
    }

    #[test]
    fn test_known_language_is_classed() {
        let html = SyntectHighlighter
            .highlight("fn main() {}\n", "rust")
            .unwrap()
            .expect("rust is a default syntax");
        assert!(html.contains("<span class=\"hl-"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_unit_highlighter_never_highlights() {
        assert!(().highlight("fn main() {}", "rust").unwrap().is_none());
    }
}
