//! Inline syntaxes that turn a handful of raw HTML tags into AST elements.
//!
//! Markdown passes inline HTML through untouched. These syntaxes recognize the few tags the
//! builder knows how to render (`<br>`, `<sub>`, `<sup>`, `<u>`) and replace them with elements.
//! Anything they do not match stays literal text.
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::ast::Element;
use crate::ast::Node;

/// A match produced by an [`InlineSyntax`]: the byte range it consumed and its replacement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineMatch {
    pub range: Range<usize>,
    pub node: Node,
}

pub trait InlineSyntax {
    /// Finds the first match in `text` that starts at or after byte offset `from`.
    fn find(&self, text: &str, from: usize) -> Option<InlineMatch>;
}

static BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>").expect("hardcoded <br> regex is valid")
});

/// `<br>`, `<br/>` and `<br />`, in any letter case.
#[derive(Clone, Copy, Debug, Default)]
pub struct BreakSyntax;

impl InlineSyntax for BreakSyntax {
    fn find(&self, text: &str, from: usize) -> Option<InlineMatch> {
        let m = BREAK_RE.find_at(text, from)?;
        Some(InlineMatch {
            range: m.range(),
            node: Node::Element(Element::new("br")),
        })
    }
}

static FORMAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<sub>(?P<sub>.*?)</sub>|<sup>(?P<sup>.*?)</sup>|<u>(?P<u>.*?)</u>")
        .expect("hardcoded format regex is valid")
});

/// `<sub>…</sub>`, `<sup>…</sup>` and `<u>…</u>` wrapping plain text.
///
/// The inner text becomes the element's only child; markup inside it is not interpreted.
#[derive(Clone, Copy, Debug, Default)]
pub struct FormatSyntax;

impl InlineSyntax for FormatSyntax {
    fn find(&self, text: &str, from: usize) -> Option<InlineMatch> {
        let caps = FORMAT_RE.captures_at(text, from)?;
        let whole = caps.get(0)?;
        let (tag, inner) = ["sub", "sup", "u"]
            .into_iter()
            .find_map(|tag| caps.name(tag).map(|m| (tag, m.as_str())))?;
        Some(InlineMatch {
            range: whole.range(),
            node: Node::Element(Element::new(tag).with_child(Node::Text(inner.to_string()))),
        })
    }
}

/// The syntaxes a default [`crate::ast::MarkdownParser`] runs, in priority order.
pub fn default_inline_syntaxes() -> Vec<Box<dyn InlineSyntax>> {
    vec![Box::new(BreakSyntax), Box::new(FormatSyntax)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_syntax_accepts_common_spellings() {
        for src in ["<br>", "<BR/>", "<br />"] {
            let m = BreakSyntax.find(src, 0).expect("match");
            assert_eq!(m.range, 0..src.len());
            assert_eq!(m.node, Node::Element(Element::new("br")));
        }
        assert!(BreakSyntax.find("<b>", 0).is_none());
    }

    #[test]
    fn format_syntax_captures_inner_text() {
        let m = FormatSyntax.find("H<sub>2</sub>O", 0).expect("match");
        assert_eq!(m.range, 1..13);
        assert_eq!(
            m.node,
            Node::Element(Element::new("sub").with_child(Node::Text("2".into())))
        );

        let m = FormatSyntax.find("x<SUP>n</SUP>", 0).expect("match");
        assert_eq!(m.node.text_content(), "n");
        assert!(matches!(&m.node, Node::Element(e) if e.tag == "sup"));
    }

    #[test]
    fn format_syntax_ignores_mismatched_tags() {
        assert!(FormatSyntax.find("<sub>2</sup>", 0).is_none());
        assert!(FormatSyntax.find("<u>open", 0).is_none());
    }

    #[test]
    fn find_respects_the_start_offset() {
        let src = "<u>a</u> and <u>b</u>";
        let m = FormatSyntax.find(src, 1).expect("second match");
        assert_eq!(m.node.text_content(), "b");
    }
}
