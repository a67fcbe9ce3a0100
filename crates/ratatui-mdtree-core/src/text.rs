use ratatui::style::Style;
use ratatui::text::Span;

/// Formats the text of a code block into styled lines.
///
/// The render-tree builder delegates every `pre` text run to the configured highlighter. One
/// output line is expected per input line.
pub trait CodeHighlighter {
    fn highlight_lines(&self, language: Option<&str>, lines: &[&str]) -> Vec<Vec<Span<'static>>>;

    fn highlight_text(&self, language: Option<&str>, text: &str) -> Vec<Vec<Span<'static>>> {
        let text = text.strip_suffix('\n').unwrap_or(text);
        let lines: Vec<&str> = text.split('\n').collect();
        self.highlight_lines(language, &lines)
    }
}

/// A highlighter that applies one base style to every line.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHighlight {
    style: Style,
}

impl NoHighlight {
    pub fn new(style: Style) -> Self {
        Self { style }
    }
}

impl CodeHighlighter for NoHighlight {
    fn highlight_lines(&self, _language: Option<&str>, lines: &[&str]) -> Vec<Vec<Span<'static>>> {
        lines
            .iter()
            .map(|l| vec![Span::styled((*l).to_string(), self.style)])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_text_drops_the_trailing_newline() {
        let style = Style::default().fg(ratatui::style::Color::Cyan);
        let lines = NoHighlight::new(style).highlight_text(None, "a\nb\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1][0].content, "b");
        assert_eq!(lines[1][0].style, style);
    }
}
