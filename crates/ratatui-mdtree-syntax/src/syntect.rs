use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui_mdtree_core::text::CodeHighlighter;
use syntect::easy::HighlightLines;
use syntect::highlighting::FontStyle;
use syntect::highlighting::Style as SynStyle;
use syntect::highlighting::Theme;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;

/// Highlights code blocks with syntect's bundled syntaxes and themes.
pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self::with_theme("base16-ocean.dark")
    }

    /// Uses the bundled theme named `theme_name`, falling back to any bundled theme.
    pub fn with_theme(theme_name: &str) -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .get(theme_name)
            .cloned()
            .or_else(|| theme_set.themes.values().next().cloned())
            .unwrap_or_default();
        Self { syntax_set, theme }
    }

    fn syntax_for(&self, language: Option<&str>) -> &SyntaxReference {
        language
            .and_then(|lang| {
                self.syntax_set
                    .find_syntax_by_extension(lang)
                    .or_else(|| self.syntax_set.find_syntax_by_token(lang))
            })
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight_lines(&self, language: Option<&str>, lines: &[&str]) -> Vec<Vec<Span<'static>>> {
        let syntax = self.syntax_for(language);
        let mut highlighter = HighlightLines::new(syntax, &self.theme);

        let mut out: Vec<Vec<Span<'static>>> = Vec::with_capacity(lines.len());
        for line in lines {
            // Syntaxes are loaded in newline mode, so feed each line with its terminator.
            let with_newline = format!("{line}\n");
            let regions = highlighter
                .highlight_line(&with_newline, &self.syntax_set)
                .unwrap_or_default();
            let mut spans: Vec<Span<'static>> = Vec::new();
            for (style, s) in regions {
                let s = s.trim_end_matches('\n');
                if s.is_empty() {
                    continue;
                }
                spans.push(Span::styled(s.to_string(), syn_style_to_ratatui(style)));
            }
            if spans.is_empty() {
                spans.push(Span::raw((*line).to_string()));
            }
            out.push(spans);
        }
        out
    }
}

fn syn_style_to_ratatui(s: SynStyle) -> Style {
    let mut out = Style::default().fg(Color::Rgb(s.foreground.r, s.foreground.g, s.foreground.b));

    if s.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if s.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if s.font_style.contains(FontStyle::UNDERLINE) {
        out = out.add_modifier(Modifier::UNDERLINED);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_one_line_per_input_line() {
        let h = SyntectHighlighter::new();
        let many = h.highlight_lines(Some("rs"), &["fn main() {", "}", ""]);
        assert_eq!(many.len(), 3);
        let first: String = many[0].iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first, "fn main() {");
    }

    #[test]
    fn unknown_language_falls_back_to_plain_text() {
        let h = SyntectHighlighter::new();
        let lines = h.highlight_text(Some("no-such-language"), "a\nb\n");
        assert_eq!(lines.len(), 2);
    }
}
