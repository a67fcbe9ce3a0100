use std::sync::Arc;

use ratatui::text::Text;
use ratatui_mdtree_core::text::CodeHighlighter;
use unicode_width::UnicodeWidthStr;

use crate::ast::MarkdownParser;
use crate::builder::BuildError;
use crate::builder::BuilderOptions;
use crate::builder::MarkdownBuilder;
use crate::html::normalize_html_lists;
use crate::interactive::InteractiveError;
use crate::interactive::InteractiveTableView;
use crate::layout;
use crate::style::StyleSheet;
use crate::table::TablePresentation;
use crate::tree::MarkdownTree;

#[derive(Clone, Debug)]
pub struct MarkdownOptions {
    /// Rewrite raw HTML `<ul>`/`<ol>` lists into text lines before parsing.
    pub normalize_html_lists: bool,
    pub builder: BuilderOptions,
    pub style_sheet: StyleSheet,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            normalize_html_lists: true,
            builder: BuilderOptions::default(),
            style_sheet: StyleSheet::default(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RenderedMarkdown {
    pub text: Text<'static>,
    pub content_width: u16,
    pub content_height: u32,
}

/// A parsed and built Markdown document.
///
/// Parsing and building happen once; [`MarkdownDocument::render`] lays the tree out for a width
/// and can be called every frame.
#[derive(Debug)]
pub struct MarkdownDocument {
    source: String,
    tree: MarkdownTree,
    style_sheet: StyleSheet,
    builder_options: BuilderOptions,
}

impl MarkdownDocument {
    pub fn parse(source: impl Into<String>, options: &MarkdownOptions) -> Result<Self, BuildError> {
        Self::parse_with_highlighter(source, options, None)
    }

    /// Like [`MarkdownDocument::parse`], formatting code blocks with `highlighter`.
    pub fn parse_with_highlighter(
        source: impl Into<String>,
        options: &MarkdownOptions,
        highlighter: Option<Arc<dyn CodeHighlighter + Send + Sync>>,
    ) -> Result<Self, BuildError> {
        let mut builder = MarkdownBuilder::new(options.style_sheet.clone(), options.builder.clone())?;
        builder.set_highlighter(highlighter);
        Ok(Self::parse_with_builder(
            source,
            options.normalize_html_lists,
            &mut builder,
        ))
    }

    /// Builds with a caller-configured builder (custom element, image or bullet builders, link
    /// taps).
    pub fn parse_with_builder(
        source: impl Into<String>,
        normalize_lists: bool,
        builder: &mut MarkdownBuilder,
    ) -> Self {
        let source = source.into();
        let nodes = if normalize_lists {
            MarkdownParser::new().parse(&normalize_html_lists(&source))
        } else {
            MarkdownParser::new().parse(&source)
        };
        let tree = builder.build(&nodes);
        Self {
            source,
            tree,
            style_sheet: builder.style_sheet().clone(),
            builder_options: builder.options().clone(),
        }
    }

    /// Returns the original markdown source (as provided to [`Self::parse`]).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &MarkdownTree {
        &self.tree
    }

    /// Lays the document out for `width` columns.
    ///
    /// Zoomable tables are fitted here: after the first layout each one commits its natural
    /// width, and the document is laid out a second time only when some table's scale changed.
    pub fn render(&mut self, width: u16) -> RenderedMarkdown {
        if width == 0 {
            return RenderedMarkdown::default();
        }
        let mut lines = layout::layout(self.tree.nodes(), width);
        if self.tree.has_zoomable_tables() {
            let mut relayout = false;
            for table in self.tree.tables_mut() {
                let natural = f32::from(layout::table_natural_width(&table.grid));
                if let TablePresentation::Zoomable(zoom) = &mut table.presentation {
                    zoom.request_measure();
                    relayout |= zoom.on_post_frame(natural, f32::from(width));
                }
            }
            if relayout {
                lines = layout::layout(self.tree.nodes(), width);
            }
        }
        let content_width = lines
            .iter()
            .map(|l| {
                l.spans
                    .iter()
                    .map(|s| UnicodeWidthStr::width(s.content.as_ref()))
                    .sum::<usize>()
            })
            .max()
            .unwrap_or(0)
            .min(u16::MAX as usize) as u16;
        let content_height = lines.len() as u32;
        RenderedMarkdown {
            text: Text::from(lines),
            content_width,
            content_height,
        }
    }

    /// Opens the full-screen view for the `index`th table, if it is currently shown shrunk.
    pub fn expand_table(
        &self,
        index: usize,
    ) -> Option<Result<InteractiveTableView, InteractiveError>> {
        let tables = self.tree.tables();
        let zoom = tables.get(index)?.zoomable()?;
        if !zoom.can_expand() {
            return None;
        }
        Some(InteractiveTableView::open(
            zoom.source(),
            &self.style_sheet,
            &self.builder_options,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui_mdtree_core::render::spans_plain;

    const WIDE_TABLE: &str = "| id | a fairly long header | another long header |\n|---|---|---|\n| 1 | some cell text here | more cell text here |\n";

    fn plain(rendered: &RenderedMarkdown) -> Vec<String> {
        rendered
            .text
            .lines
            .iter()
            .map(|l| spans_plain(&l.spans))
            .collect()
    }

    fn interactive() -> MarkdownOptions {
        MarkdownOptions {
            style_sheet: StyleSheet {
                enable_interactive_table: true,
                ..StyleSheet::default()
            },
            ..MarkdownOptions::default()
        }
    }

    #[test]
    fn html_lists_are_normalized_before_parsing() {
        let mut doc =
            MarkdownDocument::parse("<ol><li>First</li><li>Second</li></ol>", &MarkdownOptions::default())
                .expect("default options are valid");
        let lines = plain(&doc.render(40));
        let trimmed: Vec<&str> = lines.iter().map(|l| l.trim_start_matches('\u{a0}')).collect();
        assert_eq!(trimmed, vec!["1. First", "2. Second"]);
    }

    #[test]
    fn normalization_can_be_disabled() {
        let options = MarkdownOptions {
            normalize_html_lists: false,
            ..MarkdownOptions::default()
        };
        let doc = MarkdownDocument::parse("<ul><li>a</li></ul>", &options)
            .expect("default options are valid");
        assert_eq!(doc.source(), "<ul><li>a</li></ul>");
        let mut doc = doc;
        assert!(plain(&doc.render(40)).concat().contains("<ul>"));
    }

    #[test]
    fn zero_width_renders_nothing() {
        let mut doc = MarkdownDocument::parse("hello", &MarkdownOptions::default())
            .expect("default options are valid");
        assert_eq!(doc.render(0).content_height, 0);
        assert_eq!(doc.render(10).content_width, 5);
    }

    #[test]
    fn wide_tables_shrink_to_fit_and_can_expand() {
        let mut doc =
            MarkdownDocument::parse(WIDE_TABLE, &interactive()).expect("default options are valid");
        let rendered = doc.render(40);
        let zoom = doc.tree().tables()[0].zoomable().expect("zoomable table");
        assert!(zoom.scale() < 1.0);
        assert!(zoom.can_expand());
        assert!(rendered.content_width <= 40);
        assert!(plain(&rendered).last().is_some_and(|l| l.starts_with("⤢")));

        let view = doc.expand_table(0).expect("shrunk table").expect("table opens");
        assert_eq!(view.renderer().sticky_rows(), 1);
    }

    #[test]
    fn tables_that_fit_stay_at_natural_size() {
        let mut doc = MarkdownDocument::parse("| a | b |\n|---|---|\n| 1 | 2 |\n", &interactive())
            .expect("default options are valid");
        doc.render(80);
        let zoom = doc.tree().tables()[0].zoomable().expect("zoomable table");
        assert_eq!(zoom.scale(), 1.0);
        assert!(doc.expand_table(0).is_none());
    }

    #[test]
    fn rendering_twice_is_stable() {
        let mut doc =
            MarkdownDocument::parse(WIDE_TABLE, &interactive()).expect("default options are valid");
        let first = plain(&doc.render(40));
        let second = plain(&doc.render(40));
        assert_eq!(first, second);
    }
}
