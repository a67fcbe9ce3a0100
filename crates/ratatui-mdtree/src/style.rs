//! The style sheet consumed by the render-tree builder.
//!
//! Everything here is configuration: the builder reads it, never writes it. Text styles are keyed
//! by tag name (`p`, `h1`, `em`, `a`, ...) plus a few pseudo-tags for decorations that have no tag
//! of their own (`blockquote`, `list_bullet`, `table_head`, `table_body`, `checkbox`).
use std::collections::HashMap;

use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui_mdtree_core::style::FontFeature;
use ratatui_mdtree_core::style::TextStyle;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Parses an HTML `align` attribute value.
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Padding {
    pub left: u16,
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
}

impl Padding {
    pub const ZERO: Padding = Padding {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub const fn new(left: u16, top: u16, right: u16, bottom: u16) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn horizontal(value: u16) -> Self {
        Self::new(value, 0, value, 0)
    }

    pub const fn left(value: u16) -> Self {
        Self::new(value, 0, 0, 0)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn width(&self) -> u16 {
        self.left.saturating_add(self.right)
    }
}

/// How table columns are sized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TableColumnWidth {
    /// Columns share the available width.
    Flex,
    /// Columns take the width of their widest cell.
    #[default]
    Intrinsic,
    /// Every column has the same fixed width.
    Fixed(u16),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TableVerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
    /// Align cells on a shared text baseline. Requires [`StyleSheet::table_text_baseline`].
    Baseline,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextBaseline {
    Alphabetic,
    Ideographic,
}

#[derive(Clone, Debug)]
pub struct StyleSheet {
    pub styles: HashMap<String, TextStyle>,
    pub block_align: HashMap<String, TextAlign>,
    pub block_padding: HashMap<String, Padding>,
    pub block_spacing: u16,
    pub list_indent: u16,
    pub list_bullet_padding: Padding,
    pub blockquote_bar: String,
    pub code_block_padding: Padding,
    pub table_border: Option<Style>,
    pub table_cell_padding: Padding,
    pub table_cells_background: Option<Color>,
    pub table_column_width: TableColumnWidth,
    pub table_vertical_alignment: TableVerticalAlign,
    pub table_text_baseline: Option<TextBaseline>,
    pub table_head_align: TextAlign,
    pub enable_interactive_table: bool,
    pub enable_sticky_header: bool,
    pub enable_sticky_column: bool,
    pub sticky_column_max_viewport_fraction: f32,
    pub sticky_background: Option<Color>,
    pub inline_table_min_column_width: u16,
    pub inline_table_min_viewport_fraction: f32,
    pub superscript_font_feature_tag: Option<String>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        use ratatui::style::Stylize;

        let bold = Style::default().add_modifier(Modifier::BOLD);
        let muted = Style::default().dark_gray();
        let mut styles: HashMap<String, TextStyle> = HashMap::new();
        styles.insert(
            "h1".into(),
            bold.add_modifier(Modifier::UNDERLINED).into(),
        );
        for tag in ["h2", "h3", "h4", "h5", "h6", "strong", "table_head"] {
            styles.insert(tag.into(), bold.into());
        }
        styles.insert("em".into(), Style::default().italic().into());
        styles.insert("del".into(), Style::default().crossed_out().into());
        styles.insert("u".into(), Style::default().underlined().into());
        let subscript = FontFeature::enable(FontFeature::SUBSCRIPTS);
        styles.insert(
            "sub".into(),
            TextStyle::default().with_font_features(vec![subscript]),
        );
        styles.insert("code".into(), Style::default().cyan().into());
        styles.insert("a".into(), Style::default().cyan().underlined().into());
        styles.insert("blockquote".into(), muted.into());
        styles.insert("list_bullet".into(), muted.into());
        styles.insert("hr".into(), muted.into());
        styles.insert("checkbox".into(), Style::default().cyan().into());

        Self {
            styles,
            block_align: HashMap::new(),
            block_padding: HashMap::new(),
            block_spacing: 1,
            list_indent: 3,
            list_bullet_padding: Padding::new(0, 0, 1, 0),
            blockquote_bar: "│ ".to_string(),
            code_block_padding: Padding::left(4),
            table_border: Some(muted),
            table_cell_padding: Padding::horizontal(1),
            table_cells_background: None,
            table_column_width: TableColumnWidth::Intrinsic,
            table_vertical_alignment: TableVerticalAlign::Top,
            table_text_baseline: None,
            table_head_align: TextAlign::Center,
            enable_interactive_table: false,
            enable_sticky_header: true,
            enable_sticky_column: false,
            sticky_column_max_viewport_fraction: 0.5,
            sticky_background: None,
            inline_table_min_column_width: 4,
            inline_table_min_viewport_fraction: 0.5,
            superscript_font_feature_tag: None,
        }
    }
}

impl StyleSheet {
    pub fn style(&self, tag: &str) -> Option<&TextStyle> {
        self.styles.get(tag)
    }

    pub fn with_style(mut self, tag: impl Into<String>, style: impl Into<TextStyle>) -> Self {
        self.styles.insert(tag.into(), style.into());
        self
    }

    pub fn with_block_align(mut self, tag: impl Into<String>, align: TextAlign) -> Self {
        self.block_align.insert(tag.into(), align);
        self
    }

    pub fn with_block_padding(mut self, tag: impl Into<String>, padding: Padding) -> Self {
        self.block_padding.insert(tag.into(), padding);
        self
    }

    /// Alignment of inline content directly inside the block `tag` (root content is left-aligned).
    pub fn align_for(&self, tag: Option<&str>) -> TextAlign {
        tag.and_then(|t| self.block_align.get(t))
            .copied()
            .unwrap_or_default()
    }

    pub fn padding_for(&self, tag: Option<&str>) -> Padding {
        tag.and_then(|t| self.block_padding.get(t))
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_align_attributes_case_insensitively() {
        assert_eq!(TextAlign::from_attribute("Center"), Some(TextAlign::Center));
        assert_eq!(TextAlign::from_attribute(" right "), Some(TextAlign::Right));
        assert_eq!(TextAlign::from_attribute("justify"), None);
    }

    #[test]
    fn unknown_block_tags_fall_back_to_defaults() {
        let sheet = StyleSheet::default()
            .with_block_align("h1", TextAlign::Center)
            .with_block_padding("p", Padding::left(2));
        assert_eq!(sheet.align_for(Some("h1")), TextAlign::Center);
        assert_eq!(sheet.align_for(Some("p")), TextAlign::Left);
        assert_eq!(sheet.align_for(None), TextAlign::Left);
        assert_eq!(sheet.padding_for(Some("p")), Padding::left(2));
        assert!(sheet.padding_for(Some("h2")).is_zero());
    }
}
