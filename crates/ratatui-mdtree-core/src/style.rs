use ratatui::style::Style;

/// An OpenType-style font feature toggle (for example `sups` for superscript glyphs).
///
/// Terminals cannot apply font features themselves; they are carried on spans so hosts that
/// render with a real text shaper can honor them, and so layout can pick substitute glyphs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontFeature {
    tag: String,
    value: u32,
}

impl FontFeature {
    pub const SUPERSCRIPTS: &'static str = "sups";
    pub const SUBSCRIPTS: &'static str = "subs";

    /// Enables the feature identified by `tag`.
    pub fn enable(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: 1,
        }
    }

    pub fn disable(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: 0,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_enabled(&self) -> bool {
        self.value != 0
    }
}

/// A text style: a `ratatui` [`Style`] plus the font features to apply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextStyle {
    pub style: Style,
    pub font_features: Vec<FontFeature>,
}

impl TextStyle {
    pub fn new(style: Style) -> Self {
        Self {
            style,
            font_features: Vec::new(),
        }
    }

    /// Returns `self` overridden by `other`.
    ///
    /// Attributes set on `other` win; attributes it leaves unset are inherited from `self`. Font
    /// features are replaced wholesale when `other` declares any.
    pub fn merge(&self, other: Option<&TextStyle>) -> TextStyle {
        let Some(other) = other else {
            return self.clone();
        };
        TextStyle {
            style: self.style.patch(other.style),
            font_features: if other.font_features.is_empty() {
                self.font_features.clone()
            } else {
                other.font_features.clone()
            },
        }
    }

    pub fn with_font_features(mut self, features: Vec<FontFeature>) -> Self {
        self.font_features = features;
        self
    }

    pub fn has_feature(&self, tag: &str) -> bool {
        self.font_features
            .iter()
            .any(|f| f.tag() == tag && f.is_enabled())
    }
}

impl From<Style> for TextStyle {
    fn from(style: Style) -> Self {
        Self::new(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;
    use ratatui::style::Modifier;

    #[test]
    fn disabled_features_shadow_inherited_ones() {
        let sup = TextStyle::default()
            .with_font_features(vec![FontFeature::enable(FontFeature::SUPERSCRIPTS)]);
        let plain = TextStyle::default()
            .with_font_features(vec![FontFeature::disable(FontFeature::SUPERSCRIPTS)]);
        assert!(sup.has_feature(FontFeature::SUPERSCRIPTS));
        assert!(!sup.merge(Some(&plain)).has_feature(FontFeature::SUPERSCRIPTS));
    }

    #[test]
    fn merge_prefers_the_overriding_style() {
        let parent = TextStyle::new(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
        let child = TextStyle::new(Style::default().fg(Color::Blue));
        let merged = parent.merge(Some(&child));
        assert_eq!(merged.style.fg, Some(Color::Blue));
        assert!(merged.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn merge_keeps_parent_features_unless_overridden() {
        let parent = TextStyle::default().with_font_features(vec![FontFeature::enable("smcp")]);
        assert!(parent.merge(Some(&TextStyle::default())).has_feature("smcp"));

        let child = TextStyle::default().with_font_features(vec![FontFeature::enable("sups")]);
        let merged = parent.merge(Some(&child));
        assert!(merged.has_feature("sups"));
        assert!(!merged.has_feature("smcp"));
    }
}
