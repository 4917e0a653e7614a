//! Automatic style definitions and the per-document style registry
//!
//! Every formatted element of a generated document gets its own automatic
//! style. Styles are never shared between elements, even when their
//! properties coincide: the name of a style is derived from the node that
//! produced it, which keeps output stable across builds of the same input.

use std::collections::HashSet;
use std::fmt;

use crate::error::{OdfError, Result};

/// Style family of an automatic style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleFamily {
    Paragraph,
    Text,
    Table,
    TableColumn,
    TableRow,
    TableCell,
    Graphic,
}

impl StyleFamily {
    /// Value of the `style:family` attribute
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Text => "text",
            Self::Table => "table",
            Self::TableColumn => "table-column",
            Self::TableRow => "table-row",
            Self::TableCell => "table-cell",
            Self::Graphic => "graphic",
        }
    }
}

impl fmt::Display for StyleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Start,
    Center,
    End,
    Justify,
}

impl TextAlign {
    /// Parse a CSS `text-align` value; unknown values fall back to start
    pub fn from_css(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "center" => Self::Center,
            "right" | "end" => Self::End,
            "justify" => Self::Justify,
            _ => Self::Start,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Center => "center",
            Self::End => "end",
            Self::Justify => "justify",
        }
    }
}

/// Font weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Bold => "bold",
        }
    }
}

/// Font posture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

impl FontStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Italic => "italic",
        }
    }
}

/// Character formatting
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextProperties {
    /// Font size in points
    pub font_size_pt: Option<f64>,
    /// Color as given by the editor (e.g. `#1a202c`)
    pub color: Option<String>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    /// Single font family name, unquoted
    pub font_family: Option<String>,
}

/// Paragraph formatting
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParagraphProperties {
    pub align: Option<TextAlign>,
    /// Line height as a percentage of the font size
    pub line_height_pct: Option<f64>,
    pub margin_top_cm: Option<f64>,
    pub margin_bottom_cm: Option<f64>,
    /// Start this paragraph on a new page
    pub break_before_page: bool,
}

/// Table formatting
#[derive(Debug, Clone, PartialEq)]
pub struct TableProperties {
    pub width_cm: f64,
    pub margin_top_cm: f64,
    pub margin_bottom_cm: f64,
}

/// Width of a table column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    /// Absolute width in centimetres
    Absolute(f64),
    /// Relative weight, shared with the other relative columns
    Relative(u32),
}

/// Table column formatting
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProperties {
    pub width: ColumnWidth,
}

/// Table row formatting
#[derive(Debug, Clone, PartialEq)]
pub struct RowProperties {
    pub min_height_cm: f64,
}

/// Table cell formatting
#[derive(Debug, Clone, PartialEq)]
pub struct CellProperties {
    pub padding_vertical_cm: f64,
    pub padding_horizontal_cm: f64,
    /// Draw cell borders
    pub border: bool,
}

/// Frame formatting for embedded graphics
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicProperties {
    /// Width relative to the paragraph area, in percent
    pub rel_width_pct: f64,
    /// Center the frame horizontally
    pub centered: bool,
}

/// Properties of a style, one variant per family
#[derive(Debug, Clone, PartialEq)]
pub enum StyleProperties {
    Paragraph {
        paragraph: ParagraphProperties,
        text: TextProperties,
    },
    Text(TextProperties),
    Table(TableProperties),
    TableColumn(ColumnProperties),
    TableRow(RowProperties),
    TableCell(CellProperties),
    Graphic(GraphicProperties),
}

impl StyleProperties {
    pub fn family(&self) -> StyleFamily {
        match self {
            Self::Paragraph { .. } => StyleFamily::Paragraph,
            Self::Text(_) => StyleFamily::Text,
            Self::Table(_) => StyleFamily::Table,
            Self::TableColumn(_) => StyleFamily::TableColumn,
            Self::TableRow(_) => StyleFamily::TableRow,
            Self::TableCell(_) => StyleFamily::TableCell,
            Self::Graphic(_) => StyleFamily::Graphic,
        }
    }
}

/// A named automatic style
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub name: String,
    /// Common style this one inherits from
    pub parent: Option<String>,
    pub properties: StyleProperties,
}

impl Style {
    pub fn new(name: impl Into<String>, properties: StyleProperties) -> Self {
        Self {
            name: name.into(),
            parent: None,
            properties,
        }
    }

    /// Set the parent common style
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn family(&self) -> StyleFamily {
        self.properties.family()
    }

    /// Text properties carried by this style, if its family has any
    pub fn text_properties(&self) -> Option<&TextProperties> {
        match &self.properties {
            StyleProperties::Paragraph { text, .. } | StyleProperties::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Position in a registry, used to undo registrations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryMark(usize);

/// Registry of the automatic styles of one document
///
/// Keeps registration order, which is also serialization order, and
/// rejects a second style with an already used name.
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    styles: Vec<Style>,
    names: HashSet<String>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a style, returning its name
    pub fn register(&mut self, style: Style) -> Result<String> {
        if !self.names.insert(style.name.clone()) {
            return Err(OdfError::DuplicateStyle(style.name));
        }
        let name = style.name.clone();
        self.styles.push(style);
        Ok(name)
    }

    pub fn get(&self, name: &str) -> Option<&Style> {
        if !self.names.contains(name) {
            return None;
        }
        self.styles.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Styles in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Style> {
        self.styles.iter()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Remember the current state
    pub fn mark(&self) -> RegistryMark {
        RegistryMark(self.styles.len())
    }

    /// Drop every style registered after `mark`
    pub fn rollback(&mut self, mark: RegistryMark) {
        if mark.0 >= self.styles.len() {
            return;
        }
        for style in self.styles.drain(mark.0..) {
            self.names.remove(&style.name);
        }
    }
}

/// Derive a style name from a prefix, a node id and an optional role
///
/// Style names must be XML NCNames. ASCII letters, digits, `-` and `_` are
/// kept; every other character is written as `.<hex>.`, so distinct ids
/// never map to the same name. The role is appended after a `.`.
pub fn style_name(prefix: &str, node_id: &str, role: Option<&str>) -> String {
    let mut name = String::with_capacity(prefix.len() + node_id.len() + 8);
    name.push_str(prefix);
    name.push('_');
    for c in node_id.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            name.push(c);
        } else {
            name.push_str(&format!(".{:x}.", c as u32));
        }
    }
    if let Some(role) = role {
        name.push('.');
        name.push_str(role);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_style(name: &str) -> Style {
        Style::new(name, StyleProperties::Text(TextProperties::default()))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = StyleRegistry::new();
        let name = registry.register(text_style("T_a")).unwrap();
        assert_eq!(name, "T_a");
        assert!(registry.contains("T_a"));
        assert_eq!(registry.get("T_a").unwrap().family(), StyleFamily::Text);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut registry = StyleRegistry::new();
        registry.register(text_style("T_a")).unwrap();
        let err = registry.register(text_style("T_a")).unwrap_err();
        assert!(matches!(err, OdfError::DuplicateStyle(ref n) if n == "T_a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rollback_releases_names() {
        let mut registry = StyleRegistry::new();
        registry.register(text_style("keep")).unwrap();
        let mark = registry.mark();
        registry.register(text_style("drop1")).unwrap();
        registry.register(text_style("drop2")).unwrap();

        registry.rollback(mark);

        assert_eq!(registry.len(), 1);
        assert!(!registry.contains("drop1"));
        registry.register(text_style("drop1")).unwrap();
    }

    #[test]
    fn test_style_name_plain_id() {
        assert_eq!(style_name("P", "abc-12_X", None), "P_abc-12_X");
        assert_eq!(style_name("Tbl", "row1", Some("C2")), "Tbl_row1.C2");
    }

    #[test]
    fn test_style_name_escapes_odd_characters() {
        assert_eq!(style_name("P", "a b", None), "P_a.20.b");
        assert_ne!(style_name("P", "a b", None), style_name("P", "a_b", None));
        assert_eq!(style_name("P", "a.b", None), "P_a.2e.b");
    }

    #[test]
    fn test_text_align_from_css() {
        assert_eq!(TextAlign::from_css("center"), TextAlign::Center);
        assert_eq!(TextAlign::from_css("RIGHT"), TextAlign::End);
        assert_eq!(TextAlign::from_css("justify"), TextAlign::Justify);
        assert_eq!(TextAlign::from_css("left"), TextAlign::Start);
        assert_eq!(TextAlign::from_css("sideways"), TextAlign::Start);
    }
}
