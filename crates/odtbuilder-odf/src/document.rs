//! In-memory model of an OpenDocument Text document
//!
//! A [`Document`] is created empty, filled during one conversion pass and
//! then handed to the writer. It exclusively owns its styles and embedded
//! resources for the duration of that build.

use crate::error::{OdfError, Result};
use crate::page::PageLayout;
use crate::resources::Resources;
use crate::styles::StyleRegistry;

/// A complete document
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// The single page master; `None` until initialized
    pub page_layout: Option<PageLayout>,
    /// Automatic styles, in registration order
    pub styles: StyleRegistry,
    /// Embedded pictures
    pub resources: Resources,
    /// Top-level block elements of the body
    pub body: Vec<Element>,
    /// Document title recorded in meta.xml
    pub title: Option<String>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the page master
    ///
    /// Only the first call has an effect; returns whether it did.
    pub fn init_page_layout(&mut self, layout: PageLayout) -> bool {
        if self.page_layout.is_some() {
            return false;
        }
        self.page_layout = Some(layout);
        true
    }

    /// Page layout in effect (A4 when none was registered)
    pub fn layout(&self) -> PageLayout {
        self.page_layout.unwrap_or_default()
    }

    /// Append a block to the body
    pub fn push(&mut self, element: Element) {
        self.body.push(element);
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }
}

/// Block-level element
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Heading(Heading),
    Paragraph(Paragraph),
    Table(Table),
}

impl Element {
    /// Plain text of the element, line breaks as `\n`
    pub fn plain_text(&self) -> String {
        match self {
            Element::Heading(h) => inline_text(&h.content),
            Element::Paragraph(p) => inline_text(&p.content),
            Element::Table(t) => t
                .row
                .cells
                .iter()
                .flat_map(|c| c.content.iter().map(Element::plain_text))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

fn inline_text(content: &[Inline]) -> String {
    let mut text = String::new();
    for inline in content {
        match inline {
            Inline::Text(t) => text.push_str(t),
            Inline::Span { text: t, .. } => text.push_str(t),
            Inline::LineBreak => text.push('\n'),
            Inline::Frame(_) => {}
        }
    }
    text
}

/// A heading
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    /// Outline level (1 is the highest)
    pub level: u8,
    pub style: Option<String>,
    pub content: Vec<Inline>,
}

/// A paragraph
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub style: Option<String>,
    pub content: Vec<Inline>,
}

impl Paragraph {
    /// An empty, unstyled paragraph
    pub fn empty() -> Self {
        Self::default()
    }

    /// An unstyled paragraph with plain text
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            style: None,
            content: vec![Inline::Text(text.into())],
        }
    }

    /// Set the paragraph style
    pub fn styled(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// Inline content of headings and paragraphs
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Plain text run
    Text(String),
    /// Text run with its own text style
    Span { style: String, text: String },
    /// Hard line break within the same paragraph
    LineBreak,
    /// Embedded picture
    Frame(Frame),
}

/// A frame holding an embedded picture
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Frame name, unique within the document
    pub name: String,
    /// Graphic style
    pub style: String,
    /// Path of the picture inside the package
    pub href: String,
    pub width_cm: f64,
    pub height_cm: f64,
    /// Width relative to the paragraph area, in percent
    pub rel_width_pct: f64,
}

/// A one-row table
///
/// Construction enforces at least one column and exactly one cell per
/// column, so a degenerate table cannot reach the body.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    style: String,
    columns: Vec<TableColumn>,
    row: TableRow,
}

impl Table {
    pub fn new(
        name: impl Into<String>,
        style: impl Into<String>,
        columns: Vec<TableColumn>,
        row: TableRow,
    ) -> Result<Self> {
        let name = name.into();
        if columns.is_empty() {
            return Err(OdfError::InvalidStructure(format!(
                "table {} has no columns",
                name
            )));
        }
        if row.cells.len() != columns.len() {
            return Err(OdfError::InvalidStructure(format!(
                "table {} has {} columns but {} cells",
                name,
                columns.len(),
                row.cells.len()
            )));
        }
        Ok(Self {
            name,
            style: style.into(),
            columns,
            row,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn row(&self) -> &TableRow {
        &self.row
    }
}

/// A table column declaration
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub style: String,
}

/// A table row
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub style: String,
    pub cells: Vec<TableCell>,
}

/// A table cell containing block elements
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub style: String,
    pub content: Vec<Element>,
}

impl TableCell {
    pub fn new(style: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            content: Vec::new(),
        }
    }

    /// Insert an empty paragraph if the cell has no content
    ///
    /// Table cells must contain at least one block.
    pub fn ensure_content(&mut self) {
        if self.content.is_empty() {
            self.content.push(Element::Paragraph(Paragraph::empty()));
        }
    }
}
