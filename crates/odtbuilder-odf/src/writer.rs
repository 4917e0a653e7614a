//! ODT Writer
//!
//! This module serializes a [`Document`] into an OpenDocument Text package:
//!
//! ```text
//! mimetype                 stored, first entry
//! content.xml              automatic styles + body
//! styles.xml               common styles, page layout, master page
//! meta.xml                 generator and title
//! META-INF/manifest.xml    every part with its media type
//! Pictures/*               embedded images
//! ```
//!
//! # Example
//!
//! ```
//! use odtbuilder_odf::{Document, Element, OdtWriter, PageLayout, Paragraph};
//!
//! let mut doc = Document::new();
//! doc.init_page_layout(PageLayout::A4);
//! doc.push(Element::Paragraph(Paragraph::with_text("Hallo")));
//!
//! let bytes = OdtWriter::generate(&doc)?;
//! assert!(bytes.starts_with(b"PK"));
//! # Ok::<(), odtbuilder_odf::OdfError>(())
//! ```

use std::collections::BTreeSet;
use std::io::Cursor;

use crate::archive::{OdfArchive, MIMETYPE_PATH};
use crate::document::{Document, Element, Frame, Inline, Table};
use crate::error::{OdfError, Result};
use crate::manifest::{Manifest, MANIFEST_PATH};
use crate::page::{PageLayout, MASTER_PAGE_NAME, PAGE_LAYOUT_NAME};
use crate::styles::{ColumnWidth, Style, StyleProperties, TextProperties};
use crate::xml::{escape_attr, escape_text, fmt_num};

/// Media type of an OpenDocument Text file
pub const ODT_MIMETYPE: &str = "application/vnd.oasis.opendocument.text";

/// ODF version written to every part
pub const ODF_VERSION: &str = "1.3";

/// Font used when a style names none
pub const DEFAULT_FONT: &str = "Arial";

/// Common paragraph style every automatic paragraph style derives from
pub const STANDARD_STYLE: &str = "Standard";

/// Common paragraph style for headings
pub const HEADING_STYLE: &str = "Heading";

const NAMESPACES: &str = concat!(
    "xmlns:office=\"urn:oasis:names:tc:opendocument:xmlns:office:1.0\" ",
    "xmlns:style=\"urn:oasis:names:tc:opendocument:xmlns:style:1.0\" ",
    "xmlns:text=\"urn:oasis:names:tc:opendocument:xmlns:text:1.0\" ",
    "xmlns:table=\"urn:oasis:names:tc:opendocument:xmlns:table:1.0\" ",
    "xmlns:draw=\"urn:oasis:names:tc:opendocument:xmlns:drawing:1.0\" ",
    "xmlns:fo=\"urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0\" ",
    "xmlns:xlink=\"http://www.w3.org/1999/xlink\" ",
    "xmlns:svg=\"urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0\""
);

const META_NAMESPACES: &str = concat!(
    "xmlns:office=\"urn:oasis:names:tc:opendocument:xmlns:office:1.0\" ",
    "xmlns:meta=\"urn:oasis:names:tc:opendocument:xmlns:meta:1.0\" ",
    "xmlns:dc=\"http://purl.org/dc/elements/1.1/\""
);

/// ODT Writer for packaging an in-memory document
pub struct OdtWriter {
    /// XML output buffer
    output: String,
    /// Value of `meta:generator`
    generator: String,
}

impl Default for OdtWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl OdtWriter {
    /// Create a new OdtWriter
    pub fn new() -> Self {
        Self {
            output: String::new(),
            generator: format!("odtbuilder/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Override the generator recorded in meta.xml
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    /// Serialize a document to ODT bytes
    pub fn generate(doc: &Document) -> Result<Vec<u8>> {
        Self::new().write(doc)
    }

    /// Serialize a document to ODT bytes using this writer's settings
    pub fn write(mut self, doc: &Document) -> Result<Vec<u8>> {
        let archive = self.package(doc)?;
        let mut output = Cursor::new(Vec::new());
        archive.write_to(&mut output)?;
        Ok(output.into_inner())
    }

    /// Build the package parts without zipping them
    pub fn package(&mut self, doc: &Document) -> Result<OdfArchive> {
        check_references(doc)?;

        let mut archive = OdfArchive::new();
        let mut manifest = Manifest::new(ODF_VERSION, ODT_MIMETYPE);

        archive.set_string(MIMETYPE_PATH, ODT_MIMETYPE);

        let content = self.generate_content_xml(doc);
        archive.set_string("content.xml", content);
        manifest.add("content.xml", "text/xml");

        let styles = self.generate_styles_xml(doc);
        archive.set_string("styles.xml", styles);
        manifest.add("styles.xml", "text/xml");

        let meta = self.generate_meta_xml(doc);
        archive.set_string("meta.xml", meta);
        manifest.add("meta.xml", "text/xml");

        for resource in doc.resources.iter() {
            archive.set(resource.path.clone(), resource.data.clone());
            manifest.add(resource.path.clone(), resource.media_type);
        }

        archive.set_string(MANIFEST_PATH, manifest.to_xml());

        log::debug!(
            "Packaged document: {} blocks, {} styles, {} resources",
            doc.body.len(),
            doc.styles.len(),
            doc.resources.len()
        );
        Ok(archive)
    }

    /// Generate content.xml
    fn generate_content_xml(&mut self, doc: &Document) -> String {
        self.output.clear();
        self.output
            .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.output.push_str(&format!(
            "<office:document-content {} office:version=\"{}\">\n",
            NAMESPACES, ODF_VERSION
        ));

        self.generate_font_faces(doc);

        self.output.push_str("<office:automatic-styles>\n");
        for style in doc.styles.iter() {
            self.generate_style(style);
        }
        self.output.push_str("</office:automatic-styles>\n");

        self.output.push_str("<office:body>\n<office:text>\n");
        for element in &doc.body {
            self.generate_element(element);
        }
        self.output.push_str("</office:text>\n</office:body>\n");
        self.output.push_str("</office:document-content>\n");

        std::mem::take(&mut self.output)
    }

    /// Generate styles.xml
    fn generate_styles_xml(&mut self, doc: &Document) -> String {
        self.output.clear();
        self.output
            .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.output.push_str(&format!(
            "<office:document-styles {} office:version=\"{}\">\n",
            NAMESPACES, ODF_VERSION
        ));

        self.generate_font_faces(doc);

        self.output.push_str("<office:styles>\n");
        self.output.push_str("<style:default-style style:family=\"paragraph\">\n");
        self.output.push_str(&format!(
            "<style:text-properties style:font-name=\"{}\" fo:font-size=\"12pt\" fo:language=\"nl\" fo:country=\"NL\"/>\n",
            DEFAULT_FONT
        ));
        self.output.push_str("</style:default-style>\n");
        self.output.push_str(&format!(
            "<style:style style:name=\"{}\" style:family=\"paragraph\" style:class=\"text\"/>\n",
            STANDARD_STYLE
        ));
        self.output.push_str(&format!(
            "<style:style style:name=\"{}\" style:family=\"paragraph\" style:parent-style-name=\"{}\" style:class=\"text\">\n",
            HEADING_STYLE, STANDARD_STYLE
        ));
        self.output.push_str(
            "<style:paragraph-properties fo:margin-top=\"0.423cm\" fo:margin-bottom=\"0.212cm\" fo:keep-with-next=\"always\"/>\n",
        );
        self.output.push_str("</style:style>\n");
        self.output.push_str("</office:styles>\n");

        let layout = doc.layout();
        self.output.push_str("<office:automatic-styles>\n");
        self.generate_page_layout(&layout);
        self.output.push_str("</office:automatic-styles>\n");

        self.output.push_str("<office:master-styles>\n");
        self.output.push_str(&format!(
            "<style:master-page style:name=\"{}\" style:page-layout-name=\"{}\"/>\n",
            MASTER_PAGE_NAME, PAGE_LAYOUT_NAME
        ));
        self.output.push_str("</office:master-styles>\n");
        self.output.push_str("</office:document-styles>\n");

        std::mem::take(&mut self.output)
    }

    /// Generate meta.xml
    fn generate_meta_xml(&mut self, doc: &Document) -> String {
        self.output.clear();
        self.output
            .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.output.push_str(&format!(
            "<office:document-meta {} office:version=\"{}\">\n<office:meta>\n",
            META_NAMESPACES, ODF_VERSION
        ));
        self.output.push_str(&format!(
            "<meta:generator>{}</meta:generator>\n",
            escape_text(&self.generator)
        ));
        if let Some(title) = &doc.title {
            self.output
                .push_str(&format!("<dc:title>{}</dc:title>\n", escape_text(title)));
        }
        self.output.push_str("</office:meta>\n</office:document-meta>\n");

        std::mem::take(&mut self.output)
    }

    /// Declare every font family used by the document
    fn generate_font_faces(&mut self, doc: &Document) {
        let mut families = BTreeSet::new();
        families.insert(DEFAULT_FONT.to_string());
        for style in doc.styles.iter() {
            if let Some(family) = style.text_properties().and_then(|t| t.font_family.as_ref()) {
                families.insert(family.clone());
            }
        }

        self.output.push_str("<office:font-face-decls>\n");
        for family in &families {
            let quoted = if family.contains(' ') {
                format!("'{}'", family)
            } else {
                family.clone()
            };
            self.output.push_str(&format!(
                "<style:font-face style:name=\"{}\" svg:font-family=\"{}\"/>\n",
                escape_attr(family),
                escape_attr(&quoted)
            ));
        }
        self.output.push_str("</office:font-face-decls>\n");
    }

    fn generate_page_layout(&mut self, layout: &PageLayout) {
        self.output.push_str(&format!(
            "<style:page-layout style:name=\"{}\">\n",
            PAGE_LAYOUT_NAME
        ));
        let margin = fmt_num(layout.margin_cm);
        self.output.push_str(&format!(
            "<style:page-layout-properties fo:page-width=\"{}cm\" fo:page-height=\"{}cm\" style:print-orientation=\"{}\" fo:margin-top=\"{m}cm\" fo:margin-bottom=\"{m}cm\" fo:margin-left=\"{m}cm\" fo:margin-right=\"{m}cm\"/>\n",
            fmt_num(layout.width_cm),
            fmt_num(layout.height_cm),
            layout.orientation(),
            m = margin
        ));
        self.output.push_str("</style:page-layout>\n");
    }

    /// Generate XML for one automatic style
    fn generate_style(&mut self, style: &Style) {
        self.output.push_str(&format!(
            "<style:style style:name=\"{}\" style:family=\"{}\"",
            escape_attr(&style.name),
            style.family()
        ));
        if let Some(parent) = &style.parent {
            self.output.push_str(&format!(
                " style:parent-style-name=\"{}\"",
                escape_attr(parent)
            ));
        }
        self.output.push_str(">\n");

        match &style.properties {
            StyleProperties::Paragraph { paragraph, text } => {
                let mut attrs = String::new();
                if let Some(align) = paragraph.align {
                    attrs.push_str(&format!(" fo:text-align=\"{}\"", align.as_str()));
                }
                if let Some(pct) = paragraph.line_height_pct {
                    attrs.push_str(&format!(" fo:line-height=\"{}%\"", fmt_num(pct)));
                }
                if let Some(top) = paragraph.margin_top_cm {
                    attrs.push_str(&format!(" fo:margin-top=\"{}cm\"", fmt_num(top)));
                }
                if let Some(bottom) = paragraph.margin_bottom_cm {
                    attrs.push_str(&format!(" fo:margin-bottom=\"{}cm\"", fmt_num(bottom)));
                }
                if paragraph.break_before_page {
                    attrs.push_str(" fo:break-before=\"page\"");
                }
                if !attrs.is_empty() {
                    self.output
                        .push_str(&format!("<style:paragraph-properties{}/>\n", attrs));
                }
                self.generate_text_properties(text);
            }
            StyleProperties::Text(text) => self.generate_text_properties(text),
            StyleProperties::Table(table) => {
                self.output.push_str(&format!(
                    "<style:table-properties style:width=\"{}cm\" table:align=\"margins\" fo:margin-top=\"{}cm\" fo:margin-bottom=\"{}cm\"/>\n",
                    fmt_num(table.width_cm),
                    fmt_num(table.margin_top_cm),
                    fmt_num(table.margin_bottom_cm)
                ));
            }
            StyleProperties::TableColumn(column) => match column.width {
                ColumnWidth::Absolute(cm) => {
                    self.output.push_str(&format!(
                        "<style:table-column-properties style:column-width=\"{}cm\"/>\n",
                        fmt_num(cm)
                    ));
                }
                ColumnWidth::Relative(weight) => {
                    self.output.push_str(&format!(
                        "<style:table-column-properties style:rel-column-width=\"{}*\"/>\n",
                        weight
                    ));
                }
            },
            StyleProperties::TableRow(row) => {
                self.output.push_str(&format!(
                    "<style:table-row-properties style:min-row-height=\"{}cm\"/>\n",
                    fmt_num(row.min_height_cm)
                ));
            }
            StyleProperties::TableCell(cell) => {
                let vertical = fmt_num(cell.padding_vertical_cm);
                let horizontal = fmt_num(cell.padding_horizontal_cm);
                let border = if cell.border {
                    "0.5pt solid #000000"
                } else {
                    "none"
                };
                self.output.push_str(&format!(
                    "<style:table-cell-properties fo:padding-top=\"{v}cm\" fo:padding-bottom=\"{v}cm\" fo:padding-left=\"{h}cm\" fo:padding-right=\"{h}cm\" fo:border=\"{}\" style:vertical-align=\"top\"/>\n",
                    border,
                    v = vertical,
                    h = horizontal
                ));
            }
            StyleProperties::Graphic(graphic) => {
                let horizontal = if graphic.centered { "center" } else { "left" };
                self.output.push_str(&format!(
                    "<style:graphic-properties style:wrap=\"none\" style:vertical-pos=\"top\" style:vertical-rel=\"baseline\" style:horizontal-pos=\"{}\" style:horizontal-rel=\"paragraph\" fo:border=\"none\"/>\n",
                    horizontal
                ));
            }
        }

        self.output.push_str("</style:style>\n");
    }

    fn generate_text_properties(&mut self, text: &TextProperties) {
        let mut attrs = String::new();
        if let Some(size) = text.font_size_pt {
            let size = fmt_num(size);
            attrs.push_str(&format!(
                " fo:font-size=\"{s}pt\" style:font-size-asian=\"{s}pt\" style:font-size-complex=\"{s}pt\"",
                s = size
            ));
        }
        if let Some(color) = &text.color {
            attrs.push_str(&format!(" fo:color=\"{}\"", escape_attr(color)));
        }
        if let Some(weight) = text.font_weight {
            attrs.push_str(&format!(
                " fo:font-weight=\"{w}\" style:font-weight-asian=\"{w}\" style:font-weight-complex=\"{w}\"",
                w = weight.as_str()
            ));
        }
        if let Some(style) = text.font_style {
            attrs.push_str(&format!(" fo:font-style=\"{}\"", style.as_str()));
        }
        if let Some(family) = &text.font_family {
            attrs.push_str(&format!(" style:font-name=\"{}\"", escape_attr(family)));
        }
        if !attrs.is_empty() {
            self.output
                .push_str(&format!("<style:text-properties{}/>\n", attrs));
        }
    }

    /// Generate XML for a single block
    fn generate_element(&mut self, element: &Element) {
        match element {
            Element::Heading(heading) => {
                self.output.push_str("<text:h");
                self.push_style_attr("text:style-name", heading.style.as_deref());
                self.output.push_str(&format!(
                    " text:outline-level=\"{}\">",
                    heading.level.max(1)
                ));
                self.generate_inlines(&heading.content);
                self.output.push_str("</text:h>\n");
            }
            Element::Paragraph(para) => {
                self.output.push_str("<text:p");
                self.push_style_attr("text:style-name", para.style.as_deref());
                if para.content.is_empty() {
                    self.output.push_str("/>\n");
                } else {
                    self.output.push('>');
                    self.generate_inlines(&para.content);
                    self.output.push_str("</text:p>\n");
                }
            }
            Element::Table(table) => self.generate_table(table),
        }
    }

    fn push_style_attr(&mut self, attr: &str, style: Option<&str>) {
        if let Some(style) = style {
            self.output
                .push_str(&format!(" {}=\"{}\"", attr, escape_attr(style)));
        }
    }

    /// Generate XML for a table
    fn generate_table(&mut self, table: &Table) {
        self.output.push_str(&format!(
            "<table:table table:name=\"{}\" table:style-name=\"{}\">\n",
            escape_attr(table.name()),
            escape_attr(table.style())
        ));
        for column in table.columns() {
            self.output.push_str(&format!(
                "<table:table-column table:style-name=\"{}\"/>\n",
                escape_attr(&column.style)
            ));
        }

        let row = table.row();
        self.output.push_str(&format!(
            "<table:table-row table:style-name=\"{}\">\n",
            escape_attr(&row.style)
        ));
        for cell in &row.cells {
            self.output.push_str(&format!(
                "<table:table-cell table:style-name=\"{}\" office:value-type=\"string\">\n",
                escape_attr(&cell.style)
            ));
            for element in &cell.content {
                self.generate_element(element);
            }
            // Ensure at least one paragraph in cell
            if cell.content.is_empty() {
                self.output.push_str("<text:p/>\n");
            }
            self.output.push_str("</table:table-cell>\n");
        }
        self.output.push_str("</table:table-row>\n");
        self.output.push_str("</table:table>\n");
    }

    fn generate_inlines(&mut self, content: &[Inline]) {
        for inline in content {
            match inline {
                Inline::Text(text) => self.push_text(text),
                Inline::Span { style, text } => {
                    self.output.push_str(&format!(
                        "<text:span text:style-name=\"{}\">",
                        escape_attr(style)
                    ));
                    self.push_text(text);
                    self.output.push_str("</text:span>");
                }
                Inline::LineBreak => self.output.push_str("<text:line-break/>"),
                Inline::Frame(frame) => self.generate_frame(frame),
            }
        }
    }

    fn generate_frame(&mut self, frame: &Frame) {
        self.output.push_str(&format!(
            "<draw:frame draw:style-name=\"{}\" draw:name=\"{}\" text:anchor-type=\"as-char\" svg:width=\"{}cm\" svg:height=\"{}cm\" style:rel-width=\"{}%\" style:rel-height=\"scale\" draw:z-index=\"0\">",
            escape_attr(&frame.style),
            escape_attr(&frame.name),
            fmt_num(frame.width_cm),
            fmt_num(frame.height_cm),
            fmt_num(frame.rel_width_pct)
        ));
        self.output.push_str(&format!(
            "<draw:image xlink:href=\"{}\" xlink:type=\"simple\" xlink:show=\"embed\" xlink:actuate=\"onLoad\"/>",
            escape_attr(&frame.href)
        ));
        self.output.push_str("</draw:frame>");
    }

    /// Write character data, preserving runs of spaces and tabs
    ///
    /// ODF collapses white space in text content, so every space after the
    /// first of a run (and a leading space) becomes `<text:s/>`.
    fn push_text(&mut self, text: &str) {
        let mut plain = String::new();
        let mut spaces = 0usize;
        let mut at_start = true;

        for c in text.chars() {
            if c == ' ' {
                spaces += 1;
                continue;
            }
            if spaces > 0 {
                self.push_space_run(&mut plain, spaces, at_start);
                spaces = 0;
            }
            at_start = false;

            match c {
                '\t' => {
                    self.flush_plain(&mut plain);
                    self.output.push_str("<text:tab/>");
                }
                '\n' => {
                    self.flush_plain(&mut plain);
                    self.output.push_str("<text:line-break/>");
                }
                _ => plain.push(c),
            }
        }

        if spaces > 0 {
            self.push_space_run(&mut plain, spaces, at_start);
        }
        self.flush_plain(&mut plain);
    }

    fn push_space_run(&mut self, plain: &mut String, count: usize, at_start: bool) {
        let mut rest = count;
        if !at_start {
            plain.push(' ');
            rest -= 1;
        }
        self.flush_plain(plain);
        self.push_spaces(rest);
    }

    fn flush_plain(&mut self, plain: &mut String) {
        if !plain.is_empty() {
            self.output.push_str(&escape_text(plain));
            plain.clear();
        }
    }

    fn push_spaces(&mut self, count: usize) {
        match count {
            0 => {}
            1 => self.output.push_str("<text:s/>"),
            n => self.output.push_str(&format!("<text:s text:c=\"{}\"/>", n)),
        }
    }
}

/// Verify that every style and picture the body refers to exists
fn check_references(doc: &Document) -> Result<()> {
    fn check_style(doc: &Document, style: Option<&str>) -> Result<()> {
        match style {
            Some(name) if !doc.styles.contains(name) => {
                Err(OdfError::StyleNotFound(name.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn check_inlines(doc: &Document, content: &[Inline]) -> Result<()> {
        for inline in content {
            match inline {
                Inline::Span { style, .. } => check_style(doc, Some(style))?,
                Inline::Frame(frame) => {
                    check_style(doc, Some(&frame.style))?;
                    if doc.resources.get(&frame.href).is_none() {
                        return Err(OdfError::MissingFile(frame.href.clone()));
                    }
                }
                Inline::Text(_) | Inline::LineBreak => {}
            }
        }
        Ok(())
    }

    fn check_element(doc: &Document, element: &Element) -> Result<()> {
        match element {
            Element::Heading(h) => {
                check_style(doc, h.style.as_deref())?;
                check_inlines(doc, &h.content)
            }
            Element::Paragraph(p) => {
                check_style(doc, p.style.as_deref())?;
                check_inlines(doc, &p.content)
            }
            Element::Table(t) => {
                check_style(doc, Some(t.style()))?;
                for column in t.columns() {
                    check_style(doc, Some(&column.style))?;
                }
                check_style(doc, Some(&t.row().style))?;
                for cell in &t.row().cells {
                    check_style(doc, Some(&cell.style))?;
                    for inner in &cell.content {
                        check_element(doc, inner)?;
                    }
                }
                Ok(())
            }
        }
    }

    for element in &doc.body {
        check_element(doc, element)?;
    }
    Ok(())
}
