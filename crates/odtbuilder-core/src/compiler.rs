//! Node compiler
//!
//! Walks the node tree depth-first from the root and appends block elements
//! to the document body, registering one set of automatic styles per node.
//!
//! Every node is compiled in isolation: when a node fails, everything it
//! added (elements, styles, embedded pictures) is rolled back, a warning is
//! logged, and traversal continues with its next sibling. Nodes nested
//! deeper than [`MAX_DEPTH`] are skipped the same way.

use odtbuilder_ast::{Node, NodeKind, NodeTree, PropValue, Props, ROOT_ID};
use odtbuilder_odf::{
    style_name, CellProperties, ColumnProperties, ColumnWidth, Document, Element, FontStyle,
    FontWeight, Frame, GraphicProperties, Heading, Inline, PageLayout, Paragraph,
    ParagraphProperties, Resources, RowProperties, Style, StyleProperties, StyleRegistry, Table,
    TableCell, TableColumn, TableProperties, TableRow, TextAlign, TextProperties,
    HEADING_STYLE, STANDARD_STYLE,
};

use crate::config::DEFAULT_MISSING_MARKER;
use crate::context::{BuildContext, MAX_DEPTH};
use crate::image::ImageResolver;
use crate::richtext::{self, Segment};
use crate::units::{self, PT_PER_PX, PX_PER_REM, PX_PER_SPACING_UNIT};

/// Outline level of Heading nodes
pub const HEADING_LEVEL: u8 = 1;

/// Merge field used when a node names none
pub const DEFAULT_MERGE_FIELD: &str = "firstname";

/// Minimum height of a layout row
pub const ROW_MIN_HEIGHT_CM: f64 = 0.5;

/// Color of the failure marker shown for missing images
pub const MARKER_COLOR: &str = "#999999";

/// Outcome of compiling one node
type NodeResult = odtbuilder_odf::Result<()>;

/// Text block defaults of one node kind
struct TextDefaults {
    text: &'static str,
    font_size_px: f64,
    color: &'static str,
    font_weight: FontWeight,
    /// Line height multiplier; `None` leaves the line height alone
    line_height: Option<f64>,
}

const HEADING_DEFAULTS: TextDefaults = TextDefaults {
    text: "Titel",
    font_size_px: 26.0,
    color: "#1a202c",
    font_weight: FontWeight::Bold,
    line_height: None,
};

const PARAGRAPH_DEFAULTS: TextDefaults = TextDefaults {
    text: "",
    font_size_px: 14.0,
    color: "#4a5568",
    font_weight: FontWeight::Normal,
    line_height: Some(1.5),
};

/// Row defaults
const DEFAULT_ROW_GAP_REM: f64 = 1.0;
const DEFAULT_ROW_MY_UNITS: f64 = 2.0;
const DEFAULT_COLUMN_PADDING_PX: f64 = 8.0;

/// Compilation settings
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Text of the marker paragraph for unresolvable images
    pub missing_marker: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            missing_marker: DEFAULT_MISSING_MARKER.to_string(),
        }
    }
}

/// Literal merge placeholder for a guest field
///
/// ```
/// use odtbuilder_core::compiler::merge_placeholder;
///
/// assert_eq!(merge_placeholder("lastname"), "{{ $guest.lastname }}");
/// ```
pub fn merge_placeholder(field: &str) -> String {
    format!("{{{{ $guest.{} }}}}", field)
}

/// Compile `tree` from its root into `document`
///
/// Returns the traversal context, which records how many pages were seen
/// and how many nodes had to be skipped.
pub fn compile(
    tree: &NodeTree,
    document: &mut Document,
    resolver: &ImageResolver,
    options: &CompileOptions,
) -> BuildContext {
    let layout = document.layout();
    let Document {
        body,
        styles,
        resources,
        ..
    } = document;

    let mut compiler = NodeCompiler::new(tree, styles, resources, layout, resolver, options);
    compiler.visit(ROOT_ID, body);
    compiler.finish()
}

/// Tree walker holding the document parts it writes into
pub struct NodeCompiler<'a> {
    tree: &'a NodeTree,
    styles: &'a mut StyleRegistry,
    resources: &'a mut Resources,
    layout: PageLayout,
    resolver: &'a ImageResolver,
    options: &'a CompileOptions,
    context: BuildContext,
}

impl<'a> NodeCompiler<'a> {
    pub fn new(
        tree: &'a NodeTree,
        styles: &'a mut StyleRegistry,
        resources: &'a mut Resources,
        layout: PageLayout,
        resolver: &'a ImageResolver,
        options: &'a CompileOptions,
    ) -> Self {
        Self {
            tree,
            styles,
            resources,
            layout,
            resolver,
            options,
            context: BuildContext::new(),
        }
    }

    /// End the traversal and hand back its context
    pub fn finish(self) -> BuildContext {
        if self.context.skipped() > 0 {
            log::warn!("{} node(s) skipped due to errors", self.context.skipped());
        }
        self.context
    }

    /// Compile the node `id` into `parent`
    ///
    /// Unknown ids and repeated visits are ignored. Nodes beyond
    /// [`MAX_DEPTH`] are skipped.
    pub fn visit(&mut self, id: &str, parent: &mut Vec<Element>) {
        let tree = self.tree;
        let Some(node) = tree.get(id) else {
            log::debug!("Skipping reference to missing node {}", id);
            return;
        };
        if !self.context.first_visit(id) {
            log::warn!("Node {} is referenced more than once, ignoring repeat", id);
            return;
        }

        if !self.context.descend() {
            log::warn!(
                "Skipping {} node {}: nested deeper than {} levels",
                node.kind,
                id,
                MAX_DEPTH
            );
            self.context.record_skip();
            return;
        }

        let parent_len = parent.len();
        let styles_mark = self.styles.mark();
        let resources_mark = self.resources.mark();

        let result = self.compile_node(id, node, parent);
        self.context.ascend();

        if let Err(e) = result {
            log::warn!("Skipping {} node {}: {}", node.kind, id, e);
            parent.truncate(parent_len);
            self.styles.rollback(styles_mark);
            self.resources.rollback(resources_mark);
            self.context.record_skip();
        }
    }

    fn visit_children(&mut self, node: &Node, parent: &mut Vec<Element>) {
        for child in &node.nodes {
            self.visit(child, parent);
        }
    }

    fn compile_node(&mut self, id: &str, node: &Node, parent: &mut Vec<Element>) -> NodeResult {
        match &node.kind {
            NodeKind::Container | NodeKind::Column => {
                self.visit_children(node, parent);
                Ok(())
            }
            NodeKind::Unknown(tag) => {
                log::debug!("Passing through unknown node type {:?} ({})", tag, id);
                self.visit_children(node, parent);
                Ok(())
            }
            NodeKind::Page => self.page(id, node, parent),
            NodeKind::Heading => self.heading(id, &node.props, parent),
            NodeKind::Paragraph => self.paragraph(id, &node.props, parent),
            NodeKind::MergeField => {
                self.merge_field(&node.props, parent);
                Ok(())
            }
            NodeKind::Image => self.image(id, &node.props, parent),
            NodeKind::Row => self.row(id, node, parent),
        }
    }

    fn page(&mut self, id: &str, node: &Node, parent: &mut Vec<Element>) -> NodeResult {
        if !self.context.enter_page() {
            let style = self.styles.register(
                Style::new(
                    style_name("PB", id, None),
                    StyleProperties::Paragraph {
                        paragraph: ParagraphProperties {
                            margin_top_cm: Some(0.0),
                            margin_bottom_cm: Some(0.0),
                            break_before_page: true,
                            ..Default::default()
                        },
                        text: TextProperties {
                            font_size_pt: Some(1.0),
                            ..Default::default()
                        },
                    },
                )
                .with_parent(STANDARD_STYLE),
            )?;
            parent.push(Element::Paragraph(Paragraph::empty().styled(style)));
        }
        self.visit_children(node, parent);
        Ok(())
    }

    fn heading(&mut self, id: &str, props: &Props, parent: &mut Vec<Element>) -> NodeResult {
        let style = self.text_style(id, props, &HEADING_DEFAULTS, HEADING_STYLE)?;
        let text = props.text_or("text", HEADING_DEFAULTS.text);
        parent.push(Element::Heading(Heading {
            level: HEADING_LEVEL,
            style: Some(style),
            content: rich_text(&text),
        }));
        Ok(())
    }

    fn paragraph(&mut self, id: &str, props: &Props, parent: &mut Vec<Element>) -> NodeResult {
        let style = self.text_style(id, props, &PARAGRAPH_DEFAULTS, STANDARD_STYLE)?;
        let text = props.text_or("text", PARAGRAPH_DEFAULTS.text);
        parent.push(Element::Paragraph(Paragraph {
            style: Some(style),
            content: rich_text(&text),
        }));
        Ok(())
    }

    /// Register the paragraph style of a Heading or Paragraph node
    fn text_style(
        &mut self,
        id: &str,
        props: &Props,
        defaults: &TextDefaults,
        parent_style: &str,
    ) -> odtbuilder_odf::Result<String> {
        let font_size_pt = match props.get("fontSize") {
            Some(size) => units::to_points(size),
            None => defaults.font_size_px * PT_PER_PX,
        };
        let font_weight = props
            .get("fontWeight")
            .map(|weight| units::font_weight(Some(weight)))
            .unwrap_or(defaults.font_weight);
        let line_height_pct = defaults
            .line_height
            .map(|multiplier| units::line_height_pct(props.get("lineHeight"), multiplier));

        let style = Style::new(
            style_name("P", id, None),
            StyleProperties::Paragraph {
                paragraph: ParagraphProperties {
                    align: Some(units::text_align(props.str("textAlign"))),
                    line_height_pct,
                    ..Default::default()
                },
                text: TextProperties {
                    font_size_pt: Some(font_size_pt),
                    color: Some(units::normalize_color(
                        props.str("color").unwrap_or(defaults.color),
                    )),
                    font_weight: Some(font_weight),
                    font_style: None,
                    font_family: Some(units::normalize_font_family(props.str("fontFamily"))),
                },
            },
        )
        .with_parent(parent_style);

        self.styles.register(style)
    }

    fn merge_field(&mut self, props: &Props, parent: &mut Vec<Element>) {
        let field = props.get("field").map(PropValue::to_text);
        let field = field
            .as_deref()
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .unwrap_or(DEFAULT_MERGE_FIELD);
        parent.push(Element::Paragraph(Paragraph::with_text(merge_placeholder(
            field,
        ))));
    }

    fn image(&mut self, id: &str, props: &Props, parent: &mut Vec<Element>) -> NodeResult {
        let src = props.str("src").map(str::trim).unwrap_or("");
        let rel_width_pct = units::relative_width(props.get("width"));

        let bytes = if src.is_empty() {
            log::warn!("Image {} has no source", id);
            None
        } else {
            match self.resolver.resolve(src) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    log::warn!("Image {} could not be resolved: {}", id, e);
                    None
                }
            }
        };

        let paragraph_style = self.styles.register(
            Style::new(
                style_name("P", id, None),
                StyleProperties::Paragraph {
                    paragraph: ParagraphProperties {
                        align: Some(TextAlign::Center),
                        ..Default::default()
                    },
                    text: TextProperties::default(),
                },
            )
            .with_parent(STANDARD_STYLE),
        )?;

        let Some(bytes) = bytes else {
            let marker_style = self.styles.register(Style::new(
                style_name("T", id, None),
                StyleProperties::Text(TextProperties {
                    color: Some(MARKER_COLOR.to_string()),
                    font_style: Some(FontStyle::Italic),
                    ..Default::default()
                }),
            ))?;
            parent.push(Element::Paragraph(Paragraph {
                style: Some(paragraph_style),
                content: vec![Inline::Span {
                    style: marker_style,
                    text: self.options.missing_marker.clone(),
                }],
            }));
            return Ok(());
        };

        let resource = self.resources.add_image(bytes)?;
        let href = resource.path.clone();
        let aspect_ratio = resource.info.aspect_ratio();

        let graphic_style = self.styles.register(Style::new(
            style_name("G", id, None),
            StyleProperties::Graphic(GraphicProperties {
                rel_width_pct,
                centered: true,
            }),
        ))?;

        let width_cm = self.layout.printable_width_cm() * rel_width_pct / 100.0;
        let height_cm = aspect_ratio.map_or(width_cm, |ratio| width_cm * ratio);

        parent.push(Element::Paragraph(Paragraph {
            style: Some(paragraph_style),
            content: vec![Inline::Frame(Frame {
                name: style_name("Image", id, None),
                style: graphic_style,
                href,
                width_cm,
                height_cm,
                rel_width_pct,
            })],
        }));
        Ok(())
    }

    /// Lay out a Row as a one-row table with one cell per Column child
    fn row(&mut self, id: &str, node: &Node, parent: &mut Vec<Element>) -> NodeResult {
        let tree = self.tree;
        let mut columns: Vec<&Node> = Vec::new();
        for child_id in &node.nodes {
            let Some(child) = tree.get(child_id) else {
                continue;
            };
            if !matches!(child.kind, NodeKind::Column) {
                continue;
            }
            if self.context.first_visit(child_id) {
                columns.push(child);
            } else {
                log::warn!("Row {}: column {} already used, ignoring repeat", id, child_id);
            }
        }

        if columns.is_empty() {
            log::debug!("Row {} has no columns, no table emitted", id);
            return Ok(());
        }
        if columns.len() < node.nodes.len() {
            log::debug!(
                "Row {}: {} of {} children are columns",
                id,
                columns.len(),
                node.nodes.len()
            );
        }

        let printable_width_cm = self.layout.printable_width_cm();
        let gap_px =
            units::spacing_px(node.props.number("gap").unwrap_or(DEFAULT_ROW_GAP_REM) * PX_PER_REM);
        let spacing_cm = units::px_to_cm(units::spacing_px(
            node.props.number("my").unwrap_or(DEFAULT_ROW_MY_UNITS) * PX_PER_SPACING_UNIT,
        ));

        let table_name = self.styles.register(Style::new(
            style_name("Tbl", id, None),
            StyleProperties::Table(TableProperties {
                width_cm: printable_width_cm,
                margin_top_cm: spacing_cm,
                margin_bottom_cm: spacing_cm,
            }),
        ))?;

        let mut table_columns = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let width = match column.props.str("width").and_then(units::parse_percentage) {
                Some(pct) => ColumnWidth::Absolute(printable_width_cm * pct.min(100.0) / 100.0),
                None => ColumnWidth::Relative(1),
            };
            let style = self.styles.register(Style::new(
                style_name("Tbl", id, Some(&format!("C{}", index + 1))),
                StyleProperties::TableColumn(ColumnProperties { width }),
            ))?;
            table_columns.push(TableColumn { style });
        }

        let row_style = self.styles.register(Style::new(
            style_name("Tbl", id, Some("R1")),
            StyleProperties::TableRow(RowProperties {
                min_height_cm: ROW_MIN_HEIGHT_CM,
            }),
        ))?;

        let mut cells = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let padding_px = units::spacing_px(
                column
                    .props
                    .number("padding")
                    .unwrap_or(DEFAULT_COLUMN_PADDING_PX),
            );
            let style = self.styles.register(Style::new(
                style_name("Tbl", id, Some(&format!("Cell{}", index + 1))),
                StyleProperties::TableCell(CellProperties {
                    padding_vertical_cm: units::px_to_cm(padding_px),
                    padding_horizontal_cm: units::px_to_cm(padding_px + gap_px / 2.0),
                    border: false,
                }),
            ))?;

            let mut cell = TableCell::new(style);
            self.visit_children(column, &mut cell.content);
            cell.ensure_content();
            cells.push(cell);
        }

        let table = Table::new(
            table_name.clone(),
            table_name,
            table_columns,
            TableRow {
                style: row_style,
                cells,
            },
        )?;
        parent.push(Element::Table(table));
        Ok(())
    }
}

/// Convert editor markup to inline content
fn rich_text(markup: &str) -> Vec<Inline> {
    richtext::normalize(markup)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => Inline::Text(text),
            Segment::Break => Inline::LineBreak,
        })
        .collect()
}
