//! Node definitions for page-builder trees
//!
//! A payload is a flat mapping of node ids to node descriptors. Each
//! descriptor carries a type tag, a bag of scalar properties and the ordered
//! ids of its children.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a node within a tree
pub type NodeId = String;

/// Component kind of a node
///
/// The editor ships Dutch component names; English aliases are accepted so
/// hand-written payloads stay readable. Anything else is kept verbatim in
/// [`NodeKind::Unknown`] and treated as a transparent wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Root or generic wrapper, contributes no element of its own
    Container,
    /// A page; every page after the first starts on a new sheet
    Page,
    /// A styled heading
    Heading,
    /// A styled body-text paragraph
    Paragraph,
    /// A guest-data placeholder resolved by a later merge step
    MergeField,
    /// An embedded raster image
    Image,
    /// A multi-column row, laid out as a one-row table
    Row,
    /// A column of a row
    Column,
    /// A component kind this version does not know about
    Unknown(String),
}

impl NodeKind {
    /// Map a type tag to its kind
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Document" | "Container" | "div" => Self::Container,
            "Page" | "Pagina" => Self::Page,
            "Titel" | "Title" | "Heading" => Self::Heading,
            "Tekst" | "Text" | "Paragraph" => Self::Paragraph,
            "GastInformatie" | "MergeField" => Self::MergeField,
            "Afbeelding" | "Image" => Self::Image,
            "Rij" | "Row" => Self::Row,
            "Kolom" | "Column" => Self::Column,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Canonical tag for this kind (the editor's component name)
    pub fn tag(&self) -> &str {
        match self {
            Self::Container => "Container",
            Self::Page => "Page",
            Self::Heading => "Titel",
            Self::Paragraph => "Tekst",
            Self::MergeField => "GastInformatie",
            Self::Image => "Afbeelding",
            Self::Row => "Rij",
            Self::Column => "Kolom",
            Self::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A scalar property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropValue {
    /// Borrow the value as a string, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as a number
    ///
    /// Numeric strings are accepted, including a trailing `px` unit.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(s) => {
                let s = s.trim();
                let s = s.strip_suffix("px").unwrap_or(s).trim_end();
                s.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        }
    }

    /// Render the value as display text
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Property mapping of a node
///
/// Null and structured (array/object) values are not retained: every lookup
/// of such a key behaves as if the key were absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Props {
    values: HashMap<String, PropValue>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object, dropping values that are not scalars
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let values = map
            .iter()
            .filter_map(|(key, value)| {
                PropValue::deserialize(value)
                    .ok()
                    .map(|value| (key.clone(), value))
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.values.get(key)
    }

    /// String value of `key`, if present and a string
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropValue::as_str)
    }

    /// Numeric value of `key`, accepting numeric strings
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(PropValue::as_number)
    }

    /// Display text of `key`, or `default` when absent
    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.get(key)
            .map(PropValue::to_text)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One node of the page-builder tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Component kind
    pub kind: NodeKind,
    /// Component properties
    pub props: Props,
    /// Ordered child ids
    pub nodes: Vec<NodeId>,
}

impl Node {
    /// Create a node without props or children
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            props: Props::new(),
            nodes: Vec::new(),
        }
    }

    /// Set a property
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(key, value);
        self
    }

    /// Append child ids
    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.nodes.extend(children.into_iter().map(Into::into));
        self
    }

    /// Decode one node descriptor
    ///
    /// Returns `None` when the descriptor is not an object. Inside an object
    /// every field is optional: a missing or odd `type` becomes an unknown
    /// kind, a non-object `props` is empty, non-string child ids are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let tag = match object.get("type") {
            Some(Value::String(tag)) => tag.as_str(),
            Some(Value::Object(type_info)) => type_info
                .get("resolvedName")
                .and_then(Value::as_str)
                .unwrap_or(""),
            _ => "",
        };

        let props = object
            .get("props")
            .and_then(Value::as_object)
            .map(Props::from_map)
            .unwrap_or_default();

        let nodes = object
            .get("nodes")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            kind: NodeKind::from_tag(tag),
            props,
            nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_from_dutch_and_english_tags() {
        assert_eq!(NodeKind::from_tag("Titel"), NodeKind::Heading);
        assert_eq!(NodeKind::from_tag("Heading"), NodeKind::Heading);
        assert_eq!(NodeKind::from_tag("Tekst"), NodeKind::Paragraph);
        assert_eq!(NodeKind::from_tag("GastInformatie"), NodeKind::MergeField);
        assert_eq!(NodeKind::from_tag("Afbeelding"), NodeKind::Image);
        assert_eq!(NodeKind::from_tag("Rij"), NodeKind::Row);
        assert_eq!(NodeKind::from_tag("Kolom"), NodeKind::Column);
        assert_eq!(NodeKind::from_tag("Document"), NodeKind::Container);
        assert_eq!(NodeKind::from_tag("div"), NodeKind::Container);
    }

    #[test]
    fn test_unknown_tag_is_kept_verbatim() {
        let kind = NodeKind::from_tag("Knop");
        assert_eq!(kind, NodeKind::Unknown("Knop".to_string()));
        assert_eq!(kind.tag(), "Knop");
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert_eq!(
            NodeKind::from_tag("titel"),
            NodeKind::Unknown("titel".to_string())
        );
    }

    #[test]
    fn test_prop_value_numbers() {
        assert_eq!(PropValue::from(16i64).as_number(), Some(16.0));
        assert_eq!(PropValue::from("16").as_number(), Some(16.0));
        assert_eq!(PropValue::from(" 18px ").as_number(), Some(18.0));
        assert_eq!(PropValue::from("large").as_number(), None);
        assert_eq!(PropValue::from(true).as_number(), None);
    }

    #[test]
    fn test_prop_value_to_text() {
        assert_eq!(PropValue::from(3i64).to_text(), "3");
        assert_eq!(PropValue::from(2.5).to_text(), "2.5");
        assert_eq!(PropValue::from("email").to_text(), "email");
    }

    #[test]
    fn test_props_drop_null_and_structured_values() {
        let value = json!({"text": "Hi", "size": 12, "gone": null, "list": [1, 2], "obj": {}});
        let props = Props::from_map(value.as_object().unwrap());
        assert_eq!(props.len(), 2);
        assert_eq!(props.str("text"), Some("Hi"));
        assert_eq!(props.number("size"), Some(12.0));
        assert!(props.get("gone").is_none());
    }

    #[test]
    fn test_node_from_resolved_name() {
        let value = json!({
            "type": {"resolvedName": "Tekst"},
            "props": {"text": "Hallo"},
            "nodes": ["a", 7, "b"]
        });
        let node = Node::from_value(&value).unwrap();
        assert_eq!(node.kind, NodeKind::Paragraph);
        assert_eq!(node.props.str("text"), Some("Hallo"));
        assert_eq!(node.nodes, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_node_from_plain_string_type() {
        let node = Node::from_value(&json!({"type": "div"})).unwrap();
        assert_eq!(node.kind, NodeKind::Container);
        assert!(node.props.is_empty());
        assert!(node.nodes.is_empty());
    }

    #[test]
    fn test_node_with_odd_fields() {
        let node = Node::from_value(&json!({"type": 5, "props": "x", "nodes": {}})).unwrap();
        assert_eq!(node.kind, NodeKind::Unknown(String::new()));
        assert!(node.props.is_empty());
        assert!(node.nodes.is_empty());
    }

    #[test]
    fn test_non_object_node_is_rejected() {
        assert!(Node::from_value(&json!("Titel")).is_none());
        assert!(Node::from_value(&json!(null)).is_none());
    }

    #[test]
    fn test_node_builder() {
        let node = Node::new(NodeKind::Row)
            .with_prop("gap", 2i64)
            .with_children(["c1", "c2"]);
        assert_eq!(node.props.number("gap"), Some(2.0));
        assert_eq!(node.nodes.len(), 2);
    }
}
