//! Node tree and payload decoding
//!
//! The editor serializes its state as a JSON object keyed by node id, with
//! the reserved id [`ROOT_ID`] as entry point. The export button wraps that
//! object as `{"data": ...}` and usually sends the inner value as a JSON
//! string, so decoding unwraps the envelope and one level of string
//! encoding before looking at nodes.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::node::{Node, NodeId};

/// Reserved id of the root node
pub const ROOT_ID: &str = "ROOT";

/// Envelope key used by the editor's export request
const ENVELOPE_KEY: &str = "data";

/// Payload-level decoding errors
///
/// These are client errors: they are reported before any document state is
/// created. Problems with individual nodes never surface here.
#[derive(Error, Debug)]
pub enum TreeError {
    /// Payload is not valid JSON
    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Payload decoded to something other than an object
    #[error("Payload must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// Payload has no usable root node
    #[error("Payload has no \"ROOT\" node")]
    MissingRoot,
}

/// Result type for tree operations
pub type Result<T> = std::result::Result<T, TreeError>;

/// A decoded page-builder tree
#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    nodes: HashMap<NodeId, Node>,
}

impl NodeTree {
    /// Create an empty tree (without root)
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a payload from JSON text
    pub fn from_json_str(payload: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_value(value)
    }

    /// Decode a payload from a JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let value = unwrap_envelope(value)?;
        let entries = match value {
            Value::Object(entries) => entries,
            other => return Err(TreeError::NotAnObject(json_kind(&other))),
        };

        let mut nodes = HashMap::with_capacity(entries.len());
        for (id, raw) in &entries {
            match Node::from_value(raw) {
                Some(node) => {
                    nodes.insert(id.clone(), node);
                }
                None => {
                    log::warn!(
                        "Ignoring node {}: expected an object, found {}",
                        id,
                        json_kind(raw)
                    );
                }
            }
        }

        if !nodes.contains_key(ROOT_ID) {
            return Err(TreeError::MissingRoot);
        }

        log::debug!("Decoded payload with {} nodes", nodes.len());
        Ok(Self { nodes })
    }

    /// Look up a node by id
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The root node, if present
    pub fn root(&self) -> Option<&Node> {
        self.get(ROOT_ID)
    }

    /// Whether a node with this id exists
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Insert or replace a node
    pub fn insert(&mut self, id: impl Into<NodeId>, node: Node) {
        self.nodes.insert(id.into(), node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<(NodeId, Node)> for NodeTree {
    fn from_iter<I: IntoIterator<Item = (NodeId, Node)>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

/// Strip the `{"data": ...}` envelope and one level of string encoding
fn unwrap_envelope(value: Value) -> Result<Value> {
    match decode_string(value)? {
        Value::Object(mut map) if !map.contains_key(ROOT_ID) => match map.remove(ENVELOPE_KEY) {
            Some(inner) => decode_string(inner),
            None => Ok(Value::Object(map)),
        },
        other => Ok(other),
    }
}

fn decode_string(value: Value) -> Result<Value> {
    match value {
        Value::String(text) => Ok(serde_json::from_str(&text)?),
        other => Ok(other),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
