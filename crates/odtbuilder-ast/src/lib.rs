//! odtbuilder-ast - Page-builder tree definitions
//!
//! This crate provides the input model of odtbuilder: the flat node mapping
//! produced by the visual editor, decoded into typed [`Node`]s.

pub mod node;
pub mod tree;

pub use node::{Node, NodeId, NodeKind, PropValue, Props};
pub use tree::{NodeTree, Result, TreeError, ROOT_ID};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
