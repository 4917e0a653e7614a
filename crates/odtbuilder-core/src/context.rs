//! Per-build traversal state

use std::collections::HashSet;

use odtbuilder_ast::NodeId;

/// Deepest node nesting compiled; deeper nodes are skipped
pub const MAX_DEPTH: usize = 256;

/// Mutable state threaded through one traversal
///
/// Created fresh for every build and never shared between builds.
#[derive(Debug, Default)]
pub struct BuildContext {
    pages: usize,
    visited: HashSet<NodeId>,
    depth: usize,
    skipped: usize,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a Page node; returns `true` for the first page
    pub fn enter_page(&mut self) -> bool {
        self.pages += 1;
        self.pages == 1
    }

    /// Number of Page nodes seen so far
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Mark a node as visited; returns `false` if it was seen before
    pub fn first_visit(&mut self, id: &str) -> bool {
        if self.visited.contains(id) {
            return false;
        }
        self.visited.insert(id.to_string());
        true
    }

    /// Go one level deeper; returns `false` past [`MAX_DEPTH`]
    pub fn descend(&mut self) -> bool {
        if self.depth >= MAX_DEPTH {
            return false;
        }
        self.depth += 1;
        true
    }

    /// Return from a level entered with [`descend`](Self::descend)
    pub fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Record a node that failed and was left out
    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Number of nodes left out because they failed
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_first_page_is_first() {
        let mut ctx = BuildContext::new();
        assert!(ctx.enter_page());
        assert!(!ctx.enter_page());
        assert!(!ctx.enter_page());
        assert_eq!(ctx.pages(), 3);
    }

    #[test]
    fn test_first_visit() {
        let mut ctx = BuildContext::new();
        assert!(ctx.first_visit("a"));
        assert!(!ctx.first_visit("a"));
        assert!(ctx.first_visit("b"));
    }

    #[test]
    fn test_depth_limit() {
        let mut ctx = BuildContext::new();
        for _ in 0..MAX_DEPTH {
            assert!(ctx.descend());
        }
        assert!(!ctx.descend());
        assert_eq!(ctx.depth(), MAX_DEPTH);

        ctx.ascend();
        assert!(ctx.descend());
    }
}
