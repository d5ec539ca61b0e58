//! Selector Registry - token to node mapping.
//!
//! Rebuilt in full on every render pass, synchronously, before the next
//! event can be delegated. Correctness over performance: reindex cost is
//! bounded by tree size, and render frequency is already gated by the
//! application's own state updates.
//!
//! Bidirectional:
//! - token -> nodes, for "which nodes currently carry this selector"
//!   (duplicates are expected under a shared string token)
//! - node -> token, for the delegation walk ("does this ancestor carry
//!   any selector")

use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::types::Selector;

/// Snapshot of selector-to-node mappings for one rendered tree.
#[derive(Debug, Clone, Default)]
pub struct SelectorIndex {
    by_token: HashMap<Selector, Vec<NodeId>>,
    by_node: HashMap<NodeId, Selector>,
}

impl SelectorIndex {
    /// Nodes currently carrying `selector`, in document order.
    pub fn nodes(&self, selector: &Selector) -> &[NodeId] {
        self.by_token
            .get(selector)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The selector carried by `node`, if any.
    pub fn selector_at(&self, node: NodeId) -> Option<&Selector> {
        self.by_node.get(&node)
    }

    /// Number of distinct tokens in the index.
    pub fn token_count(&self) -> usize {
        self.by_token.len()
    }

    /// Number of tagged nodes in the index.
    pub fn node_count(&self) -> usize {
        self.by_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }

    fn insert(&mut self, selector: Selector, node: NodeId) {
        self.by_token.entry(selector.clone()).or_default().push(node);
        self.by_node.insert(node, selector);
    }
}

/// Build a fresh index from the subtree under `root`.
///
/// Depth-first, so `nodes()` slices come back in document order. The root
/// itself is the mount element and is not indexed.
pub fn reindex(doc: &Document, root: NodeId) -> SelectorIndex {
    let mut index = SelectorIndex::default();
    let mut stack: Vec<NodeId> = doc.children(root);
    stack.reverse();

    while let Some(node) = stack.pop() {
        if let Some(selector) = doc.selector(node) {
            index.insert(selector.clone(), node);
        }
        let mut children = doc.children(node);
        children.reverse();
        stack.extend(children);
    }
    index
}

// =============================================================================
// Tests
// =============================================================================
