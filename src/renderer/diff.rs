//! Differential tree patcher.
//!
//! The DomRenderer compares the incoming virtual tree to the one it rendered
//! last and only touches host nodes that changed. Reuse is positional: a
//! child that keeps its kind and tag keeps its `NodeId`, which is what the
//! selector index depends on.
//!
//! # Algorithm
//!
//! 1. Resolve component nodes to a plain element/text tree (depth-capped)
//! 2. Walk old and new children in lockstep:
//!    - same tag: update attributes/selector in place, recurse
//!    - same text: skip; different text: set content
//!    - anything else: drop the old subtree, build the new one in its place
//! 3. Remove trailing old children, append trailing new ones
//! 4. Store the resolved tree for the next comparison

use crate::dom::{Document, NodeId};
use crate::error::RenderError;
use crate::vnode::{ElementNode, VNode};

/// Component expansion bound; trees deeper than this are assumed cyclic.
const MAX_COMPONENT_DEPTH: usize = 64;

/// Differential renderer for one mount point.
///
/// Keeps the previously rendered (component-resolved) tree to enable
/// diff-based patching. A fresh renderer, or one after [`DomRenderer::invalidate`],
/// builds the full subtree.
pub struct DomRenderer {
    previous: Option<VNode>,
}

impl DomRenderer {
    /// Create a renderer with no previous tree.
    pub fn new() -> Self {
        Self { previous: None }
    }

    /// Converge the children of `mount` to `next`.
    ///
    /// On error the previous tree is kept, so a later valid tree diffs
    /// against the last successfully rendered state.
    pub fn render(
        &mut self,
        doc: &mut Document,
        mount: NodeId,
        next: &VNode,
    ) -> Result<(), RenderError> {
        let resolved = resolve(next, 0)?;

        let previous = self.previous.take();
        let prev_slice: &[VNode] = previous.as_ref().map(std::slice::from_ref).unwrap_or(&[]);
        patch_children(doc, mount, prev_slice, std::slice::from_ref(&resolved));

        self.previous = Some(resolved);
        Ok(())
    }

    /// Forget the previous tree. The next render rebuilds from scratch.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Check if there is a previous tree to diff against.
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

impl Default for DomRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Component resolution
// =============================================================================

/// Expand component nodes into the element/text tree they stand for.
fn resolve(node: &VNode, depth: usize) -> Result<VNode, RenderError> {
    if depth > MAX_COMPONENT_DEPTH {
        return Err(RenderError::ComponentDepthExceeded(MAX_COMPONENT_DEPTH));
    }
    match node {
        VNode::Component(c) => resolve(&c.render(), depth + 1),
        VNode::Text(content) => Ok(VNode::Text(content.clone())),
        VNode::Element(el) => {
            if el.tag.is_empty() {
                return Err(RenderError::EmptyTag);
            }
            let mut resolved = el.clone();
            resolved.children = el
                .children
                .iter()
                .map(|child| resolve(child, depth + 1))
                .collect::<Result<_, _>>()?;
            Ok(VNode::Element(resolved))
        }
    }
}

// =============================================================================
// Patching
// =============================================================================

fn patch_children(doc: &mut Document, parent: NodeId, prev: &[VNode], next: &[VNode]) {
    for (i, next_child) in next.iter().enumerate() {
        let existing = doc.children(parent).get(i).copied();
        let prev_child = prev.get(i);

        match (existing, prev_child) {
            (Some(node), Some(old)) if can_reuse(old, next_child) => {
                update_in_place(doc, node, old, next_child);
            }
            (Some(node), _) => {
                doc.remove_node(node);
                let fresh = build_subtree(doc, next_child);
                doc.insert_child(parent, i, fresh);
            }
            (None, _) => {
                let fresh = build_subtree(doc, next_child);
                doc.append_child(parent, fresh);
            }
        }
    }

    // Drop host children beyond the new tree.
    for node in doc.children(parent).into_iter().skip(next.len()) {
        doc.remove_node(node);
    }
}

fn can_reuse(old: &VNode, next: &VNode) -> bool {
    match (old, next) {
        (VNode::Element(a), VNode::Element(b)) => a.tag == b.tag,
        (VNode::Text(_), VNode::Text(_)) => true,
        _ => false,
    }
}

fn update_in_place(doc: &mut Document, node: NodeId, old: &VNode, next: &VNode) {
    match (old, next) {
        (VNode::Text(old_content), VNode::Text(content)) => {
            if old_content != content {
                doc.set_text(node, content);
            }
        }
        (VNode::Element(old_el), VNode::Element(el)) => {
            apply_element(doc, node, el);
            patch_children(doc, node, &old_el.children, &el.children);
        }
        _ => unreachable!("guarded by can_reuse"),
    }
}

fn apply_element(doc: &mut Document, node: NodeId, el: &ElementNode) {
    doc.set_element_id(node, el.id.as_deref().unwrap_or(""));
    doc.set_classes(node, el.classes.clone());
    doc.set_attributes(node, el.attributes.clone());
    doc.set_selector(node, el.selector.clone());
}

fn build_subtree(doc: &mut Document, node: &VNode) -> NodeId {
    match node {
        VNode::Text(content) => doc.create_text(content),
        VNode::Element(el) => {
            let id = doc.create_element(&el.tag);
            apply_element(doc, id, el);
            for child in &el.children {
                let built = build_subtree(doc, child);
                doc.append_child(id, built);
            }
            id
        }
        // Resolution happens before patching; a component here is a bug.
        VNode::Component(_) => unreachable!("components are resolved before patching"),
    }
}

// =============================================================================
// Tests
// =============================================================================
