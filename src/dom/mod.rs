//! Host document - the retained tree the renderer patches.
//!
//! Stands in for the native DOM: a slab arena of nodes addressed by stable
//! [`NodeId`] handles, with parent/child links, attribute storage, and a
//! root-level listener table (see [`event`]). Freed ids are pooled and
//! reused, so a `NodeId` is only meaningful while its node is alive.
//!
//! The renderer stamps each element with the selector token of its
//! originating virtual node; the selector index reads those stamps back
//! during reindexing.

mod event;

pub use event::*;

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::Selector;

// =============================================================================
// Nodes
// =============================================================================

/// Stable handle to one live node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        id: String,
        classes: Vec<String>,
        attributes: BTreeMap<String, String>,
        selector: Option<Selector>,
    },
    Text {
        content: String,
    },
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

// =============================================================================
// Document
// =============================================================================

/// The host tree.
pub struct Document {
    nodes: Vec<Option<NodeData>>,
    free: Vec<usize>,
    listeners: HashMap<String, Vec<(usize, Rc<dyn Fn(&DomEvent)>)>>,
    next_listener_id: usize,
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            listeners: HashMap::new(),
            next_listener_id: 0,
        }
    }

    fn allocate(&mut self, data: NodeData) -> NodeId {
        if let Some(index) = self.free.pop() {
            self.nodes[index] = Some(data);
            NodeId(index)
        } else {
            self.nodes.push(Some(data));
            NodeId(self.nodes.len() - 1)
        }
    }

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.allocate(NodeData {
            kind: NodeKind::Element {
                tag: tag.to_string(),
                id: String::new(),
                classes: Vec::new(),
                attributes: BTreeMap::new(),
                selector: None,
            },
            parent: None,
            children: Vec::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.allocate(NodeData {
            kind: NodeKind::Text {
                content: content.to_string(),
            },
            parent: None,
            children: Vec::new(),
        })
    }

    /// Whether the id refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    /// Count of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    // -------------------------------------------------------------------------
    // Tree structure
    // -------------------------------------------------------------------------

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_child(parent, usize::MAX, child);
    }

    /// Insert `child` under `parent` at `index` (clamped to the child count).
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        if let Some(data) = self.data_mut(parent) {
            let index = index.min(data.children.len());
            data.children.insert(index, child);
        }
        if let Some(data) = self.data_mut(child) {
            data.parent = Some(parent);
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.data(child).and_then(|d| d.parent) else {
            return;
        };
        if let Some(parent_data) = self.data_mut(parent) {
            parent_data.children.retain(|c| *c != child);
        }
        if let Some(data) = self.data_mut(child) {
            data.parent = None;
        }
    }

    /// Remove a node and release its whole subtree back to the pool.
    pub fn remove_node(&mut self, id: NodeId) {
        self.detach(id);
        self.release(id);
    }

    fn release(&mut self, id: NodeId) {
        let Some(data) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        for child in data.children {
            self.release(child);
        }
        self.free.push(id.0);
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|d| d.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.data(id).map(|d| d.children.clone()).unwrap_or_default()
    }

    /// Whether `id` is `root` or lies anywhere under it.
    pub fn contains(&self, root: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    // -------------------------------------------------------------------------
    // Element accessors
    // -------------------------------------------------------------------------

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.data(id).map(|d| &d.kind) {
            Some(NodeKind::Element { tag, .. }) => Some(tag),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id).map(|d| &d.kind), Some(NodeKind::Text { .. }))
    }

    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        match self.data(id).map(|d| &d.kind) {
            Some(NodeKind::Element { id, .. }) if !id.is_empty() => Some(id),
            _ => None,
        }
    }

    pub fn set_element_id(&mut self, id: NodeId, value: &str) {
        if let Some(NodeKind::Element { id: slot, .. }) = self.data_mut(id).map(|d| &mut d.kind) {
            *slot = value.to_string();
        }
    }

    pub fn classes(&self, id: NodeId) -> &[String] {
        match self.data(id).map(|d| &d.kind) {
            Some(NodeKind::Element { classes, .. }) => classes,
            _ => &[],
        }
    }

    /// Space-joined class list, `className` style.
    pub fn class_name(&self, id: NodeId) -> String {
        self.classes(id).join(" ")
    }

    pub fn set_classes(&mut self, id: NodeId, value: Vec<String>) {
        if let Some(NodeKind::Element { classes, .. }) = self.data_mut(id).map(|d| &mut d.kind) {
            *classes = value;
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.data(id).map(|d| &d.kind) {
            Some(NodeKind::Element { attributes, .. }) => {
                attributes.get(name).map(String::as_str)
            }
            _ => None,
        }
    }

    pub fn set_attributes(&mut self, id: NodeId, value: BTreeMap<String, String>) {
        if let Some(NodeKind::Element { attributes, .. }) = self.data_mut(id).map(|d| &mut d.kind)
        {
            *attributes = value;
        }
    }

    pub fn selector(&self, id: NodeId) -> Option<&Selector> {
        match self.data(id).map(|d| &d.kind) {
            Some(NodeKind::Element { selector, .. }) => selector.as_ref(),
            _ => None,
        }
    }

    pub fn set_selector(&mut self, id: NodeId, value: Option<Selector>) {
        if let Some(NodeKind::Element { selector, .. }) = self.data_mut(id).map(|d| &mut d.kind) {
            *selector = value;
        }
    }

    // -------------------------------------------------------------------------
    // Text accessors
    // -------------------------------------------------------------------------

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id).map(|d| &d.kind) {
            Some(NodeKind::Text { content }) => Some(content),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, content: &str) {
        if let Some(NodeKind::Text { content: slot, .. }) =
            self.data_mut(id).map(|d| &mut d.kind)
        {
            *slot = content.to_string();
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Depth-first search for the first element with the given tag under
    /// (and excluding) `root`.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        for child in self.children(root) {
            if self.tag_name(child) == Some(tag) {
                return Some(child);
            }
            if let Some(found) = self.find_by_tag(child, tag) {
                return Some(found);
            }
        }
        None
    }

    /// All elements with the given tag under `root`, in document order.
    pub fn find_all_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_by_tag(root, tag, &mut found);
        found
    }

    fn collect_by_tag(&self, root: NodeId, tag: &str, found: &mut Vec<NodeId>) {
        for child in self.children(root) {
            if self.tag_name(child) == Some(tag) {
                found.push(child);
            }
            self.collect_by_tag(child, tag, found);
        }
    }

    /// Concatenated text of all descendant text nodes, `innerText` style.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        let mut out = String::new();
        for child in self.children(id) {
            out.push_str(&self.text_content(child));
        }
        out
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    /// Register a root-level listener for an event kind.
    pub fn add_listener(&mut self, kind: &str, callback: Rc<dyn Fn(&DomEvent)>) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners
            .entry(kind.to_string())
            .or_default()
            .push((id, callback));
        ListenerId {
            kind: kind.to_string(),
            id,
        }
    }

    /// Remove a previously registered listener.
    pub fn remove_listener(&mut self, listener: &ListenerId) {
        if let Some(list) = self.listeners.get_mut(&listener.kind) {
            list.retain(|(id, _)| *id != listener.id);
            if list.is_empty() {
                self.listeners.remove(&listener.kind);
            }
        }
    }

    /// How many listeners are registered for a kind.
    pub fn listener_count(&self, kind: &str) -> usize {
        self.listeners.get(kind).map(Vec::len).unwrap_or(0)
    }

    pub(crate) fn listeners_for(&self, kind: &str) -> Vec<Rc<dyn Fn(&DomEvent)>> {
        self.listeners
            .get(kind)
            .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
