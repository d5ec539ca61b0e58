//! Delegation walk and delegated subscription store.
//!
//! Resolution mirrors native bubbling: starting at the event target, walk
//! the ancestor chain toward the render root; the first node carrying any
//! indexed selector wins, so an inner match shadows an outer one. A target
//! with no tagged ancestor resolves to nothing and the event is dropped -
//! applications may legitimately request selectors that do not (yet) exist
//! in the tree.
//!
//! The caller is expected to resolve against a snapshot of the index taken
//! when delegation starts; a re-render triggered synchronously by a
//! subscriber must not be observed by the in-flight walk.

use std::collections::HashMap;

use crate::dom::{DomEvent, Document, NodeId};
use crate::engine::SelectorIndex;
use crate::stream::Stream;
use crate::types::Selector;

/// Resolve an event target to the closest tagged ancestor's selector.
///
/// The walk stops at `root` (inclusive); nodes outside the mounted subtree
/// never resolve.
pub fn resolve(
    doc: &Document,
    index: &SelectorIndex,
    target: NodeId,
    root: NodeId,
) -> Option<Selector> {
    let mut current = Some(target);
    while let Some(node) = current {
        if let Some(selector) = index.selector_at(node) {
            return Some(selector.clone());
        }
        if node == root {
            return None;
        }
        current = doc.parent(node);
    }
    None
}

/// One multicast stream per `(selector, event kind)` pair ever requested.
///
/// Created lazily on first request and kept for the driver's lifetime:
/// repeated queries for the same key must observe the same stream identity,
/// and losing the last subscriber must not tear the stream down.
#[derive(Default)]
pub struct DelegatedSubscriptions {
    streams: HashMap<(Selector, String), Stream<DomEvent>>,
}

impl DelegatedSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stream for a key, if one was ever created.
    pub fn get(&self, selector: &Selector, kind: &str) -> Option<Stream<DomEvent>> {
        self.streams
            .get(&(selector.clone(), kind.to_string()))
            .cloned()
    }

    /// Get or create the stream for a key. The bool is true when this call
    /// created it, letting the caller wire up the native listener once.
    pub fn get_or_create(&mut self, selector: Selector, kind: &str) -> (Stream<DomEvent>, bool) {
        let key = (selector, kind.to_string());
        if let Some(stream) = self.streams.get(&key) {
            return (stream.clone(), false);
        }
        let stream = Stream::new();
        self.streams.insert(key, stream.clone());
        (stream, true)
    }

    /// Number of keys ever requested.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Tear down: drain every stream for termination by the caller.
    pub fn drain(&mut self) -> Vec<Stream<DomEvent>> {
        self.streams.drain().map(|(_, stream)| stream).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
