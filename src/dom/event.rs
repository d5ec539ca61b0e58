//! Host events - what the native layer delivers to root listeners.
//!
//! Listeners live at the document root, never on individual nodes; an event
//! records its target and the delegation walk does the rest. Dispatch
//! snapshots the listener list and drops every borrow before invoking
//! callbacks, so a listener may mutate the document (re-render) or the
//! listener table re-entrantly.

use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;

use super::{Document, NodeId};

bitflags! {
    /// Modifier keys held while an event fired.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

/// One host event, as handed to root listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    /// Event kind, e.g. `"click"`.
    pub kind: String,
    /// The node the event originated on.
    pub target: NodeId,
    /// Modifier keys held at dispatch time.
    pub modifiers: Modifiers,
}

/// Handle for removing a root listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerId {
    pub(crate) kind: String,
    pub(crate) id: usize,
}

/// Deliver an event on `target` to every root listener for its kind.
///
/// Free function over the shared document so no document borrow is held
/// while listeners run.
pub fn dispatch_event(document: &Rc<RefCell<Document>>, target: NodeId, kind: &str) {
    dispatch_event_with(document, target, kind, Modifiers::empty());
}

/// Like [`dispatch_event`], with explicit modifier keys.
pub fn dispatch_event_with(
    document: &Rc<RefCell<Document>>,
    target: NodeId,
    kind: &str,
    modifiers: Modifiers,
) {
    let listeners = document.borrow().listeners_for(kind);
    let event = DomEvent {
        kind: kind.to_string(),
        target,
        modifiers,
    };
    for listener in listeners {
        listener(&event);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn setup() -> (Rc<RefCell<Document>>, NodeId) {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        (Rc::new(RefCell::new(doc)), root)
    }

    #[test]
    fn test_dispatch_reaches_listeners_of_kind() {
        let (doc, root) = setup();
        let clicks = Rc::new(Cell::new(0));

        let clicks_clone = clicks.clone();
        doc.borrow_mut().add_listener(
            "click",
            Rc::new(move |event| {
                assert_eq!(event.kind, "click");
                clicks_clone.set(clicks_clone.get() + 1);
            }),
        );

        dispatch_event(&doc, root, "click");
        dispatch_event(&doc, root, "keydown");
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_remove_listener() {
        let (doc, root) = setup();
        let count = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        let listener = doc
            .borrow_mut()
            .add_listener("click", Rc::new(move |_| count_clone.set(count_clone.get() + 1)));

        dispatch_event(&doc, root, "click");
        doc.borrow_mut().remove_listener(&listener);
        dispatch_event(&doc, root, "click");

        assert_eq!(count.get(), 1);
        assert_eq!(doc.borrow().listener_count("click"), 0);
    }

    #[test]
    fn test_listener_may_mutate_document() {
        let (doc, root) = setup();

        let doc_clone = doc.clone();
        doc.borrow_mut().add_listener(
            "click",
            Rc::new(move |event| {
                // Re-entrant mutation must not deadlock the RefCell.
                let mut d = doc_clone.borrow_mut();
                let span = d.create_element("span");
                d.append_child(event.target, span);
            }),
        );

        dispatch_event(&doc, root, "click");
        assert_eq!(doc.borrow().children(root).len(), 1);
    }

    #[test]
    fn test_modifiers() {
        let (doc, root) = setup();
        let seen = Rc::new(Cell::new(Modifiers::empty()));

        let seen_clone = seen.clone();
        doc.borrow_mut()
            .add_listener("click", Rc::new(move |event| seen_clone.set(event.modifiers)));

        dispatch_event_with(&doc, root, "click", Modifiers::CTRL | Modifiers::SHIFT);
        assert!(seen.get().contains(Modifiers::CTRL));
        assert!(seen.get().contains(Modifiers::SHIFT));
        assert!(!seen.get().contains(Modifiers::ALT));
    }
}
