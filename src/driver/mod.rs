//! The driver - wiring trees in, events out.
//!
//! One driver owns one mount point in a [`Document`]. It consumes a stream
//! of virtual trees and, per tree, runs one atomic pass: patch the host
//! tree, then rebuild the selector index, all before the next event can be
//! delegated. In the other direction it keeps a single root listener per
//! event kind and fans incoming events out to per-selector streams.
//!
//! Lifecycle is linear: `Uninitialized` until the first successful render,
//! `Attached` while live, `Disposed` after teardown (explicit, input stream
//! termination, or a render error). Disposal is terminal.
//!
//! # Example
//!
//! ```ignore
//! use eddy_dom::driver::run_app;
//! use eddy_dom::vnode::{button, div, h1};
//!
//! let handle = run_app(document, mount, |source| {
//!     let clicks = source.select("inc").events("click");
//!     clicks
//!         .fold(0u32, |count, _| count + 1)
//!         .map(|count| div(vec![h1(count.to_string()), button(("inc", "+1"))]))
//! });
//! ```

mod source;

pub use source::*;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use spark_signals::{signal, Signal};

use crate::dom::{Document, DomEvent, ListenerId, NodeId};
use crate::engine::{reindex, SelectorIndex};
use crate::error::DriverError;
use crate::events::{resolve, DelegatedSubscriptions};
use crate::renderer::DomRenderer;
use crate::stream::{Observer, Stream, Subscription};
use crate::vnode::VNode;

// =============================================================================
// State
// =============================================================================

/// Where the driver is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Created, nothing rendered yet. Incoming events are dropped.
    Uninitialized,
    /// At least one tree rendered; delegation is live.
    Attached,
    /// Torn down. Terminal.
    Disposed,
}

pub(crate) struct DriverShared {
    pub(crate) document: Rc<RefCell<Document>>,
    pub(crate) mount: NodeId,
    pub(crate) state: DriverState,
    pub(crate) renderer: DomRenderer,
    pub(crate) index: Rc<SelectorIndex>,
    pub(crate) subscriptions: DelegatedSubscriptions,
    pub(crate) listeners: HashMap<String, ListenerId>,
    pub(crate) last_error: Option<DriverError>,
    pub(crate) last_event: Signal<Option<DomEvent>>,
    pub(crate) render_generation: Signal<u64>,
}

// =============================================================================
// Driver
// =============================================================================

/// A DOM driver bound to a mount element.
///
/// Build one with [`DomDriver::new`], hand its [`DomDriver::source`] to the
/// application, then [`DomDriver::run`] it on the application's tree stream.
/// [`run_app`] does all three in order.
pub struct DomDriver {
    shared: Rc<RefCell<DriverShared>>,
}

impl DomDriver {
    pub fn new(document: Rc<RefCell<Document>>, mount: NodeId) -> Self {
        Self {
            shared: Rc::new(RefCell::new(DriverShared {
                document,
                mount,
                state: DriverState::Uninitialized,
                renderer: DomRenderer::new(),
                index: Rc::new(SelectorIndex::default()),
                subscriptions: DelegatedSubscriptions::new(),
                listeners: HashMap::new(),
                last_error: None,
                last_event: signal(None),
                render_generation: signal(0),
            })),
        }
    }

    /// The event side handed to the application. May be called any number
    /// of times; every source reaches the same driver.
    pub fn source(&self) -> DomSource {
        DomSource::new(self.shared.clone())
    }

    /// Subscribe to the application's tree stream and go live.
    ///
    /// If the stream replays a tree at subscribe time (a [`Stream::of`]
    /// app), the first render happens synchronously inside this call.
    pub fn run(self, vdom: &Stream<VNode>) -> DriverHandle {
        let weak = Rc::downgrade(&self.shared);
        let observer = Observer::new()
            .on_next({
                let weak = weak.clone();
                move |tree: &VNode| {
                    if let Some(shared) = weak.upgrade() {
                        handle_tree(&shared, tree);
                    }
                }
            })
            .on_error({
                let weak = weak.clone();
                move |_message: &str| {
                    if let Some(shared) = weak.upgrade() {
                        dispose_internal(&shared, None);
                    }
                }
            })
            .on_complete(move || {
                if let Some(shared) = weak.upgrade() {
                    dispose_internal(&shared, None);
                }
            });
        let input = vdom.subscribe_observer(observer);
        DriverHandle {
            shared: self.shared,
            // The handle anchors the tree stream; subscriptions hold only
            // weak references.
            _sink: vdom.clone(),
            input: Some(input),
        }
    }
}

/// Create a driver, call `main` with its source, and run the returned tree
/// stream. The cycle-style entry point.
pub fn run_app(
    document: Rc<RefCell<Document>>,
    mount: NodeId,
    main: impl FnOnce(&DomSource) -> Stream<VNode>,
) -> DriverHandle {
    let driver = DomDriver::new(document, mount);
    let source = driver.source();
    let sink = main(&source);
    driver.run(&sink)
}

// =============================================================================
// Handle
// =============================================================================

/// Keeps a running driver alive and allows explicit teardown.
pub struct DriverHandle {
    shared: Rc<RefCell<DriverShared>>,
    _sink: Stream<VNode>,
    input: Option<Subscription>,
}

impl DriverHandle {
    pub fn state(&self) -> DriverState {
        self.shared.borrow().state
    }

    /// The error that disposed the driver, if disposal was error-driven.
    pub fn last_error(&self) -> Option<DriverError> {
        self.shared.borrow().last_error.clone()
    }

    /// Another source for the same driver.
    pub fn source(&self) -> DomSource {
        DomSource::new(self.shared.clone())
    }

    /// Tear the driver down: detach from the tree stream, remove every
    /// root listener, complete every delegated stream.
    pub fn dispose(mut self) {
        if let Some(input) = self.input.take() {
            input.unsubscribe();
        }
        dispose_internal(&self.shared, None);
    }
}

// =============================================================================
// Internals
// =============================================================================

/// One render pass: patch the host tree, swap in a fresh index, bump the
/// generation signal. A render error disposes the driver.
fn handle_tree(shared: &Rc<RefCell<DriverShared>>, tree: &VNode) {
    let result = {
        let mut s = shared.borrow_mut();
        if s.state == DriverState::Disposed {
            return;
        }
        let document = Rc::clone(&s.document);
        let mount = s.mount;
        let mut doc = document.borrow_mut();
        let result = s.renderer.render(&mut doc, mount, tree);
        if result.is_ok() {
            // Index and tree swap together; delegation never sees a new
            // tree through an old index.
            s.index = Rc::new(reindex(&doc, mount));
            s.state = DriverState::Attached;
        }
        result
    };

    match result {
        Ok(()) => {
            let generation = shared.borrow().render_generation.clone();
            generation.set(generation.get() + 1);
        }
        Err(err) => dispose_internal(shared, Some(DriverError::Render(err))),
    }
}

/// Route one host event to the delegated stream its target resolves to.
///
/// Resolution runs against a snapshot of the index, and all borrows are
/// dropped before any subscriber runs: a subscriber may synchronously push
/// a new tree through the driver.
fn dispatch_delegated(shared: &Rc<RefCell<DriverShared>>, event: &DomEvent) {
    let (stream, last_event) = {
        let s = shared.borrow();
        if s.state != DriverState::Attached {
            return;
        }
        let index = Rc::clone(&s.index);
        let doc = s.document.borrow();
        let selector = resolve(&doc, &index, event.target, s.mount);
        let stream = selector.and_then(|selector| s.subscriptions.get(&selector, &event.kind));
        (stream, s.last_event.clone())
    };

    last_event.set(Some(event.clone()));
    if let Some(stream) = stream {
        stream.push(event.clone());
    }
}

/// Attach the root listener for an event kind, once.
pub(crate) fn ensure_listener(shared: &Rc<RefCell<DriverShared>>, kind: &str) {
    {
        let s = shared.borrow();
        if s.state == DriverState::Disposed || s.listeners.contains_key(kind) {
            return;
        }
    }

    let weak = Rc::downgrade(shared);
    let callback: Rc<dyn Fn(&DomEvent)> = Rc::new(move |event| {
        if let Some(shared) = weak.upgrade() {
            dispatch_delegated(&shared, event);
        }
    });

    let document = Rc::clone(&shared.borrow().document);
    let listener = document.borrow_mut().add_listener(kind, callback);
    shared.borrow_mut().listeners.insert(kind.to_string(), listener);
}

/// Teardown, idempotent. Streams terminate with an error when disposal was
/// error-driven, complete otherwise; both run after every borrow is dropped.
fn dispose_internal(shared: &Rc<RefCell<DriverShared>>, error: Option<DriverError>) {
    let (document, listeners, streams, message) = {
        let mut s = shared.borrow_mut();
        if s.state == DriverState::Disposed {
            return;
        }
        s.state = DriverState::Disposed;
        s.index = Rc::new(SelectorIndex::default());
        s.last_error = error.clone();
        let listeners: Vec<ListenerId> = s.listeners.drain().map(|(_, l)| l).collect();
        let streams = s.subscriptions.drain();
        let message = error.map(|e| e.to_string());
        (Rc::clone(&s.document), listeners, streams, message)
    };

    {
        let mut doc = document.borrow_mut();
        for listener in &listeners {
            doc.remove_listener(listener);
        }
    }

    for stream in streams {
        match &message {
            Some(message) => stream.error(message),
            None => stream.complete(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::dom::dispatch_event;
    use crate::error::RenderError;
    use crate::types::OpaqueToken;
    use crate::vnode::{button, div, h, h1, p, section, span};

    fn render_target() -> (Rc<RefCell<Document>>, NodeId) {
        let mut doc = Document::new();
        let mount = doc.create_element("div");
        (Rc::new(RefCell::new(doc)), mount)
    }

    fn counting_subscriber(stream: &Stream<DomEvent>) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let _sub = stream.subscribe(move |_| count_clone.set(count_clone.get() + 1));
        count
    }

    #[test]
    fn test_renders_static_tree() {
        let (doc, mount) = render_target();
        let handle = run_app(doc.clone(), mount, |_source| {
            Stream::of(section(vec![div(vec![h1("Hello world")])]))
        });

        let d = doc.borrow();
        let heading = d.find_by_tag(mount, "h1").unwrap();
        assert_eq!(d.text_content(heading), "Hello world");
        drop(d);
        assert_eq!(handle.state(), DriverState::Attached);
        assert_eq!(handle.last_error(), None);
    }

    #[test]
    fn test_uninitialized_until_first_render() {
        let (doc, mount) = render_target();
        let driver = DomDriver::new(doc.clone(), mount);
        let source = driver.source();

        // Subscribing attaches the root listener even before any render.
        let clicks = source.select("inc").events("click");
        let count = counting_subscriber(&clicks);
        assert_eq!(doc.borrow().listener_count("click"), 1);

        let vdom: Stream<VNode> = Stream::new();
        let handle = driver.run(&vdom);
        assert_eq!(handle.state(), DriverState::Uninitialized);

        // Events before the first render are dropped.
        let stray = doc.borrow_mut().create_element("button");
        dispatch_event(&doc, stray, "click");
        assert_eq!(count.get(), 0);

        vdom.push(div(vec![button(("inc", "go"))]));
        assert_eq!(handle.state(), DriverState::Attached);

        let btn = doc.borrow().find_by_tag(mount, "button").unwrap();
        dispatch_event(&doc, btn, "click");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_counter_click_cycle() {
        let (doc, mount) = render_target();
        let _handle = run_app(doc.clone(), mount, |source| {
            let clicks = source.select("inc").events("click");
            clicks.fold(0u32, |count, _| count + 1).map(|count| {
                div(vec![h1(count.to_string()), button(("inc", "increment"))])
            })
        });

        let heading = doc.borrow().find_by_tag(mount, "h1").unwrap();
        let btn = doc.borrow().find_by_tag(mount, "button").unwrap();
        assert_eq!(doc.borrow().text_content(heading), "0");

        dispatch_event(&doc, btn, "click");
        assert_eq!(doc.borrow().text_content(heading), "1");

        // Re-render preserved both nodes, so the old handles stay valid.
        assert!(doc.borrow().is_alive(btn));
        dispatch_event(&doc, btn, "click");
        dispatch_event(&doc, btn, "click");
        assert_eq!(doc.borrow().text_content(heading), "3");
    }

    #[test]
    fn test_string_selector_aliases_across_nodes() {
        let (doc, mount) = render_target();
        let driver = DomDriver::new(doc.clone(), mount);
        let clicks = driver.source().select("inc").events("click");
        let count = counting_subscriber(&clicks);

        let vdom: Stream<VNode> = Stream::new();
        let _handle = driver.run(&vdom);
        vdom.push(div(vec![button(("inc", "a")), button(("inc", "b"))]));

        let buttons = doc.borrow().find_all_by_tag(mount, "button");
        assert_eq!(buttons.len(), 2);
        dispatch_event(&doc, buttons[0], "click");
        dispatch_event(&doc, buttons[1], "click");
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_opaque_tokens_do_not_collide() {
        let (doc, mount) = render_target();
        let driver = DomDriver::new(doc.clone(), mount);
        let source = driver.source();

        let first = OpaqueToken::new();
        let second = OpaqueToken::new();
        let first_count = counting_subscriber(&source.select(first).events("click"));
        let second_count = counting_subscriber(&source.select(second).events("click"));

        let vdom: Stream<VNode> = Stream::new();
        let _handle = driver.run(&vdom);
        vdom.push(div(vec![button((first, "a")), button((second, "b"))]));

        let buttons = doc.borrow().find_all_by_tag(mount, "button");
        dispatch_event(&doc, buttons[0], "click");
        assert_eq!(first_count.get(), 1);
        assert_eq!(second_count.get(), 0);
    }

    #[test]
    fn test_shared_stream_identity_and_single_listener() {
        let (doc, mount) = render_target();
        let driver = DomDriver::new(doc.clone(), mount);
        let source = driver.source();

        let first = source.select("inc").events("click");
        let second = source.select("inc").events("click");
        let a = counting_subscriber(&first);
        let b = counting_subscriber(&second);

        // Same key, same stream, one native listener.
        assert_eq!(doc.borrow().listener_count("click"), 1);
        assert_eq!(first.observer_count(), 2);

        let vdom: Stream<VNode> = Stream::new();
        let _handle = driver.run(&vdom);
        vdom.push(div(vec![button(("inc", "go"))]));

        let btn = doc.borrow().find_by_tag(mount, "button").unwrap();
        dispatch_event(&doc, btn, "click");
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 1);
    }

    #[test]
    fn test_one_listener_per_event_kind() {
        let (doc, mount) = render_target();
        let driver = DomDriver::new(doc.clone(), mount);
        let source = driver.source();

        let _a = counting_subscriber(&source.select("a").events("click"));
        let _b = counting_subscriber(&source.select("b").events("click"));
        let _c = counting_subscriber(&source.select("a").events("keydown"));

        let d = doc.borrow();
        assert_eq!(d.listener_count("click"), 1);
        assert_eq!(d.listener_count("keydown"), 1);
    }

    #[test]
    fn test_closest_selector_wins() {
        let (doc, mount) = render_target();
        let driver = DomDriver::new(doc.clone(), mount);
        let source = driver.source();
        let outer_count = counting_subscriber(&source.select("outer").events("click"));
        let inner_count = counting_subscriber(&source.select("inner").events("click"));

        let vdom: Stream<VNode> = Stream::new();
        let _handle = driver.run(&vdom);
        vdom.push(section((
            "outer",
            vec![button(("inner", vec![span("label")]))],
        )));

        let label = doc.borrow().find_by_tag(mount, "span").unwrap();
        dispatch_event(&doc, label, "click");
        assert_eq!(inner_count.get(), 1);
        assert_eq!(outer_count.get(), 0);

        let outer = doc.borrow().find_by_tag(mount, "section").unwrap();
        dispatch_event(&doc, outer, "click");
        assert_eq!(outer_count.get(), 1);
    }

    #[test]
    fn test_selector_resolves_across_rerender() {
        let (doc, mount) = render_target();
        let driver = DomDriver::new(doc.clone(), mount);
        let count = counting_subscriber(&driver.source().select("late").events("click"));

        let vdom: Stream<VNode> = Stream::new();
        let _handle = driver.run(&vdom);

        // First tree has no matching node: the event resolves to nothing.
        vdom.push(div(vec![p("empty")]));
        let para = doc.borrow().find_by_tag(mount, "p").unwrap();
        dispatch_event(&doc, para, "click");
        assert_eq!(count.get(), 0);

        // Second tree tags a node; the already-requested stream starts
        // receiving without resubscribing.
        vdom.push(div(vec![p("full"), button(("late", "go"))]));
        let btn = doc.borrow().find_by_tag(mount, "button").unwrap();
        dispatch_event(&doc, btn, "click");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_render_error_disposes_driver() {
        let (doc, mount) = render_target();
        let driver = DomDriver::new(doc.clone(), mount);
        let clicks = driver.source().select("inc").events("click");
        let errored = Rc::new(RefCell::new(String::new()));
        let errored_clone = errored.clone();
        let _sub = clicks.subscribe_observer(
            Observer::new().on_error(move |m| *errored_clone.borrow_mut() = m.to_string()),
        );

        let vdom: Stream<VNode> = Stream::new();
        let handle = driver.run(&vdom);
        vdom.push(div(vec![h1("ok")]));
        assert_eq!(handle.state(), DriverState::Attached);

        vdom.push(h("", ()));
        assert_eq!(handle.state(), DriverState::Disposed);
        assert_eq!(
            handle.last_error(),
            Some(DriverError::Render(RenderError::EmptyTag))
        );
        assert!(!errored.borrow().is_empty());
        assert_eq!(doc.borrow().listener_count("click"), 0);

        // The failed render left the last good tree in place.
        let heading = doc.borrow().find_by_tag(mount, "h1").unwrap();
        assert_eq!(doc.borrow().text_content(heading), "ok");

        // Later trees are ignored once disposed.
        vdom.push(div(vec![h1("ignored")]));
        assert_eq!(doc.borrow().text_content(heading), "ok");
    }

    #[test]
    fn test_dispose_tears_down() {
        let (doc, mount) = render_target();
        let driver = DomDriver::new(doc.clone(), mount);
        let source = driver.source();
        let clicks = source.select("inc").events("click");
        let completed = Rc::new(Cell::new(false));
        let completed_clone = completed.clone();
        let _sub = clicks
            .subscribe_observer(Observer::new().on_complete(move || completed_clone.set(true)));

        let vdom: Stream<VNode> = Stream::new();
        let handle = driver.run(&vdom);
        vdom.push(div(vec![button(("inc", "go"))]));
        assert_eq!(doc.borrow().listener_count("click"), 1);

        handle.dispose();
        assert!(completed.get());
        assert!(clicks.is_terminated());
        assert_eq!(doc.borrow().listener_count("click"), 0);

        // Requests against a disposed driver terminate with an error.
        let late = source.select("other").events("click");
        let late_message = Rc::new(RefCell::new(String::new()));
        let late_clone = late_message.clone();
        let _late = late.subscribe_observer(
            Observer::new().on_error(move |m| *late_clone.borrow_mut() = m.to_string()),
        );
        assert_eq!(*late_message.borrow(), DriverError::Disposed.to_string());
        assert_eq!(doc.borrow().listener_count("click"), 0);
    }

    #[test]
    fn test_generation_and_last_event_signals() {
        let (doc, mount) = render_target();
        let driver = DomDriver::new(doc.clone(), mount);
        let source = driver.source();
        let _count = counting_subscriber(&source.select("inc").events("click"));

        let vdom: Stream<VNode> = Stream::new();
        let _handle = driver.run(&vdom);
        assert_eq!(source.render_generation().get(), 0);
        assert!(source.last_event().get().is_none());

        vdom.push(div(vec![button(("inc", "go"))]));
        assert_eq!(source.render_generation().get(), 1);
        vdom.push(div(vec![button(("inc", "go")), p("x")]));
        assert_eq!(source.render_generation().get(), 2);

        let btn = doc.borrow().find_by_tag(mount, "button").unwrap();
        dispatch_event(&doc, btn, "click");
        let event = source.last_event().get().unwrap();
        assert_eq!(event.kind, "click");
        assert_eq!(event.target, btn);
    }

    #[test]
    fn test_input_completion_disposes() {
        let (doc, mount) = render_target();
        let driver = DomDriver::new(doc.clone(), mount);
        let vdom: Stream<VNode> = Stream::new();
        let handle = driver.run(&vdom);

        vdom.push(div(vec![h1("x")]));
        vdom.complete();
        assert_eq!(handle.state(), DriverState::Disposed);
        assert_eq!(handle.last_error(), None);
        let _ = doc;
    }
}
