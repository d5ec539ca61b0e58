//! The query side of the driver.
//!
//! [`DomSource::select`] scopes a query to one selector token;
//! [`SelectorSource::events`] turns that scope into the shared stream of
//! matching events. Both are cheap handles; all state lives in the driver.

use std::rc::Rc;

use spark_signals::Signal;

use super::{ensure_listener, DriverShared, DriverState};
use crate::dom::DomEvent;
use crate::error::DriverError;
use crate::stream::Stream;
use crate::types::Selector;
use std::cell::RefCell;

/// The application-facing event source of one driver.
pub struct DomSource {
    shared: Rc<RefCell<DriverShared>>,
}

impl Clone for DomSource {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl DomSource {
    pub(crate) fn new(shared: Rc<RefCell<DriverShared>>) -> Self {
        Self { shared }
    }

    /// Scope to one selector token. Valid before any node carries the
    /// token - the returned scope resolves against whatever tree is
    /// current when events arrive.
    pub fn select(&self, selector: impl Into<Selector>) -> SelectorSource {
        SelectorSource {
            shared: self.shared.clone(),
            selector: selector.into(),
        }
    }

    /// Signal holding the most recently delegated event.
    pub fn last_event(&self) -> Signal<Option<DomEvent>> {
        self.shared.borrow().last_event.clone()
    }

    /// Signal counting completed render passes.
    pub fn render_generation(&self) -> Signal<u64> {
        self.shared.borrow().render_generation.clone()
    }
}

/// A [`DomSource`] narrowed to one selector token.
pub struct SelectorSource {
    shared: Rc<RefCell<DriverShared>>,
    selector: Selector,
}

impl SelectorSource {
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// The stream of events of `kind` whose target resolves to this
    /// selector.
    ///
    /// Repeated calls with the same kind return the same stream. The root
    /// listener for the kind is attached when the stream gets its first
    /// consumer, not here. On a disposed driver the result is a stream
    /// already terminated with [`DriverError::Disposed`].
    pub fn events(&self, kind: &str) -> Stream<DomEvent> {
        let (stream, created) = {
            let mut s = self.shared.borrow_mut();
            if s.state == DriverState::Disposed {
                let dead: Stream<DomEvent> = Stream::new();
                dead.error(&DriverError::Disposed.to_string());
                return dead;
            }
            s.subscriptions.get_or_create(self.selector.clone(), kind)
        };

        if created {
            let weak = Rc::downgrade(&self.shared);
            let kind = kind.to_string();
            stream.on_first_subscribe(move || {
                if let Some(shared) = weak.upgrade() {
                    ensure_listener(&shared, &kind);
                }
            });
        }
        stream
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::driver::DomDriver;
    use crate::types::OpaqueToken;

    fn driver() -> DomDriver {
        let mut doc = Document::new();
        let mount = doc.create_element("div");
        DomDriver::new(Rc::new(RefCell::new(doc)), mount)
    }

    #[test]
    fn test_select_keeps_the_token() {
        let driver = driver();
        let source = driver.source();
        assert_eq!(source.select("inc").selector(), &Selector::from("inc"));

        let token = OpaqueToken::new();
        assert_eq!(
            source.select(token).selector(),
            &Selector::Token(token)
        );
    }

    #[test]
    fn test_events_share_identity_per_kind() {
        let driver = driver();
        let source = driver.source();
        let scope = source.select("inc");

        let first = scope.events("click");
        let second = scope.events("click");
        let _sub = first.subscribe(|_| {});
        assert_eq!(second.observer_count(), 1);

        let other = scope.events("keydown");
        assert_eq!(other.observer_count(), 0);
    }

    #[test]
    fn test_events_on_disposed_driver_error() {
        let driver = driver();
        let source = driver.source();
        let vdom: Stream<crate::vnode::VNode> = Stream::new();
        let handle = driver.run(&vdom);
        handle.dispose();

        let stream = source.select("inc").events("click");
        assert!(stream.is_terminated());

        let message = Rc::new(RefCell::new(String::new()));
        let message_clone = message.clone();
        let _sub = stream.subscribe_observer(
            crate::stream::Observer::new()
                .on_error(move |m| *message_clone.borrow_mut() = m.to_string()),
        );
        assert_eq!(*message.borrow(), DriverError::Disposed.to_string());
    }

    #[test]
    fn test_listener_deferred_to_first_consumer() {
        let mut doc = Document::new();
        let mount = doc.create_element("div");
        let doc = Rc::new(RefCell::new(doc));
        let driver = DomDriver::new(doc.clone(), mount);

        let clicks = driver.source().select("inc").events("click");
        assert_eq!(doc.borrow().listener_count("click"), 0);

        let _sub = clicks.subscribe(|_| {});
        assert_eq!(doc.borrow().listener_count("click"), 1);
    }
}
