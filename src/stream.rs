//! Push streams - single producer, multicast fan-out.
//!
//! A [`Stream`] is a handle to a shared core; cloning the handle preserves
//! identity, so every consumer of the same stream shares one underlying
//! production. Producers push values with [`Stream::push`]; consumers attach
//! with [`Stream::subscribe`] and detach through the returned [`Subscription`].
//!
//! Two hooks give streams their lifecycle semantics:
//!
//! - a *setup* closure ([`Stream::on_first_subscribe`]) runs at most once,
//!   when the first consumer attaches - the first subscriber pays the setup
//!   cost, later subscribers share it;
//! - a *replay* closure runs for each new consumer, which is how
//!   [`Stream::of`] and [`Stream::fold`] hand the current value to
//!   late subscribers.
//!
//! # Example
//!
//! ```ignore
//! use eddy_dom::stream::Stream;
//!
//! let clicks: Stream<u32> = Stream::new();
//! let total = clicks.fold(0u32, |acc, n| acc + n);
//! let sub = total.subscribe(|sum| println!("total: {sum}"));
//! clicks.push(3);
//! sub.unsubscribe();
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

// =============================================================================
// Observer
// =============================================================================

/// Callbacks for one consumer of a stream.
///
/// `next` fires per value, `error` on failure termination, `complete` on
/// normal termination. All optional.
pub struct Observer<T> {
    next: Option<Rc<dyn Fn(&T)>>,
    error: Option<Rc<dyn Fn(&str)>>,
    complete: Option<Rc<dyn Fn()>>,
}

impl<T> Observer<T> {
    /// Create an observer with no callbacks.
    pub fn new() -> Self {
        Self {
            next: None,
            error: None,
            complete: None,
        }
    }

    /// Set the value callback.
    pub fn on_next(mut self, f: impl Fn(&T) + 'static) -> Self {
        self.next = Some(Rc::new(f));
        self
    }

    /// Set the error callback.
    pub fn on_error(mut self, f: impl Fn(&str) + 'static) -> Self {
        self.error = Some(Rc::new(f));
        self
    }

    /// Set the completion callback.
    pub fn on_complete(mut self, f: impl Fn() + 'static) -> Self {
        self.complete = Some(Rc::new(f));
        self
    }
}

impl<T> Default for Observer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            next: self.next.clone(),
            error: self.error.clone(),
            complete: self.complete.clone(),
        }
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Handle for detaching one consumer from a stream.
///
/// Detaching is explicit: dropping a `Subscription` without calling
/// [`Subscription::unsubscribe`] leaves the consumer attached, the same way a
/// cleanup closure that is never invoked leaves its handler registered.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel (terminated streams).
    fn inert() -> Self {
        Self { cancel: None }
    }

    /// Detach the consumer. Idempotent by construction.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

// =============================================================================
// Stream
// =============================================================================

/// How a stream ended. Kept so subscribers arriving after the fact get the
/// matching terminal callback.
#[derive(Clone)]
enum Termination {
    Completed,
    Failed(String),
}

struct Core<T> {
    observers: Vec<(usize, Observer<T>)>,
    next_id: usize,
    setup: Option<Box<dyn FnOnce()>>,
    replay: Option<Rc<dyn Fn(&Observer<T>)>>,
    terminated: Option<Termination>,
}

impl<T> Core<T> {
    fn new() -> Self {
        Self {
            observers: Vec::new(),
            next_id: 0,
            setup: None,
            replay: None,
            terminated: None,
        }
    }
}

/// A multicast push stream.
///
/// Clones share the same core: subscribing through any clone attaches to the
/// same production, and every live consumer observes values in the same
/// relative order.
pub struct Stream<T> {
    core: Rc<RefCell<Core<T>>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: 'static> Stream<T> {
    /// Create a hot stream. Values arrive via [`Stream::push`].
    pub fn new() -> Self {
        Self {
            core: Rc::new(RefCell::new(Core::new())),
        }
    }

    /// A stream that never emits and never terminates.
    pub fn never() -> Self {
        Self::new()
    }

    /// A stream that hands `value` to every subscriber at subscribe time.
    pub fn of(value: T) -> Self
    where
        T: Clone,
    {
        let stream = Self::new();
        stream.core.borrow_mut().replay = Some(Rc::new(move |observer: &Observer<T>| {
            if let Some(next) = &observer.next {
                next(&value);
            }
        }));
        stream
    }

    /// Install a producer hook that runs when the first consumer attaches.
    ///
    /// Runs at most once for the lifetime of the stream, after the consumer
    /// is registered, so values produced synchronously by the hook reach it.
    pub fn on_first_subscribe(&self, f: impl FnOnce() + 'static) {
        self.core.borrow_mut().setup = Some(Box::new(f));
    }

    fn set_replay(&self, f: impl Fn(&Observer<T>) + 'static) {
        self.core.borrow_mut().replay = Some(Rc::new(f));
    }

    /// Attach a value-only consumer.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        self.subscribe_observer(Observer::new().on_next(f))
    }

    /// Attach a consumer with full observer callbacks.
    ///
    /// Subscribing to an already terminated stream signals the terminal
    /// callback immediately, with the original error message if it failed.
    pub fn subscribe_observer(&self, observer: Observer<T>) -> Subscription {
        let termination = self.core.borrow().terminated.clone();
        if let Some(termination) = termination {
            match termination {
                Termination::Completed => {
                    if let Some(complete) = observer.complete.clone() {
                        complete();
                    }
                }
                Termination::Failed(message) => {
                    if let Some(error) = observer.error.clone() {
                        error(&message);
                    }
                }
            }
            return Subscription::inert();
        }

        let (id, replay, setup) = {
            let mut core = self.core.borrow_mut();
            let id = core.next_id;
            core.next_id += 1;
            core.observers.push((id, observer.clone()));
            (id, core.replay.clone(), core.setup.take())
        };

        // Replay before setup: a fold hands out its current accumulator
        // first, then the upstream attach may deliver newer values.
        if let Some(replay) = replay {
            replay(&observer);
        }
        if let Some(setup) = setup {
            setup();
        }

        let core = Rc::downgrade(&self.core);
        Subscription::new(move || {
            if let Some(core) = core.upgrade() {
                core.borrow_mut().observers.retain(|(oid, _)| *oid != id);
            }
        })
    }

    /// Push a value to every live consumer.
    ///
    /// The consumer list is snapshotted before any callback runs, so a
    /// consumer may subscribe or unsubscribe re-entrantly without affecting
    /// the in-flight delivery.
    pub fn push(&self, value: T) {
        let nexts: Vec<Rc<dyn Fn(&T)>> = {
            let core = self.core.borrow();
            if core.terminated.is_some() {
                return;
            }
            core.observers
                .iter()
                .filter_map(|(_, observer)| observer.next.clone())
                .collect()
        };
        for next in nexts {
            next(&value);
        }
    }

    /// Terminate the stream with an error. Further pushes are ignored.
    pub fn error(&self, message: &str) {
        let errors: Vec<Rc<dyn Fn(&str)>> = {
            let mut core = self.core.borrow_mut();
            if core.terminated.is_some() {
                return;
            }
            core.terminated = Some(Termination::Failed(message.to_string()));
            let errors = core
                .observers
                .iter()
                .filter_map(|(_, observer)| observer.error.clone())
                .collect();
            core.observers.clear();
            errors
        };
        for error in errors {
            error(message);
        }
    }

    /// Terminate the stream normally. Further pushes are ignored.
    pub fn complete(&self) {
        let completes: Vec<Rc<dyn Fn()>> = {
            let mut core = self.core.borrow_mut();
            if core.terminated.is_some() {
                return;
            }
            core.terminated = Some(Termination::Completed);
            let completes = core
                .observers
                .iter()
                .filter_map(|(_, observer)| observer.complete.clone())
                .collect();
            core.observers.clear();
            completes
        };
        for complete in completes {
            complete();
        }
    }

    /// Whether the stream has terminated (error or completion).
    pub fn is_terminated(&self) -> bool {
        self.core.borrow().terminated.is_some()
    }

    /// Number of currently attached consumers.
    pub fn observer_count(&self) -> usize {
        self.core.borrow().observers.len()
    }

    /// Derive a stream that applies `f` to each value.
    ///
    /// Lazy: the upstream subscription happens when the derived stream gets
    /// its first consumer. From then on the upstream observer keeps the
    /// derived stream alive, so a chain anchored at its source outlives the
    /// local handles it was built from. Termination propagates downstream.
    pub fn map<U: 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Stream<U> {
        let out = Stream::new();
        let source = self.clone();
        // The setup hook must not hold the stream it lives in, or an
        // unsubscribed stream could never be dropped.
        let weak = Rc::downgrade(&out.core);
        out.core.borrow_mut().setup = Some(Box::new(move || {
            let Some(core) = weak.upgrade() else { return };
            let out = Stream { core };
            let forward = Observer::new()
                .on_next({
                    let out = out.clone();
                    move |value: &T| out.push(f(value))
                })
                .on_error({
                    let out = out.clone();
                    move |message: &str| out.error(message)
                })
                .on_complete(move || out.complete());
            let _ = source.subscribe_observer(forward);
        }));
        out
    }

    /// Derive an accumulating stream.
    ///
    /// Emits the current accumulator to each new consumer (the seed, at
    /// first), then one update per upstream value. Like `map`, the upstream
    /// subscription is deferred to the first consumer.
    pub fn fold<A: Clone + 'static>(&self, seed: A, f: impl Fn(&A, &T) -> A + 'static) -> Stream<A> {
        let out = Stream::new();
        let acc = Rc::new(RefCell::new(seed));

        out.set_replay({
            let acc = acc.clone();
            move |observer: &Observer<A>| {
                if let Some(next) = &observer.next {
                    let current = acc.borrow().clone();
                    next(&current);
                }
            }
        });

        let source = self.clone();
        let weak = Rc::downgrade(&out.core);
        out.core.borrow_mut().setup = Some(Box::new(move || {
            let Some(core) = weak.upgrade() else { return };
            let out = Stream { core };
            let forward = Observer::new()
                .on_next({
                    let out = out.clone();
                    move |value: &T| {
                        let updated = f(&acc.borrow(), value);
                        *acc.borrow_mut() = updated.clone();
                        out.push(updated);
                    }
                })
                .on_error({
                    let out = out.clone();
                    move |message: &str| out.error(message)
                })
                .on_complete(move || out.complete());
            let _ = source.subscribe_observer(forward);
        }));
        out
    }
}

impl<T: 'static> Default for Stream<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
