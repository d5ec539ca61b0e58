//! # eddy-dom
//!
//! Reactive DOM driver with selector-based event delegation.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! the reactive state surface and on push streams for the event plumbing.
//!
//! ## Architecture
//!
//! An application is a function from an event source to a stream of virtual
//! trees. The driver closes the loop:
//!
//! ```text
//! tree stream → DomRenderer (diff patch) → reindex → delegated event streams
//! ```
//!
//! Every render pass is atomic: the host tree and the selector index swap
//! together, so event delegation always resolves against the tree that is
//! actually mounted. Events use no per-node listeners at all - one root
//! listener per event kind, resolved through the index, closest tagged
//! ancestor wins.
//!
//! ## Modules
//!
//! - [`types`] - Selector tokens (string and opaque)
//! - [`vnode`] - Virtual tree model and hyperscript builders
//! - [`dom`] - Host document, events, root listeners
//! - [`renderer`] - Differential tree patcher
//! - [`engine`] - Selector index, rebuilt per render
//! - [`events`] - Delegation walk and per-selector streams
//! - [`stream`] - Multicast push streams
//! - [`driver`] - Driver lifecycle and the cycle-style entry point

pub mod dom;
pub mod driver;
pub mod engine;
pub mod error;
pub mod events;
pub mod renderer;
pub mod stream;
pub mod types;
pub mod vnode;

// Re-export commonly used items
pub use types::{OpaqueToken, Selector};

pub use vnode::{component, h, Component, ElementNode, Props, VNode};

pub use dom::{dispatch_event, dispatch_event_with, Document, DomEvent, ListenerId, Modifiers, NodeId};

pub use renderer::DomRenderer;

pub use engine::{reindex, SelectorIndex};

pub use events::DelegatedSubscriptions;

pub use stream::{Observer, Stream, Subscription};

pub use error::{DriverError, RenderError};

pub use driver::{run_app, DomDriver, DomSource, DriverHandle, DriverState, SelectorSource};
