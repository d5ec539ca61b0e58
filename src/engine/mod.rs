//! Driver engine - the selector index.
//!
//! The index is the bridge between the declarative side (selector tokens on
//! virtual nodes) and the host side (live node ids): a full token-to-nodes
//! mapping rebuilt from the host tree after every render.

mod registry;

pub use registry::*;
