//! Renderer - converges the host document to a virtual tree.
//!
//! External collaborator from the driver's point of view: the driver only
//! relies on the contract that node identity is preserved for unchanged
//! subtrees, so selector-index entries stay valid across renders.

mod diff;

pub use diff::*;
