//! Error taxonomy for the driver.
//!
//! Only conditions that terminate a driver instance are errors. Recoverable
//! situations (a selector with no matching node, an empty tree) are
//! represented as absent behavior, never as errors.

use thiserror::Error;

/// Failures while converging the host document to a virtual tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// An element node carried an empty tag name.
    #[error("element has an empty tag name")]
    EmptyTag,

    /// Component expansion recursed past the supported depth.
    #[error("component expansion exceeded {0} levels")]
    ComponentDepthExceeded(usize),
}

/// Failures surfaced to the application as stream termination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The renderer rejected a virtual tree. Halts the driver instance;
    /// rendering resumes only with a fresh driver.
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    /// An operation was attempted on a disposed driver.
    #[error("driver already disposed")]
    Disposed,
}
