//! Error taxonomy
//!
//! Only malformed specs surface as `Err` values. Callback panics and
//! scheduler faults are caught and logged at their call sites so one
//! failure cannot cascade into other animations; unknown-id operations
//! report plain booleans.

use thiserror::Error;

use crate::value::Value;

/// Errors raised while constructing an animation spec.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Start and end must both be scalars, or vectors of the same width.
    #[error("start value {start:?} and end value {end:?} have different shapes")]
    ShapeMismatch { start: Value, end: Value },
}

/// Result type for spec construction.
pub type Result<T> = std::result::Result<T, SpecError>;
