//! Glide Core Primitives
//!
//! This crate provides the foundational types for the Glide animation
//! engine:
//!
//! - **Values**: scalar or fixed-width vector quantities that animations
//!   interpolate (opacity, position, color, ...)
//! - **Errors**: the construction-time error taxonomy
//!
//! # Example
//!
//! ```rust
//! use glide_core::Value;
//!
//! let start = Value::from((1.0, 0.0, 0.0));
//! let end = Value::from((0.0, 0.0, 1.0));
//!
//! // Each component interpolates with the same eased progress
//! let mid = start.lerp(&end, 0.5);
//! assert_eq!(mid, Value::from((0.5, 0.0, 0.5)));
//! ```

pub mod error;
pub mod value;

pub use error::SpecError;
pub use value::Value;
