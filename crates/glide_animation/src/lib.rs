//! Glide Animation Engine
//!
//! Time-driven property animations: many concurrently active, independently
//! timed interpolations advanced by one fixed-cadence scheduler.
//!
//! # Features
//!
//! - **Easing curves**: linear, quadratic, sine, bounce, elastic, back
//!   (overshoot curves intentionally leave [0, 1])
//! - **Per-animation state machine**: pending → delayed → running →
//!   completed, with cooperative cancellation from any non-terminal state
//! - **Groups and sequences**: coordinated start/cancel, back-to-back
//!   playback from derived delays
//! - **Failure isolation**: a panicking value or completion callback is
//!   caught and logged; other animations and the scheduler keep going
//!
//! # Example
//!
//! ```rust,no_run
//! use glide_animation::{AnimationManager, Easing};
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = AnimationManager::new();
//!     manager.start();
//!
//!     manager.register_callback("logo", "opacity", |target, property, value| {
//!         println!("{target}.{property} = {value:?}");
//!     });
//!
//!     manager
//!         .fade("logo", 0.0, 1.0, 500, Easing::EaseOut)
//!         .await
//!         .expect("scalar fade spec is well-formed");
//!
//!     manager.stop().await;
//! }
//! ```

pub mod animation;
pub mod easing;
pub mod group;
pub mod manager;
pub mod spec;

pub use animation::{Animation, AnimationState};
pub use easing::Easing;
pub use group::AnimationGroup;
pub use manager::{AnimationManager, UpdateFn, DEFAULT_TICK_RATE_HZ};
pub use spec::{AnimationSpec, CompletionFn};

pub use glide_core::{SpecError, Value};
