//! Animation specs
//!
//! A spec is the immutable intent of one interpolation: which `(target,
//! property)` it drives, the start/end values, and its timing. Shape
//! equality between start and end is validated here, once; nothing later
//! in the pipeline coerces values.

use std::fmt;
use std::sync::Arc;

use glide_core::{SpecError, Value};

use crate::easing::Easing;

/// Zero-argument action invoked once when a non-looping animation
/// completes.
pub type CompletionFn = Arc<dyn Fn() + Send + Sync>;

/// Immutable description of one timed interpolation.
#[derive(Clone)]
pub struct AnimationSpec {
    pub target_id: String,
    pub property: String,
    pub start: Value,
    pub end: Value,
    pub duration_ms: u64,
    pub delay_ms: u64,
    pub easing: Easing,
    pub looped: bool,
    /// Extra loops after the first play-through; 0 means loop forever.
    pub loop_count: u32,
    pub on_complete: Option<CompletionFn>,
}

impl AnimationSpec {
    /// Build a spec, validating that start and end share a shape.
    pub fn new(
        target_id: impl Into<String>,
        property: impl Into<String>,
        start: impl Into<Value>,
        end: impl Into<Value>,
        duration_ms: u64,
    ) -> Result<Self, SpecError> {
        let start = start.into();
        let end = end.into();
        if !start.same_shape(&end) {
            return Err(SpecError::ShapeMismatch { start, end });
        }
        Ok(Self {
            target_id: target_id.into(),
            property: property.into(),
            start,
            end,
            duration_ms,
            delay_ms: 0,
            easing: Easing::Linear,
            looped: false,
            loop_count: 0,
            on_complete: None,
        })
    }

    /// Delay before the animation enters its running phase.
    #[must_use]
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Loop the animation; `count = 0` loops forever, `count = N` plays
    /// `N + 1` times in total.
    #[must_use]
    pub fn with_loop(mut self, count: u32) -> Self {
        self.looped = true;
        self.loop_count = count;
        self
    }

    #[must_use]
    pub fn with_on_complete<F>(mut self, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(action));
        self
    }
}

impl fmt::Debug for AnimationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationSpec")
            .field("target_id", &self.target_id)
            .field("property", &self.property)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("duration_ms", &self.duration_ms)
            .field("delay_ms", &self.delay_ms)
            .field("easing", &self.easing)
            .field("looped", &self.looped)
            .field("loop_count", &self.loop_count)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}
