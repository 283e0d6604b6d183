//! A single animation instance and its state machine
//!
//! Lifecycle: `Pending` → `Delayed` (when a delay is set) → `Running` →
//! `Completed`, with `Cancelled` reachable from any non-terminal state.
//! Terminal states are immutable and the instance is never reused.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use glide_core::Value;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use crate::spec::AnimationSpec;

/// State of an animation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationState {
    Pending,
    Delayed,
    Running,
    Completed,
    Cancelled,
}

struct RunState {
    state: AnimationState,
    started_at: Option<Instant>,
    current_loop: u32,
    current_value: Value,
}

/// One timed interpolation instance.
///
/// The spec is immutable; runtime state lives behind a mutex because the
/// scheduler tick and the task driving `start` touch it concurrently.
pub struct Animation {
    spec: AnimationSpec,
    run: Mutex<RunState>,
    cancel_tx: watch::Sender<bool>,
}

impl Animation {
    pub fn new(spec: AnimationSpec) -> Self {
        let current_value = spec.start.clone();
        let (cancel_tx, _) = watch::channel(false);
        Self {
            spec,
            run: Mutex::new(RunState {
                state: AnimationState::Pending,
                started_at: None,
                current_loop: 0,
                current_value,
            }),
            cancel_tx,
        }
    }

    pub fn spec(&self) -> &AnimationSpec {
        &self.spec
    }

    /// Begin the delay/run lifecycle.
    ///
    /// Suspends the calling task through the delay phase; the scheduler
    /// tick is never blocked by it. No-op when already started or in a
    /// terminal state. Cancellation during the delay wakes the sleep and
    /// leaves the animation `Cancelled`.
    pub async fn start(&self) {
        {
            let mut run = self.run_state();
            if run.state != AnimationState::Pending {
                return;
            }
            if self.spec.delay_ms > 0 {
                run.state = AnimationState::Delayed;
            }
        }

        if self.spec.delay_ms > 0 {
            let mut cancelled = self.cancel_tx.subscribe();
            tokio::select! {
                () = sleep(Duration::from_millis(self.spec.delay_ms)) => {}
                _ = cancelled.wait_for(|c| *c) => return,
            }
        }

        let mut run = self.run_state();
        if run.state == AnimationState::Cancelled {
            return;
        }
        run.state = AnimationState::Running;
        run.started_at = Some(Instant::now());
    }

    /// Normalized elapsed time in [0, 1]; 0 unless running.
    ///
    /// A zero-duration animation reports 1.0 on its first evaluation.
    pub fn progress(&self) -> f64 {
        let run = self.run_state();
        if run.state != AnimationState::Running {
            return 0.0;
        }
        let Some(started_at) = run.started_at else {
            return 0.0;
        };
        if self.spec.duration_ms == 0 {
            return 1.0;
        }
        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        (elapsed_ms / self.spec.duration_ms as f64).min(1.0)
    }

    /// Interpolated value for a progress sample. Eased progress is not
    /// clamped, so overshoot curves produce values outside [start, end].
    pub fn compute_value(&self, progress: f64) -> Value {
        let eased = self.spec.easing.apply(progress);
        self.spec.start.lerp(&self.spec.end, eased)
    }

    /// Whether a finished play-through should restart instead of
    /// completing. `loop_count = 0` loops forever; `loop_count = N`
    /// allows N restarts, i.e. N + 1 full play-throughs.
    pub fn should_loop(&self) -> bool {
        if !self.spec.looped {
            return false;
        }
        if self.spec.loop_count == 0 {
            return true;
        }
        self.run_state().current_loop < self.spec.loop_count
    }

    /// Restart timing from now. Overshoot past progress 1.0 is not
    /// carried into the next cycle.
    pub(crate) fn restart_loop(&self) {
        let mut run = self.run_state();
        run.started_at = Some(Instant::now());
        run.current_loop += 1;
    }

    /// Transition Running → Completed; false when a concurrent cancel won
    /// the race, so the caller skips the completion action.
    pub(crate) fn mark_completed(&self) -> bool {
        let mut run = self.run_state();
        if run.state == AnimationState::Running {
            run.state = AnimationState::Completed;
            true
        } else {
            false
        }
    }

    pub(crate) fn set_current_value(&self, value: Value) {
        self.run_state().current_value = value;
    }

    /// Cancel from any non-terminal state; idempotent. Wakes an in-flight
    /// delay sleep.
    pub fn cancel(&self) {
        {
            let mut run = self.run_state();
            if matches!(
                run.state,
                AnimationState::Completed | AnimationState::Cancelled
            ) {
                return;
            }
            run.state = AnimationState::Cancelled;
        }
        // send_replace stores the value even with no receiver in flight
        self.cancel_tx.send_replace(true);
    }

    pub fn is_complete(&self) -> bool {
        matches!(
            self.state(),
            AnimationState::Completed | AnimationState::Cancelled
        )
    }

    pub fn state(&self) -> AnimationState {
        self.run_state().state
    }

    /// Last value computed by the scheduler; mirrors the start value until
    /// the first tick.
    pub fn current_value(&self) -> Value {
        self.run_state().current_value.clone()
    }

    pub fn current_loop(&self) -> u32 {
        self.run_state().current_loop
    }

    fn run_state(&self) -> MutexGuard<'_, RunState> {
        // A tick that panicked mid-update leaves the state usable; recover
        // the guard instead of propagating the poison.
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;

    fn spec(duration_ms: u64) -> AnimationSpec {
        AnimationSpec::new("obj", "opacity", 0.0, 1.0, duration_ms).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let anim = Animation::new(spec(100));
        assert_eq!(anim.state(), AnimationState::Pending);
        assert_eq!(anim.progress(), 0.0);
        assert_eq!(anim.current_value(), Value::Scalar(0.0));
    }

    #[tokio::test]
    async fn test_start_enters_running() {
        let anim = Animation::new(spec(100));
        anim.start().await;
        assert_eq!(anim.state(), AnimationState::Running);
    }

    #[tokio::test]
    async fn test_zero_duration_progress_is_one() {
        let anim = Animation::new(spec(0));
        anim.start().await;
        assert_eq!(anim.progress(), 1.0);
    }

    #[test]
    fn test_progress_zero_unless_running() {
        let anim = Animation::new(spec(100));
        assert_eq!(anim.progress(), 0.0);
        anim.cancel();
        assert_eq!(anim.progress(), 0.0);
    }

    #[test]
    fn test_compute_value_endpoints() {
        let anim = Animation::new(spec(100));
        assert_eq!(anim.compute_value(0.0), Value::Scalar(0.0));
        assert_eq!(anim.compute_value(1.0), Value::Scalar(1.0));
    }

    #[test]
    fn test_compute_value_applies_easing() {
        let spec = AnimationSpec::new("obj", "opacity", 0.0, 1.0, 100)
            .unwrap()
            .with_easing(Easing::EaseIn);
        let anim = Animation::new(spec);
        assert_eq!(anim.compute_value(0.5), Value::Scalar(0.25));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let anim = Animation::new(spec(100));
        anim.cancel();
        assert_eq!(anim.state(), AnimationState::Cancelled);
        anim.cancel();
        assert_eq!(anim.state(), AnimationState::Cancelled);
        assert!(anim.is_complete());
    }

    #[tokio::test]
    async fn test_start_after_cancel_is_noop() {
        let anim = Animation::new(spec(100));
        anim.cancel();
        anim.start().await;
        assert_eq!(anim.state(), AnimationState::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_during_delay() {
        let spec = spec(100).with_delay(60_000);
        let anim = std::sync::Arc::new(Animation::new(spec));

        let task = {
            let anim = std::sync::Arc::clone(&anim);
            tokio::spawn(async move { anim.start().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(anim.state(), AnimationState::Delayed);

        anim.cancel();
        task.await.unwrap();
        assert_eq!(anim.state(), AnimationState::Cancelled);
    }

    #[test]
    fn test_loop_counting() {
        let spec = spec(100).with_loop(2);
        let anim = Animation::new(spec);
        assert!(anim.should_loop());
        anim.restart_loop();
        assert!(anim.should_loop());
        anim.restart_loop();
        // Two restarts consumed: third play-through is the last
        assert!(!anim.should_loop());
        assert_eq!(anim.current_loop(), 2);
    }

    #[test]
    fn test_infinite_loop_never_exhausts() {
        let spec = spec(100).with_loop(0);
        let anim = Animation::new(spec);
        for _ in 0..100 {
            assert!(anim.should_loop());
            anim.restart_loop();
        }
    }

    #[test]
    fn test_not_looped_by_default() {
        let anim = Animation::new(spec(100));
        assert!(!anim.should_loop());
    }
}
