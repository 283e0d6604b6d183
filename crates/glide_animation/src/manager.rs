//! Animation manager and scheduler loop
//!
//! The manager owns the three registries (animations by id, groups by
//! name, value callbacks by `(target, property)`) and the fixed-cadence
//! tick task that advances every running animation. Failure isolation is
//! strict: a panicking callback is caught and logged without disturbing
//! the remaining animations in that tick, and a fault in the tick body
//! itself only costs that one tick.
//!
//! Managers are explicitly constructed and injected; there is no ambient
//! process-wide instance.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use glide_core::{SpecError, Value};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, error};

use crate::animation::{Animation, AnimationState};
use crate::easing::Easing;
use crate::group::AnimationGroup;
use crate::spec::AnimationSpec;

/// Handler for computed values, keyed by `(target, property)`.
pub type UpdateFn = Arc<dyn Fn(&str, &str, &Value) + Send + Sync>;

/// Default scheduler cadence.
pub const DEFAULT_TICK_RATE_HZ: u32 = 60;

struct Registry {
    /// Active animations in insertion order; dispatch follows this order.
    animations: IndexMap<String, Arc<Animation>>,
    groups: FxHashMap<String, Arc<AnimationGroup>>,
    callbacks: FxHashMap<(String, String), UpdateFn>,
}

/// Central registry of active animations plus the scheduling loop.
pub struct AnimationManager {
    registry: Arc<Mutex<Registry>>,
    tick_rate_hz: u32,
    running: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl AnimationManager {
    /// Manager ticking at the default 60 Hz.
    pub fn new() -> Self {
        Self::with_tick_rate(DEFAULT_TICK_RATE_HZ)
    }

    /// Manager with a custom tick rate (clamped to at least 1 Hz).
    pub fn with_tick_rate(tick_rate_hz: u32) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            registry: Arc::new(Mutex::new(Registry {
                animations: IndexMap::new(),
                groups: FxHashMap::default(),
                callbacks: FxHashMap::default(),
            })),
            tick_rate_hz: tick_rate_hz.max(1),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            scheduler: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of animations currently tracked in the registry.
    pub fn animation_count(&self) -> usize {
        self.registry_state().animations.len()
    }

    /// Spawn the scheduler loop onto the current Tokio runtime.
    /// Idempotent while already running.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown_tx.send_replace(false);

        let registry = Arc::clone(&self.registry);
        let running = Arc::clone(&self.running);
        let mut shutdown = self.shutdown_tx.subscribe();
        let tick_rate_hz = self.tick_rate_hz;
        let period = Duration::from_secs_f64(1.0 / f64::from(tick_rate_hz));

        let handle = tokio::spawn(async move {
            debug!(tick_rate_hz, "animation scheduler started");
            while running.load(Ordering::SeqCst) {
                let tick_start = Instant::now();
                if let Err(payload) =
                    panic::catch_unwind(AssertUnwindSafe(|| Self::process_tick(&registry)))
                {
                    error!("scheduler tick fault: {}", panic_message(payload.as_ref()));
                }
                // Overload is not compensated: the next tick starts
                // `period - elapsed` after this one ends, never earlier.
                let idle = period.saturating_sub(tick_start.elapsed());
                tokio::select! {
                    () = sleep(idle) => {}
                    _ = shutdown.wait_for(|s| *s) => break,
                }
            }
            debug!("animation scheduler stopped");
        });

        *self.scheduler_slot() = Some(handle);
    }

    /// Cancel every tracked animation and group, then await the scheduler
    /// loop's clean exit. No callback fires after `stop` resolves.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);

        let (animations, groups) = {
            let mut registry = self.registry_state();
            let animations: Vec<Arc<Animation>> =
                registry.animations.drain(..).map(|(_, a)| a).collect();
            let groups: Vec<Arc<AnimationGroup>> =
                registry.groups.drain().map(|(_, g)| g).collect();
            (animations, groups)
        };
        for animation in &animations {
            animation.cancel();
        }
        for group in &groups {
            group.cancel();
        }

        self.shutdown_tx.send_replace(true);
        let handle = self.scheduler_slot().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Register the value handler for one `(target, property)` pair,
    /// replacing any previous handler for that exact pair.
    pub fn register_callback<F>(&self, target_id: &str, property: &str, callback: F)
    where
        F: Fn(&str, &str, &Value) + Send + Sync + 'static,
    {
        self.registry_state().callbacks.insert(
            (target_id.to_string(), property.to_string()),
            Arc::new(callback),
        );
    }

    /// Drop the handler for a pair; false if none was registered.
    pub fn unregister_callback(&self, target_id: &str, property: &str) -> bool {
        self.registry_state()
            .callbacks
            .remove(&(target_id.to_string(), property.to_string()))
            .is_some()
    }

    /// Register a new animation under `id` without starting it. A reused
    /// id replaces the previous entry.
    pub fn create_animation(&self, id: impl Into<String>, spec: AnimationSpec) -> Arc<Animation> {
        let animation = Arc::new(Animation::new(spec));
        self.registry_state()
            .animations
            .insert(id.into(), Arc::clone(&animation));
        animation
    }

    /// Register and start an animation, generating an id when none is
    /// given. Suspends through the animation's own delay phase; the
    /// scheduler keeps ticking in the meantime.
    pub async fn start_animation(&self, id: Option<String>, spec: AnimationSpec) -> String {
        let id = id.unwrap_or_else(|| self.generate_id("anim"));
        let animation = self.create_animation(id.clone(), spec);
        animation.start().await;
        id
    }

    /// Cancel and deregister; false if the id is not tracked.
    pub fn cancel_animation(&self, id: &str) -> bool {
        let animation = self.registry_state().animations.shift_remove(id);
        match animation {
            Some(animation) => {
                animation.cancel();
                true
            }
            None => false,
        }
    }

    /// Look up a tracked animation by id.
    pub fn animation(&self, id: &str) -> Option<Arc<Animation>> {
        self.registry_state().animations.get(id).cloned()
    }

    /// Register a new empty group under `name`.
    pub fn create_animation_group(&self, name: impl Into<String>) -> Arc<AnimationGroup> {
        let name = name.into();
        let group = Arc::new(AnimationGroup::new(name.clone()));
        self.registry_state().groups.insert(name, Arc::clone(&group));
        group
    }

    /// Start every member of a group; false for an unknown name.
    pub async fn start_animation_group(&self, name: &str) -> bool {
        let group = self.registry_state().groups.get(name).cloned();
        match group {
            Some(group) => {
                group.start().await;
                true
            }
            None => false,
        }
    }

    /// Cancel a group's members and deregister it; false for an unknown
    /// name.
    pub fn cancel_animation_group(&self, name: &str) -> bool {
        let group = self.registry_state().groups.remove(name);
        match group {
            Some(group) => {
                group.cancel();
                true
            }
            None => false,
        }
    }

    /// Look up a tracked group by name.
    pub fn group(&self, name: &str) -> Option<Arc<AnimationGroup>> {
        self.registry_state().groups.get(name).cloned()
    }

    /// Animate the "opacity" property. Linear is the conventional choice.
    pub async fn fade(
        &self,
        target_id: &str,
        start: f64,
        end: f64,
        duration_ms: u64,
        easing: Easing,
    ) -> Result<String, SpecError> {
        let spec = AnimationSpec::new(target_id, "opacity", start, end, duration_ms)?
            .with_easing(easing);
        let id = self.generate_id(&format!("fade_{target_id}"));
        Ok(self.start_animation(Some(id), spec).await)
    }

    /// Animate the "position" property. EaseOut reads best for motion.
    pub async fn move_to(
        &self,
        target_id: &str,
        start: (f64, f64),
        end: (f64, f64),
        duration_ms: u64,
        easing: Easing,
    ) -> Result<String, SpecError> {
        let spec = AnimationSpec::new(target_id, "position", start, end, duration_ms)?
            .with_easing(easing);
        let id = self.generate_id(&format!("move_{target_id}"));
        Ok(self.start_animation(Some(id), spec).await)
    }

    /// Animate the "scale" property.
    pub async fn scale(
        &self,
        target_id: &str,
        start: f64,
        end: f64,
        duration_ms: u64,
        easing: Easing,
    ) -> Result<String, SpecError> {
        let spec =
            AnimationSpec::new(target_id, "scale", start, end, duration_ms)?.with_easing(easing);
        let id = self.generate_id(&format!("scale_{target_id}"));
        Ok(self.start_animation(Some(id), spec).await)
    }

    /// Animate the "color" property across RGB channels.
    pub async fn color(
        &self,
        target_id: &str,
        start: (f64, f64, f64),
        end: (f64, f64, f64),
        duration_ms: u64,
        easing: Easing,
    ) -> Result<String, SpecError> {
        let spec =
            AnimationSpec::new(target_id, "color", start, end, duration_ms)?.with_easing(easing);
        let id = self.generate_id(&format!("color_{target_id}"));
        Ok(self.start_animation(Some(id), spec).await)
    }

    /// Build and start a group whose members play back-to-back.
    ///
    /// Member `k` is delayed by its own delay plus the accumulated
    /// durations, delays and gaps of the members before it, so the group
    /// starts as one unit while its members run in order with `gap_ms`
    /// between them. Returns the group name.
    pub async fn sequence(&self, specs: Vec<AnimationSpec>, gap_ms: u64) -> String {
        let name = format!("sequence_{}", timestamp_nanos());
        let group = self.create_animation_group(name.clone());

        let mut offset_ms = 0u64;
        for spec in specs {
            let own_delay = spec.delay_ms;
            let duration = spec.duration_ms;
            let staged = spec.with_delay(offset_ms + own_delay);
            let animation = self.create_animation(self.generate_id("seq"), staged);
            group.add(animation);
            offset_ms += duration + own_delay + gap_ms;
        }

        self.start_animation_group(&name).await;
        name
    }

    /// One scheduler pass: advance every running animation, dispatch its
    /// value, and retire finished ones after the dispatch pass.
    fn process_tick(registry: &Mutex<Registry>) {
        struct TickItem {
            id: String,
            animation: Arc<Animation>,
            callback: Option<UpdateFn>,
        }

        // Snapshot under the lock; callbacks always run outside it.
        let mut finished: Vec<String> = Vec::new();
        let items: Vec<TickItem> = {
            let registry = registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            registry
                .animations
                .iter()
                .filter_map(|(id, animation)| match animation.state() {
                    AnimationState::Running => {
                        let spec = animation.spec();
                        let key = (spec.target_id.clone(), spec.property.clone());
                        Some(TickItem {
                            id: id.clone(),
                            animation: Arc::clone(animation),
                            callback: registry.callbacks.get(&key).cloned(),
                        })
                    }
                    // Cancelled outside `cancel_animation` (e.g. through a
                    // group); retire without dispatching.
                    AnimationState::Completed | AnimationState::Cancelled => {
                        finished.push(id.clone());
                        None
                    }
                    AnimationState::Pending | AnimationState::Delayed => None,
                })
                .collect()
        };

        for item in items {
            if item.animation.state() != AnimationState::Running {
                // Cancelled since the snapshot; retired on the next tick
                continue;
            }
            let progress = item.animation.progress();
            let value = item.animation.compute_value(progress);
            item.animation.set_current_value(value.clone());

            if let Some(callback) = &item.callback {
                let spec = item.animation.spec();
                let invoked = panic::catch_unwind(AssertUnwindSafe(|| {
                    callback(&spec.target_id, &spec.property, &value);
                }));
                if let Err(payload) = invoked {
                    error!(
                        target_id = %spec.target_id,
                        property = %spec.property,
                        "animation callback panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }

            if progress >= 1.0 {
                if item.animation.should_loop() {
                    item.animation.restart_loop();
                } else if item.animation.mark_completed() {
                    if let Some(on_complete) = item.animation.spec().on_complete.clone() {
                        if let Err(payload) =
                            panic::catch_unwind(AssertUnwindSafe(|| on_complete()))
                        {
                            error!(
                                animation_id = %item.id,
                                "completion action panicked: {}",
                                panic_message(payload.as_ref())
                            );
                        }
                    }
                    debug!(animation_id = %item.id, "animation completed");
                    finished.push(item.id);
                } else {
                    // Lost the race to a cancel; retire without the action
                    finished.push(item.id);
                }
            }
        }

        if !finished.is_empty() {
            let mut registry = registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            for id in &finished {
                // shift_remove keeps insertion order for the survivors
                registry.animations.shift_remove(id);
            }
        }
    }

    fn generate_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}_{n}_{}", timestamp_nanos())
    }

    fn registry_state(&self) -> MutexGuard<'_, Registry> {
        // A tick that panicked mid-pass leaves the registry sound; recover
        // the guard instead of propagating the poison.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn scheduler_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AnimationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AnimationManager {
    fn drop(&mut self) {
        // Dropping without `stop` still tears the loop down
        self.running.store(false, Ordering::SeqCst);
        self.shutdown_tx.send_replace(true);
        if let Some(handle) = self.scheduler_slot().take() {
            handle.abort();
        }
    }
}

fn timestamp_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opacity_spec(duration_ms: u64) -> AnimationSpec {
        AnimationSpec::new("obj", "opacity", 0.0, 1.0, duration_ms).unwrap()
    }

    #[test]
    fn test_tick_rate_floor() {
        assert_eq!(AnimationManager::with_tick_rate(0).tick_rate_hz(), 1);
        assert_eq!(AnimationManager::new().tick_rate_hz(), DEFAULT_TICK_RATE_HZ);
    }

    #[test]
    fn test_create_animation_registers() {
        let manager = AnimationManager::new();
        let animation = manager.create_animation("a", opacity_spec(100));
        assert_eq!(manager.animation_count(), 1);
        assert!(Arc::ptr_eq(&manager.animation("a").unwrap(), &animation));
    }

    #[test]
    fn test_cancel_animation_deregisters() {
        let manager = AnimationManager::new();
        let animation = manager.create_animation("a", opacity_spec(100));
        assert!(manager.cancel_animation("a"));
        assert!(animation.is_complete());
        assert_eq!(manager.animation_count(), 0);
        assert!(!manager.cancel_animation("a"));
    }

    #[test]
    fn test_cancel_unknown_id_mutates_nothing() {
        let manager = AnimationManager::new();
        manager.create_animation("a", opacity_spec(100));
        assert!(!manager.cancel_animation("ghost"));
        assert_eq!(manager.animation_count(), 1);
    }

    #[test]
    fn test_unregister_callback() {
        let manager = AnimationManager::new();
        manager.register_callback("x", "opacity", |_, _, _| {});
        assert!(manager.unregister_callback("x", "opacity"));
        assert!(!manager.unregister_callback("x", "opacity"));
    }

    #[tokio::test]
    async fn test_auto_ids_are_unique() {
        let manager = AnimationManager::new();
        let a = manager.start_animation(None, opacity_spec(100)).await;
        let b = manager.start_animation(None, opacity_spec(100)).await;
        assert_ne!(a, b);
        assert_eq!(manager.animation_count(), 2);
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let manager = AnimationManager::new();
        manager.start();
        manager.start();
        assert!(manager.is_running());
        manager.stop().await;
        assert!(!manager.is_running());
    }

    #[tokio::test]
    async fn test_sequence_derives_delays() {
        let manager = AnimationManager::new();
        let specs = vec![
            AnimationSpec::new("a", "opacity", 0.0, 1.0, 10).unwrap(),
            AnimationSpec::new("b", "opacity", 0.0, 1.0, 20).unwrap(),
            AnimationSpec::new("c", "opacity", 0.0, 1.0, 30).unwrap(),
        ];
        let name = manager.sequence(specs, 5).await;

        let group = manager.group(&name).unwrap();
        let delays: Vec<u64> = group
            .animations()
            .iter()
            .map(|a| a.spec().delay_ms)
            .collect();
        assert_eq!(delays, vec![0, 15, 50]);
    }

    #[tokio::test]
    async fn test_sequence_keeps_own_delays() {
        let manager = AnimationManager::new();
        let specs = vec![
            AnimationSpec::new("a", "opacity", 0.0, 1.0, 10).unwrap(),
            AnimationSpec::new("b", "opacity", 0.0, 1.0, 10)
                .unwrap()
                .with_delay(5),
        ];
        let name = manager.sequence(specs, 0).await;

        let group = manager.group(&name).unwrap();
        let delays: Vec<u64> = group
            .animations()
            .iter()
            .map(|a| a.spec().delay_ms)
            .collect();
        // Member 1 keeps its own 5 ms on top of member 0's duration
        assert_eq!(delays, vec![0, 15]);
    }
}
