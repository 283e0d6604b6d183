//! Animation groups
//!
//! A named, ordered collection of animations started and cancelled as a
//! unit. Sequences are groups whose member delays are derived by the
//! manager.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::animation::Animation;

/// Ordered collection of animations with coordinated start/cancel.
pub struct AnimationGroup {
    name: String,
    animations: Mutex<Vec<Arc<Animation>>>,
    running: AtomicBool,
}

impl AnimationGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            animations: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append an animation; call before the group is started.
    pub fn add(&self, animation: Arc<Animation>) {
        self.members().push(animation);
    }

    /// Fan out `start` over every member and join: returns once all of
    /// them have entered their running phase (or were cancelled).
    pub async fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        let members = self.members().clone();
        let mut handles = Vec::with_capacity(members.len());
        for animation in members {
            handles.push(tokio::spawn(async move { animation.start().await }));
        }
        for handle in handles {
            // A member whose startup task failed is left to its own state
            let _ = handle.await;
        }
    }

    /// Cancel every member; idempotent.
    pub fn cancel(&self) {
        self.running.store(false, Ordering::SeqCst);
        for animation in self.members().iter() {
            animation.cancel();
        }
    }

    /// True once every member reports complete (or cancelled).
    pub fn is_complete(&self) -> bool {
        self.members().iter().all(|a| a.is_complete())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.members().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members().is_empty()
    }

    /// Snapshot of the member list, in insertion order.
    pub fn animations(&self) -> Vec<Arc<Animation>> {
        self.members().clone()
    }

    fn members(&self) -> MutexGuard<'_, Vec<Arc<Animation>>> {
        self.animations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationState;
    use crate::spec::AnimationSpec;

    fn animation(duration_ms: u64) -> Arc<Animation> {
        let spec = AnimationSpec::new("obj", "opacity", 0.0, 1.0, duration_ms).unwrap();
        Arc::new(Animation::new(spec))
    }

    #[tokio::test]
    async fn test_start_joins_all_members() {
        let group = AnimationGroup::new("g");
        let a = animation(100);
        let b = animation(100);
        group.add(Arc::clone(&a));
        group.add(Arc::clone(&b));

        group.start().await;
        assert!(group.is_running());
        assert_eq!(a.state(), AnimationState::Running);
        assert_eq!(b.state(), AnimationState::Running);
    }

    #[tokio::test]
    async fn test_cancel_reaches_every_member() {
        let group = AnimationGroup::new("g");
        let a = animation(100);
        let b = animation(100);
        group.add(Arc::clone(&a));
        group.add(Arc::clone(&b));
        group.start().await;

        group.cancel();
        assert!(!group.is_running());
        assert_eq!(a.state(), AnimationState::Cancelled);
        assert_eq!(b.state(), AnimationState::Cancelled);
        assert!(group.is_complete());
    }

    #[test]
    fn test_incomplete_until_members_finish() {
        let group = AnimationGroup::new("g");
        group.add(animation(100));
        assert!(!group.is_complete());
    }

    #[test]
    fn test_ordered_membership() {
        let group = AnimationGroup::new("g");
        group.add(animation(1));
        group.add(animation(2));
        group.add(animation(3));
        let durations: Vec<u64> = group
            .animations()
            .iter()
            .map(|a| a.spec().duration_ms)
            .collect();
        assert_eq!(durations, vec![1, 2, 3]);
    }
}
