//! a reference replay-detection set. callers feeding
//! [`crate::envelope::EnvelopeEngine::verify_and_open`] a `has_been_seen`
//! closure backed by this are protected against redelivery of the same
//! inbound envelope; production deployments likely back this with a
//! database instead of an in-memory set.

use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
pub struct ReplaySet {
    seen: Mutex<HashSet<String>>,
}

impl ReplaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// records `key_id` as seen and reports whether it was already present
    pub fn observe(&self, key_id: &str) -> bool {
        let mut seen = self.seen.lock().expect("replay set mutex poisoned");
        !seen.insert(key_id.to_string())
    }

    pub fn has_been_seen(&self, key_id: &str) -> bool {
        self.seen.lock().expect("replay set mutex poisoned").contains(key_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_is_not_a_replay() {
        let set = ReplaySet::new();
        assert!(!set.observe("a"));
    }

    #[test]
    fn second_observation_is_a_replay() {
        let set = ReplaySet::new();
        assert!(!set.observe("a"));
        assert!(set.observe("a"));
    }
}
