//! Session score and best record
//!
//! The best is read from the store once per mount and only changes at the
//! Dead transition, and only when the session beat it.

use serde::Serialize;

use crate::persistence::BestStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreTracker {
    score: u32,
    best: u32,
}

impl ScoreTracker {
    pub fn new(best: u32) -> Self {
        Self { score: 0, best }
    }

    /// Read the persisted best; a failed read counts as "no record"
    pub fn load(store: &dyn BestStore, game_id: &str) -> Self {
        match store.get(game_id) {
            Ok(best) => {
                log::info!("Loaded {} best: {}", game_id, best);
                Self::new(best)
            }
            Err(e) => {
                log::warn!("No {} best available ({}), starting from 0", game_id, e);
                Self::new(0)
            }
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    /// Add one point, returns the new score
    pub fn increment(&mut self) -> u32 {
        self.score = self.score.saturating_add(1);
        self.score
    }

    /// New session
    pub fn reset(&mut self) {
        self.score = 0;
    }

    /// Close the session: adopt the score as best iff it is strictly higher
    pub fn finalize(&mut self) -> bool {
        if self.score > self.best {
            self.best = self.score;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use proptest::prelude::*;

    #[test]
    fn test_strict_improvement() {
        let mut tracker = ScoreTracker::new(3);
        for _ in 0..3 {
            tracker.increment();
        }
        // Tie doesn't count
        assert!(!tracker.finalize());
        assert_eq!(tracker.best(), 3);

        tracker.increment();
        assert!(tracker.finalize());
        assert_eq!(tracker.best(), 4);
    }

    #[test]
    fn test_load_failure_defaults_to_zero() {
        let store = MemoryStore::failing_reads();
        let tracker = ScoreTracker::load(&store, "flappy");
        assert_eq!(tracker.best(), 0);
    }

    #[test]
    fn test_load_existing() {
        let mut store = MemoryStore::new();
        store.set("snake", 12).unwrap();
        assert_eq!(ScoreTracker::load(&store, "snake").best(), 12);
    }

    proptest! {
        #[test]
        fn prop_score_and_best_never_decrease(
            points in proptest::collection::vec(0u32..20, 1..12),
        ) {
            let mut tracker = ScoreTracker::new(0);
            let mut last_best = 0;
            for n in points {
                tracker.reset();
                let mut last_score = 0;
                for _ in 0..n {
                    let s = tracker.increment();
                    prop_assert!(s > last_score);
                    last_score = s;
                }
                let improved = tracker.finalize();
                prop_assert_eq!(improved, n > last_best);
                prop_assert!(tracker.best() >= last_best);
                last_best = tracker.best();
            }
        }
    }
}
