use super::{is_valid, SelectionContext, StrategyState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashSet, VecDeque};

/// Recency-avoiding random selection.
///
/// Keeps an `unused` pool (candidates not yet shown this cycle) and a bounded
/// `recent` FIFO sized from the candidate count. No repeat happens within a
/// window proportional to collection size, and every image is eventually
/// shown: images leave `unused` only when shown and the pool refills only
/// once exhausted. Refill is deferred to the next `select` call so
/// `update_tracking` stays side-effect-minimal.
pub struct SmartRandom {
    avoid_percentage: u32,
    pub(super) unused: Vec<String>,
    pub(super) recent: VecDeque<String>,
    pub(super) shown_history: Vec<String>,
    /// Candidate snapshot `unused` was last populated from, for staleness detection
    pub(super) cycle: Vec<String>,
    max_recent: usize,
    pub(super) rng: StdRng,
}

pub const DEFAULT_AVOID_PERCENTAGE: u32 = 25;

impl SmartRandom {
    pub fn new(avoid_percentage: u32) -> Self {
        Self {
            avoid_percentage,
            unused: Vec::new(),
            recent: VecDeque::new(),
            shown_history: Vec::new(),
            cycle: Vec::new(),
            max_recent: 0,
            rng: StdRng::from_entropy(),
        }
    }

    fn same_set(a: &[String], b: &[String]) -> bool {
        let a: HashSet<&str> = a.iter().map(String::as_str).collect();
        let b: HashSet<&str> = b.iter().map(String::as_str).collect();
        a == b
    }

    pub fn select(&mut self, candidates: &[String], ctx: &SelectionContext) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }

        // Repopulate the unused pool when exhausted or when the candidate set
        // changed since it was built. Skip the currently applied wallpaper so
        // the refill can't immediately re-select it.
        if self.unused.is_empty() || !Self::same_set(&self.cycle, candidates) {
            self.unused = candidates.to_vec();
            self.cycle = candidates.to_vec();
            if let Some(current) = &ctx.current {
                self.unused.retain(|c| c != current);
            }
        }

        self.max_recent = Self::recent_cap(candidates.len(), self.avoid_percentage);

        let recent: HashSet<&str> = self.recent.iter().map(String::as_str).collect();
        let mut available: Vec<String> = self
            .unused
            .iter()
            .filter(|c| !recent.contains(c.as_str()))
            .cloned()
            .collect();

        // Fallback ladder: unused minus recent -> unused -> everything but current
        if available.is_empty() {
            available = self.unused.clone();
        }
        if available.is_empty() {
            available = candidates
                .iter()
                .filter(|c| Some(*c) != ctx.current.as_ref())
                .cloned()
                .collect();
        }

        while !available.is_empty() {
            let idx = self.rng.gen_range(0..available.len());
            let chosen = available.swap_remove(idx);
            if is_valid(&chosen) {
                return Some(chosen);
            }
            // Stale file: drop it from the pool and retry with the rest
            self.unused.retain(|c| c != &chosen);
        }
        None
    }

    pub fn update_tracking(&mut self, chosen: &str) {
        self.unused.retain(|c| c != chosen);

        self.recent.retain(|c| c != chosen);
        self.recent.push_back(chosen.to_string());
        while self.recent.len() > self.max_recent.max(1) {
            self.recent.pop_front();
        }

        self.shown_history.push(chosen.to_string());
    }

    pub fn reset(&mut self) {
        self.unused.clear();
        self.recent.clear();
        self.shown_history.clear();
        self.cycle.clear();
        self.max_recent = 0;
    }

    pub fn get_state(&self) -> StrategyState {
        StrategyState::Smart {
            unused: self.unused.clone(),
            recent: self.recent.iter().cloned().collect(),
            shown_history: self.shown_history.clone(),
            cycle: self.cycle.clone(),
        }
    }

    /// `max(1, floor(N * p / 100))`
    fn recent_cap(candidate_count: usize, avoid_percentage: u32) -> usize {
        ((candidate_count * avoid_percentage as usize) / 100).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{remove, touch_candidates};
    use super::*;
    use tempfile::TempDir;

    fn seeded(avoid: u32, seed: u64) -> SmartRandom {
        let mut strategy = SmartRandom::new(avoid);
        strategy.rng = StdRng::seed_from_u64(seed);
        strategy
    }

    #[test]
    fn test_recent_cap() {
        assert_eq!(SmartRandom::recent_cap(4, 50), 2);
        assert_eq!(SmartRandom::recent_cap(10, 25), 2);
        assert_eq!(SmartRandom::recent_cap(3, 10), 1); // floor(0.3) clamped to 1
        assert_eq!(SmartRandom::recent_cap(0, 25), 1);
    }

    #[test]
    fn test_never_repeats_within_window() {
        let dir = TempDir::new().unwrap();
        let candidates = touch_candidates(&dir, 10);
        let mut strategy = seeded(25, 42);
        let ctx = SelectionContext::default();

        // max_recent = 2; any two consecutive picks within the window differ
        let mut picks = Vec::new();
        for _ in 0..2 {
            let chosen = strategy.select(&candidates, &ctx).unwrap();
            strategy.update_tracking(&chosen);
            picks.push(chosen);
        }
        assert_ne!(picks[0], picks[1]);
    }

    #[test]
    fn test_window_of_two_with_four_candidates() {
        // candidates = [A,B,C,D], avoid 50% => max_recent = 2: no pick may
        // equal either of the previous two picks
        let dir = TempDir::new().unwrap();
        let candidates = touch_candidates(&dir, 4);
        let mut strategy = seeded(50, 7);
        let ctx = SelectionContext::default();

        let mut picks: Vec<String> = Vec::new();
        for _ in 0..12 {
            let chosen = strategy.select(&candidates, &ctx).unwrap();
            if let Some(prev) = picks.last() {
                assert_ne!(&chosen, prev);
            }
            if picks.len() >= 2 {
                assert_ne!(Some(&chosen), picks.get(picks.len() - 2));
            }
            strategy.update_tracking(&chosen);
            picks.push(chosen);
        }
    }

    #[test]
    fn test_cycles_through_everything() {
        let dir = TempDir::new().unwrap();
        let candidates = touch_candidates(&dir, 6);
        let mut strategy = seeded(25, 3);
        let ctx = SelectionContext::default();

        let mut seen = std::collections::HashSet::new();
        for _ in 0..6 {
            let chosen = strategy.select(&candidates, &ctx).unwrap();
            strategy.update_tracking(&chosen);
            seen.insert(chosen);
        }
        assert_eq!(seen.len(), 6, "one full cycle visits every candidate");
    }

    #[test]
    fn test_avoids_current_wallpaper_on_refill() {
        let dir = TempDir::new().unwrap();
        let candidates = touch_candidates(&dir, 3);
        let mut strategy = seeded(25, 11);
        let ctx = SelectionContext {
            current: Some(candidates[0].clone()),
            ..Default::default()
        };

        for _ in 0..10 {
            let chosen = strategy.select(&candidates, &ctx).unwrap();
            assert_ne!(chosen, candidates[0]);
            strategy.update_tracking(&chosen);
        }
    }

    #[test]
    fn test_single_candidate_equal_to_current_returns_none() {
        let dir = TempDir::new().unwrap();
        let candidates = touch_candidates(&dir, 1);
        let mut strategy = seeded(25, 1);
        let ctx = SelectionContext {
            current: Some(candidates[0].clone()),
            ..Default::default()
        };
        assert_eq!(strategy.select(&candidates, &ctx), None);
    }

    #[test]
    fn test_candidate_set_change_rebuilds_pool() {
        let dir = TempDir::new().unwrap();
        let candidates = touch_candidates(&dir, 3);
        let mut strategy = seeded(25, 5);
        let ctx = SelectionContext::default();

        let chosen = strategy.select(&candidates, &ctx).unwrap();
        strategy.update_tracking(&chosen);

        let grown = touch_candidates(&dir, 5);
        let chosen = strategy.select(&grown, &ctx).unwrap();
        assert!(grown.contains(&chosen));
        // Pool was rebuilt from the new set (minus nothing: no current in ctx)
        assert_eq!(strategy.cycle.len(), 5);
    }

    #[test]
    fn test_deleted_file_dropped_and_retried() {
        let dir = TempDir::new().unwrap();
        let candidates = touch_candidates(&dir, 3);
        remove(&candidates[1]);

        let mut strategy = seeded(25, 9);
        let ctx = SelectionContext::default();
        for _ in 0..6 {
            let chosen = strategy.select(&candidates, &ctx).unwrap();
            assert_ne!(chosen, candidates[1]);
            strategy.update_tracking(&chosen);
        }
    }

    #[test]
    fn test_state_round_trip_reproduces_selection() {
        let dir = TempDir::new().unwrap();
        let candidates = touch_candidates(&dir, 8);
        let ctx = SelectionContext::default();

        let mut original = seeded(25, 21);
        for _ in 0..3 {
            let chosen = original.select(&candidates, &ctx).unwrap();
            original.update_tracking(&chosen);
        }

        let mut restored = SmartRandom::new(25);
        if let StrategyState::Smart {
            unused,
            recent,
            shown_history,
            cycle,
        } = original.get_state()
        {
            restored.unused = unused;
            restored.recent = recent.into();
            restored.shown_history = shown_history;
            restored.cycle = cycle;
        } else {
            unreachable!();
        }

        original.rng = StdRng::seed_from_u64(99);
        restored.rng = StdRng::seed_from_u64(99);
        for _ in 0..4 {
            let a = original.select(&candidates, &ctx);
            let b = restored.select(&candidates, &ctx);
            assert_eq!(a, b);
            original.update_tracking(a.as_ref().unwrap());
            restored.update_tracking(b.as_ref().unwrap());
        }
    }
}
