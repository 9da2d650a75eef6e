use super::{is_valid, SelectionContext, StrategyState};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{HashSet, VecDeque};

/// Sequential walk through a shuffled queue: every candidate is shown exactly
/// once per cycle before any repeat. At cycle boundaries a single anti-repeat
/// rotation keeps the new cycle from opening with the image just shown.
pub struct SequentialShuffle {
    pub(super) shuffled_queue: VecDeque<String>,
    /// Candidate snapshot the queue was built from, to detect staleness
    pub(super) current_cycle: Vec<String>,
    pub(super) shown_history: Vec<String>,
    pub(super) rng: StdRng,
}

impl Default for SequentialShuffle {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialShuffle {
    pub fn new() -> Self {
        Self {
            shuffled_queue: VecDeque::new(),
            current_cycle: Vec::new(),
            shown_history: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    fn same_set(a: &[String], b: &[String]) -> bool {
        let a: HashSet<&str> = a.iter().map(String::as_str).collect();
        let b: HashSet<&str> = b.iter().map(String::as_str).collect();
        a == b
    }

    fn reshuffle(&mut self, candidates: &[String]) {
        let mut fresh = candidates.to_vec();
        fresh.shuffle(&mut self.rng);
        self.shuffled_queue = fresh.into();
        self.current_cycle = candidates.to_vec();
    }

    /// Move the queue front to the back when it equals `avoid`
    fn rotate_front_away_from(&mut self, avoid: &str) {
        if self.shuffled_queue.len() > 1 && self.shuffled_queue.front().map(String::as_str) == Some(avoid) {
            if let Some(front) = self.shuffled_queue.pop_front() {
                self.shuffled_queue.push_back(front);
            }
        }
    }

    pub fn select(&mut self, candidates: &[String], ctx: &SelectionContext) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }

        // Candidate set changed: the queue is stale, rebuild the cycle
        if !Self::same_set(&self.current_cycle, candidates) {
            self.reshuffle(candidates);
            if let Some(current) = &ctx.current {
                self.rotate_front_away_from(current);
            }
        }

        // Cycle exhausted: reshuffle, avoiding an immediate repeat of the
        // last shown image across the cycle boundary
        if self.shuffled_queue.is_empty() {
            self.reshuffle(candidates);
            if let Some(last_shown) = self.shown_history.last().cloned() {
                self.rotate_front_away_from(&last_shown);
            }
        }

        // Peek without popping; discard entries whose file went away
        while let Some(front) = self.shuffled_queue.front() {
            if is_valid(front) {
                return Some(front.clone());
            }
            self.shuffled_queue.pop_front();
        }
        None
    }

    pub fn update_tracking(&mut self, chosen: &str) {
        // Pop-front in the common case; retain covers out-of-order applies
        if self.shuffled_queue.front().map(String::as_str) == Some(chosen) {
            self.shuffled_queue.pop_front();
        } else {
            self.shuffled_queue.retain(|c| c != chosen);
        }
        self.shown_history.push(chosen.to_string());
    }

    pub fn reset(&mut self) {
        self.shuffled_queue.clear();
        self.current_cycle.clear();
        self.shown_history.clear();
    }

    pub fn get_state(&self) -> StrategyState {
        StrategyState::Sequential {
            shuffled_queue: self.shuffled_queue.iter().cloned().collect(),
            current_cycle: self.current_cycle.clone(),
            shown_history: self.shown_history.clone(),
        }
    }
}
