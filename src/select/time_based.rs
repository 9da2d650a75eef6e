use super::{random_valid, SelectionContext, Strategy, StrategyState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Decorator around another strategy for time-of-day rotation.
///
/// Delegates selection to the owned inner strategy on the same candidates
/// and context: the caller is expected to have already narrowed candidates
/// to time-appropriate images through the filter chain, so no re-filtering
/// happens here. Without an inner strategy it degrades to uniform random.
pub struct TimeBased {
    pub(super) inner: Option<Box<Strategy>>,
    pub(super) shown_history: Vec<String>,
    /// Unix timestamp of the last tracked apply; cleared to invalidate any
    /// time-bucketed caching done by the caller
    pub(super) cache_timestamp: Option<u64>,
    pub(super) rng: StdRng,
}

impl TimeBased {
    pub fn new(inner: Option<Box<Strategy>>) -> Self {
        Self {
            inner,
            shown_history: Vec::new(),
            cache_timestamp: None,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn select(&mut self, candidates: &[String], ctx: &SelectionContext) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }
        match &mut self.inner {
            Some(inner) => inner.select(candidates, ctx),
            None => random_valid(&mut self.rng, candidates),
        }
    }

    pub fn update_tracking(&mut self, chosen: &str) {
        self.shown_history.push(chosen.to_string());
        self.cache_timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .ok();
        if let Some(inner) = &mut self.inner {
            inner.update_tracking(chosen);
        }
    }

    pub fn reset(&mut self) {
        self.shown_history.clear();
        self.cache_timestamp = None;
        if let Some(inner) = &mut self.inner {
            inner.reset();
        }
    }

    pub fn get_state(&self) -> StrategyState {
        StrategyState::TimeBased {
            shown_history: self.shown_history.clone(),
            cache_timestamp: self.cache_timestamp,
            inner: self.inner.as_ref().map(|s| Box::new(s.get_state())),
        }
    }
}
