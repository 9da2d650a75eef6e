use super::{random_valid, SelectionContext};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Uniform random selection with no avoidance. The only memory is a
/// shown-history log; selection itself is stateless.
pub struct PureRandom {
    pub(super) shown_history: Vec<String>,
    pub(super) rng: StdRng,
}

impl Default for PureRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl PureRandom {
    pub fn new() -> Self {
        Self {
            shown_history: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn select(&mut self, candidates: &[String], _ctx: &SelectionContext) -> Option<String> {
        random_valid(&mut self.rng, candidates)
    }

    pub fn update_tracking(&mut self, chosen: &str) {
        self.shown_history.push(chosen.to_string());
    }

    pub fn reset(&mut self) {
        self.shown_history.clear();
    }

    pub fn get_state(&self) -> super::StrategyState {
        super::StrategyState::Pure {
            shown_history: self.shown_history.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::touch_candidates;
    use super::*;
    use rand::SeedableRng;
    use tempfile::TempDir;

    #[test]
    fn test_empty_candidates_returns_none() {
        let mut strategy = PureRandom::new();
        assert_eq!(strategy.select(&[], &SelectionContext::default()), None);
    }

    #[test]
    fn test_selects_from_candidates() {
        let dir = TempDir::new().unwrap();
        let candidates = touch_candidates(&dir, 5);
        let mut strategy = PureRandom::new();

        let chosen = strategy.select(&candidates, &SelectionContext::default());
        assert!(candidates.contains(&chosen.unwrap()));
    }

    #[test]
    fn test_invalid_candidates_dropped_silently() {
        let dir = TempDir::new().unwrap();
        let mut candidates = touch_candidates(&dir, 2);
        candidates.push("/nonexistent/wp.png".to_string());

        let mut strategy = PureRandom::new();
        for _ in 0..20 {
            let chosen = strategy
                .select(&candidates, &SelectionContext::default())
                .unwrap();
            assert_ne!(chosen, "/nonexistent/wp.png");
        }
    }

    #[test]
    fn test_all_invalid_returns_none() {
        let candidates = vec!["/gone/a.png".to_string(), "/gone/b.png".to_string()];
        let mut strategy = PureRandom::new();
        assert_eq!(strategy.select(&candidates, &SelectionContext::default()), None);
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let dir = TempDir::new().unwrap();
        let candidates = touch_candidates(&dir, 10);

        let mut a = PureRandom::new();
        a.rng = StdRng::seed_from_u64(7);
        let mut b = PureRandom::new();
        b.rng = StdRng::seed_from_u64(7);

        for _ in 0..10 {
            assert_eq!(
                a.select(&candidates, &SelectionContext::default()),
                b.select(&candidates, &SelectionContext::default())
            );
        }
    }

    #[test]
    fn test_tracking_appends_history() {
        let mut strategy = PureRandom::new();
        strategy.update_tracking("/w/a.png");
        strategy.update_tracking("/w/a.png");
        assert_eq!(strategy.shown_history.len(), 2);

        strategy.reset();
        assert!(strategy.shown_history.is_empty());
    }
}
