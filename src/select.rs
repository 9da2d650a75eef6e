//! Wallpaper selection strategies
//!
//! Each strategy picks one image from an already-filtered candidate list and
//! keeps cross-call memory (recently shown, unused pool, shuffle queue). The
//! variant set is small and fixed, so dispatch is a closed enum rather than
//! trait objects. Candidates are canonical path strings (see
//! `utils::canonical_key`).

use chrono::NaiveTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::metadata::Classification;

mod pure;
mod sequential;
mod smart;
mod time_based;

pub use pure::PureRandom;
pub use sequential::SequentialShuffle;
pub use smart::{SmartRandom, DEFAULT_AVOID_PERCENTAGE};
pub use time_based::TimeBased;

/// Which base selection algorithm to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RandomMode {
    #[default]
    Smart,
    Pure,
    Sequential,
}

impl RandomMode {
    /// Parse a mode name (case insensitive), for CLI input
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "smart" => Some(RandomMode::Smart),
            "pure" => Some(RandomMode::Pure),
            "sequential" => Some(RandomMode::Sequential),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RandomMode::Smart => "Smart random",
            RandomMode::Pure => "Pure random",
            RandomMode::Sequential => "Sequential shuffle",
        }
    }
}

/// Per-call read-only context threaded through filters and strategy.
/// Constructed fresh for every selection request, never persisted.
#[derive(Debug, Clone, Default)]
pub struct SelectionContext {
    pub now: NaiveTime,
    /// Canonical key of the currently applied wallpaper, if known
    pub current: Option<String>,
    pub time_based_enabled: bool,
    pub filter_recent: bool,
    /// Recent set sourced from the active strategy, for the recency filter
    pub recent: Vec<String>,
    /// Luminosity restriction; `None` means "all"
    pub luminosity_filter: Option<Classification>,
}

/// A candidate is valid only while its backing file still exists. Invalid
/// candidates are dropped silently and selection retries with the rest.
pub(crate) fn is_valid(key: &str) -> bool {
    Path::new(key).is_file()
}

/// Serialized strategy state, written to the cache dir so selection memory
/// survives restarts. The time-based decorator nests its inner state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyState {
    Pure {
        #[serde(default)]
        shown_history: Vec<String>,
    },
    Smart {
        #[serde(default)]
        unused: Vec<String>,
        #[serde(default)]
        recent: Vec<String>,
        #[serde(default)]
        shown_history: Vec<String>,
        #[serde(default)]
        cycle: Vec<String>,
    },
    Sequential {
        #[serde(default)]
        shuffled_queue: Vec<String>,
        #[serde(default)]
        current_cycle: Vec<String>,
        #[serde(default)]
        shown_history: Vec<String>,
    },
    TimeBased {
        #[serde(default)]
        shown_history: Vec<String>,
        #[serde(default)]
        cache_timestamp: Option<u64>,
        #[serde(default)]
        inner: Option<Box<StrategyState>>,
    },
}

impl StrategyState {
    /// Applies recorded by the outermost strategy layer
    pub fn shown_count(&self) -> usize {
        match self {
            StrategyState::Pure { shown_history }
            | StrategyState::Smart { shown_history, .. }
            | StrategyState::Sequential { shown_history, .. }
            | StrategyState::TimeBased { shown_history, .. } => shown_history.len(),
        }
    }
}

/// Pluggable selection algorithm with persistent cross-call memory
pub enum Strategy {
    Pure(PureRandom),
    Smart(SmartRandom),
    Sequential(SequentialShuffle),
    TimeBased(TimeBased),
}

impl Strategy {
    /// Build the base strategy for a random mode
    pub fn for_mode(mode: RandomMode, avoid_recent_percentage: u32) -> Self {
        match mode {
            RandomMode::Pure => Strategy::Pure(PureRandom::new()),
            RandomMode::Smart => Strategy::Smart(SmartRandom::new(avoid_recent_percentage)),
            RandomMode::Sequential => Strategy::Sequential(SequentialShuffle::new()),
        }
    }

    /// Wrap a base strategy in the time-based decorator
    pub fn time_based(inner: Strategy) -> Self {
        Strategy::TimeBased(TimeBased::new(Some(Box::new(inner))))
    }

    /// Seed every nested RNG, for reproducible selection in tests
    pub fn seed(&mut self, seed: u64) {
        match self {
            Strategy::Pure(s) => s.rng = StdRng::seed_from_u64(seed),
            Strategy::Smart(s) => s.rng = StdRng::seed_from_u64(seed),
            Strategy::Sequential(s) => s.rng = StdRng::seed_from_u64(seed),
            Strategy::TimeBased(s) => {
                s.rng = StdRng::seed_from_u64(seed);
                if let Some(inner) = &mut s.inner {
                    inner.seed(seed.wrapping_add(1));
                }
            }
        }
    }

    pub fn select(&mut self, candidates: &[String], ctx: &SelectionContext) -> Option<String> {
        match self {
            Strategy::Pure(s) => s.select(candidates, ctx),
            Strategy::Smart(s) => s.select(candidates, ctx),
            Strategy::Sequential(s) => s.select(candidates, ctx),
            Strategy::TimeBased(s) => s.select(candidates, ctx),
        }
    }

    /// Called exactly once, after the chosen wallpaper was successfully
    /// applied. A failed apply must leave strategy state untouched.
    pub fn update_tracking(&mut self, chosen: &str) {
        match self {
            Strategy::Pure(s) => s.update_tracking(chosen),
            Strategy::Smart(s) => s.update_tracking(chosen),
            Strategy::Sequential(s) => s.update_tracking(chosen),
            Strategy::TimeBased(s) => s.update_tracking(chosen),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Strategy::Pure(s) => s.reset(),
            Strategy::Smart(s) => s.reset(),
            Strategy::Sequential(s) => s.reset(),
            Strategy::TimeBased(s) => s.reset(),
        }
    }

    pub fn get_state(&self) -> StrategyState {
        match self {
            Strategy::Pure(s) => s.get_state(),
            Strategy::Smart(s) => s.get_state(),
            Strategy::Sequential(s) => s.get_state(),
            Strategy::TimeBased(s) => s.get_state(),
        }
    }

    /// Restore persisted state. A state saved for a different strategy kind
    /// is ignored; the strategy just starts fresh.
    pub fn restore_state(&mut self, state: StrategyState) {
        match (self, state) {
            (Strategy::Pure(s), StrategyState::Pure { shown_history }) => {
                s.shown_history = shown_history;
            }
            (
                Strategy::Smart(s),
                StrategyState::Smart {
                    unused,
                    recent,
                    shown_history,
                    cycle,
                },
            ) => {
                s.unused = unused;
                s.recent = recent.into();
                s.shown_history = shown_history;
                s.cycle = cycle;
            }
            (
                Strategy::Sequential(s),
                StrategyState::Sequential {
                    shuffled_queue,
                    current_cycle,
                    shown_history,
                },
            ) => {
                s.shuffled_queue = shuffled_queue.into();
                s.current_cycle = current_cycle;
                s.shown_history = shown_history;
            }
            (
                Strategy::TimeBased(s),
                StrategyState::TimeBased {
                    shown_history,
                    cache_timestamp,
                    inner,
                },
            ) => {
                s.shown_history = shown_history;
                s.cache_timestamp = cache_timestamp;
                if let (Some(inner_strategy), Some(inner_state)) = (&mut s.inner, inner) {
                    inner_strategy.restore_state(*inner_state);
                }
            }
            (this, _) => this.reset(),
        }
    }

    /// Recent set for the recency filter, where the strategy keeps one
    pub fn recent(&self) -> Vec<String> {
        match self {
            Strategy::Smart(s) => s.recent.iter().cloned().collect(),
            Strategy::TimeBased(s) => s.inner.as_deref().map(Strategy::recent).unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Whether the recency filter should run for this strategy
    pub fn wants_recency_filter(&self) -> bool {
        match self {
            Strategy::Smart(_) => true,
            Strategy::TimeBased(s) => s
                .inner
                .as_deref()
                .map(Strategy::wants_recency_filter)
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Strategy::Pure(_) => "pure random",
            Strategy::Smart(_) => "smart random",
            Strategy::Sequential(_) => "sequential shuffle",
            Strategy::TimeBased(_) => "time-based",
        }
    }
}

/// Default location of the persisted strategy state
pub fn state_path() -> PathBuf {
    directories::ProjectDirs::from("com", "mrmattias", "driftwall")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/driftwall"))
        .join("strategy_state.json")
}

/// Load persisted strategy state; missing or corrupt files start fresh
pub fn load_state(path: &Path) -> Option<StrategyState> {
    let data = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&data) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse strategy state, starting fresh");
            None
        }
    }
}

/// Persist strategy state; failures are logged and swallowed
pub fn save_state(path: &Path, state: &StrategyState) {
    let write = || -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(state)?)?;
        Ok(())
    };
    if let Err(e) = write() {
        warn!(path = %path.display(), error = %e, "failed to save strategy state");
    }
}

/// Uniform random pick over the valid members of `candidates`
pub(crate) fn random_valid(rng: &mut StdRng, candidates: &[String]) -> Option<String> {
    let pool: Vec<&String> = candidates.iter().filter(|c| is_valid(c)).collect();
    if pool.is_empty() {
        return None;
    }
    Some(pool[rng.gen_range(0..pool.len())].clone())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Create `n` empty image files and return their canonical keys
    pub fn touch_candidates(dir: &TempDir, n: usize) -> Vec<String> {
        (0..n)
            .map(|i| {
                let path = dir.path().join(format!("wp{i:02}.png"));
                fs::write(&path, b"x").unwrap();
                crate::utils::canonical_key(&path)
            })
            .collect()
    }

    pub fn remove(key: &str) {
        fs::remove_file(Path::new(key)).unwrap();
    }
}
