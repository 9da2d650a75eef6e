use crate::config::Config;
use crate::filter::FilterChain;
use crate::metadata::MetadataStore;
use crate::select::{self, SelectionContext, Strategy};
use crate::shell;
use crate::utils;
use anyhow::{Context, Result};
use chrono::{Local, NaiveTime};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// What a rotation pass did
#[derive(Debug)]
pub struct RotationOutcome {
    pub chosen: String,
    pub candidates: usize,
    pub after_filters: usize,
    pub applied: bool,
}

/// List candidate images in a directory as sorted canonical keys
pub fn list_candidates(dir: &Path, recursive: bool) -> Result<Vec<String>> {
    let paths: Vec<PathBuf> = if recursive {
        WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.path().to_path_buf())
            .filter(|p| p.is_file() && utils::is_image_file(p))
            .collect()
    } else {
        fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file() && utils::is_image_file(p))
            .collect()
    };

    let mut keys: Vec<String> = paths.iter().map(|p| utils::canonical_key(p)).collect();
    keys.sort();
    keys.dedup();
    Ok(keys)
}

/// Ties the pieces together for one rotation pass: scan the directory, run
/// the filter chain, let the strategy pick, apply through the shell config,
/// and only then commit strategy tracking.
pub struct Rotator {
    config: Config,
    store: MetadataStore,
    strategy: Strategy,
    state_path: PathBuf,
}

impl Rotator {
    pub fn new(config: Config) -> Self {
        let store = MetadataStore::open();
        Self::with_parts(config, store, select::state_path())
    }

    /// Explicit store and state location, used by tests
    pub fn with_parts(config: Config, store: MetadataStore, state_path: PathBuf) -> Self {
        let base = Strategy::for_mode(
            config.selection.random_mode,
            config.selection.avoid_recent_percentage,
        );
        let mut strategy = if config.selection.time_based {
            Strategy::time_based(base)
        } else {
            base
        };
        if let Some(state) = select::load_state(&state_path) {
            strategy.restore_state(state);
        }

        Self {
            config,
            store,
            strategy,
            state_path,
        }
    }

    /// Rotate using the wall clock
    pub fn rotate(&mut self, dry_run: bool) -> Result<RotationOutcome> {
        self.rotate_at(Local::now().time(), dry_run)
    }

    /// Rotate as of a given time of day. With `dry_run` the wallpaper is
    /// chosen but not applied and no state changes are committed.
    pub fn rotate_at(&mut self, now: NaiveTime, dry_run: bool) -> Result<RotationOutcome> {
        let dir = self.config.wallpaper_dir();
        let candidates = list_candidates(&dir, self.config.wallpaper.recursive)?;
        if candidates.is_empty() {
            anyhow::bail!("No images found in {}", dir.display());
        }

        let shell_config = self.config.shell_config_path();
        let ctx = SelectionContext {
            now,
            current: shell::current_wallpaper(&shell_config),
            time_based_enabled: self.config.selection.time_based,
            filter_recent: self.strategy.wants_recency_filter(),
            recent: self.strategy.recent(),
            luminosity_filter: self.config.selection.luminosity_filter,
        };
        debug!(
            candidates = candidates.len(),
            current = ?ctx.current,
            strategy = self.strategy.display_name(),
            "starting rotation pass"
        );

        let excluded: HashSet<String> = self
            .config
            .wallpaper
            .excluded_files
            .iter()
            .cloned()
            .collect();
        let chain = FilterChain::new(excluded);
        let filtered = chain.apply(candidates.clone(), &ctx, &mut self.store);

        // Filters guarantee a non-empty result for non-empty input, but a
        // broken pool must still never abort rotation
        let pool = if filtered.is_empty() {
            candidates.clone()
        } else {
            filtered
        };
        let after_filters = pool.len();

        let chosen = self
            .strategy
            .select(&pool, &ctx)
            .context("No selectable wallpaper (all candidate files missing?)")?;

        if dry_run {
            return Ok(RotationOutcome {
                chosen,
                candidates: candidates.len(),
                after_filters,
                applied: false,
            });
        }

        shell::apply_wallpaper(&shell_config, &chosen)?;
        if let Some(command) = &self.config.shell.theme_command {
            shell::run_theme_command(command, &chosen);
        }

        // Tracking and persistence happen only after a successful apply, so
        // a failed apply leaves selection memory untouched
        self.strategy.update_tracking(&chosen);
        select::save_state(&self.state_path, &self.strategy.get_state());
        info!(wallpaper = %chosen, "rotation applied");

        Ok(RotationOutcome {
            chosen,
            candidates: candidates.len(),
            after_filters,
            applied: true,
        })
    }

    /// Forget all selection memory, in memory and on disk
    pub fn reset_strategy(&mut self) {
        self.strategy.reset();
        if self.state_path.exists() {
            let _ = fs::remove_file(&self.state_path);
        }
    }
}
