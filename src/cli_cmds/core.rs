use anyhow::{bail, Result};
use chrono::{Local, NaiveTime};
use std::collections::HashSet;
use std::path::Path;

use crate::cli::ExcludeAction;
use crate::config::Config;
use crate::metadata::{Classification, MetadataStore};
use crate::rotation::{list_candidates, Rotator};
use crate::select::RandomMode;
use crate::{analyze, shell, utils};

pub fn cmd_rotate(mut config: Config, dry_run: bool, mode: Option<&str>) -> Result<()> {
    if let Some(name) = mode {
        match RandomMode::from_name(name) {
            Some(mode) => config.selection.random_mode = mode,
            None => bail!("Unknown mode '{}' (expected smart, pure or sequential)", name),
        }
    }

    let mode_name = config.selection.random_mode.display_name();
    let mut rotator = Rotator::new(config);
    let outcome = rotator.rotate(dry_run)?;

    if dry_run {
        println!("Would apply: {}", outcome.chosen);
    } else {
        println!("✓ {}", outcome.chosen);
    }
    println!(
        "  {} candidates, {} after filters ({})",
        outcome.candidates, outcome.after_filters, mode_name
    );
    Ok(())
}

pub fn cmd_apply(config: &Config, path: &Path) -> Result<()> {
    let path = utils::expand_tilde(path);
    if !path.is_file() {
        bail!("Not a file: {}", path.display());
    }
    let key = utils::canonical_key(&path);

    shell::apply_wallpaper(&config.shell_config_path(), &key)?;
    if let Some(command) = &config.shell.theme_command {
        shell::run_theme_command(command, &key);
    }
    println!("✓ {}", key);
    Ok(())
}

pub fn cmd_current(config: &Config) -> Result<()> {
    match shell::current_wallpaper(&config.shell_config_path()) {
        Some(current) => println!("{}", current),
        None => println!("No wallpaper recorded in shell config."),
    }
    Ok(())
}

pub fn cmd_analyze(config: &Config, force: bool) -> Result<()> {
    let dir = config.wallpaper_dir();
    let candidates = list_candidates(&dir, config.wallpaper.recursive)?;
    if candidates.is_empty() {
        eprintln!("No wallpapers found in: {}", dir.display());
        return Ok(());
    }

    println!("Analyzing {} images in {}...", candidates.len(), dir.display());
    let mut store = MetadataStore::open();
    let summary = analyze::analyze_batch(&mut store, &candidates, force);

    println!(
        "✓ {} analyzed, {} unchanged, {} failed",
        summary.analyzed, summary.skipped, summary.failed
    );
    let stats = store.statistics();
    println!(
        "  dark: {}  medium: {}  light: {}",
        stats.dark, stats.medium, stats.light
    );
    Ok(())
}

pub fn cmd_list(config: &Config, at: Option<&str>, classification: Option<&str>) -> Result<()> {
    let dir = config.wallpaper_dir();
    let candidates = list_candidates(&dir, config.wallpaper.recursive)?;
    let mut store = MetadataStore::open();

    if let Some(name) = classification {
        let Some(wanted) = Classification::from_name(name) else {
            bail!("Unknown classification '{}' (expected dark, medium or light)", name);
        };
        let listed: HashSet<&str> = store.images_by_classification(wanted).into_iter().collect();
        let mut shown = 0usize;
        for key in &candidates {
            // Unanalyzed images count as medium, same as the luminosity filter
            let matches = listed.contains(key.as_str())
                || (wanted == Classification::Medium && store.get_record(key).is_none());
            if matches {
                println!("{}", key);
                shown += 1;
            }
        }
        println!("{} {} image(s)", shown, wanted.name());
        return Ok(());
    }

    let t = match at {
        Some(s) => NaiveTime::parse_from_str(s, "%H:%M")
            .map_err(|_| anyhow::anyhow!("Invalid time '{}' (expected HH:MM)", s))?,
        None => Local::now().time(),
    };
    let active = store.active_classifications(t);
    let suitable = store.images_for_time(t);

    if active.is_empty() {
        println!("No schedule active at {}, no time restriction.", t.format("%H:%M"));
    } else {
        let names: Vec<&str> = active.iter().map(Classification::name).collect();
        println!("Active at {}: {}", t.format("%H:%M"), names.join(", "));
    }
    for key in &candidates {
        let class = store
            .get_record(key)
            .map(|r| r.classification.name())
            .unwrap_or("unanalyzed");
        let marker = if suitable.contains(key) || store.get_record(key).is_none() {
            " "
        } else {
            "·"
        };
        println!("{} [{:10}] {}", marker, class, key);
    }
    Ok(())
}

pub fn cmd_override(path: &Path, classification: &str) -> Result<()> {
    let Some(wanted) = Classification::from_name(classification) else {
        bail!(
            "Unknown classification '{}' (expected dark, medium or light)",
            classification
        );
    };
    let path = utils::expand_tilde(path);
    if !path.is_file() {
        bail!("Not a file: {}", path.display());
    }
    let key = utils::canonical_key(&path);

    let mut store = MetadataStore::open();
    if store.get_record(&key).is_none() {
        // Never seen this image: analyze once so the record carries a real
        // luminosity value alongside the pinned classification
        let record = analyze::analyze_image(&path)?;
        store.upsert_record(&key, record);
    }
    store.override_classification(&key, wanted);
    println!("✓ {} pinned as {}", key, wanted.name());
    Ok(())
}

pub fn cmd_exclude(mut config: Config, action: ExcludeAction) -> Result<()> {
    match action {
        ExcludeAction::List => {
            if config.wallpaper.excluded_files.is_empty() {
                println!("No excluded files.");
            } else {
                for key in &config.wallpaper.excluded_files {
                    println!("{}", key);
                }
            }
        }
        ExcludeAction::Add { path } => {
            let key = utils::canonical_key(&utils::expand_tilde(&path));
            if config.wallpaper.excluded_files.contains(&key) {
                println!("Already excluded: {}", key);
            } else {
                config.wallpaper.excluded_files.push(key.clone());
                config.wallpaper.excluded_files.sort();
                config.save()?;
                println!("✓ Excluded {}", key);
            }
        }
        ExcludeAction::Remove { path } => {
            let key = utils::canonical_key(&utils::expand_tilde(&path));
            let before = config.wallpaper.excluded_files.len();
            config.wallpaper.excluded_files.retain(|k| k != &key);
            if config.wallpaper.excluded_files.len() < before {
                config.save()?;
                println!("✓ Removed {}", key);
            } else {
                println!("Not on the exclusion list: {}", key);
            }
        }
    }
    Ok(())
}

pub fn cmd_stats() -> Result<()> {
    let store = MetadataStore::open();
    let stats = store.statistics();

    println!("Analyzed images: {}", stats.total);
    println!("  Dark:   {}", stats.dark);
    println!("  Medium: {}", stats.medium);
    println!("  Light:  {}", stats.light);
    println!("Manual overrides: {}", stats.manual_overrides);
    println!("Tagged images:    {}", stats.tagged);

    match crate::select::load_state(&crate::select::state_path()) {
        Some(state) => println!("Wallpapers shown: {}", state.shown_count()),
        None => println!("Wallpapers shown: none recorded"),
    }
    Ok(())
}

pub fn cmd_gc() -> Result<()> {
    let mut store = MetadataStore::open();
    let removed = store.clean_missing();
    if removed.is_empty() {
        println!("Nothing to clean.");
    } else {
        for key in &removed {
            println!("  removed {}", key);
        }
        println!("✓ Dropped {} stale record(s)", removed.len());
    }
    Ok(())
}

pub fn cmd_reset(config: Config) -> Result<()> {
    let mut rotator = Rotator::new(config);
    rotator.reset_strategy();
    println!("✓ Selection memory cleared.");
    Ok(())
}
