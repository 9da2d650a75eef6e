use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "driftwall")]
#[command(author = "MrMattias")]
#[command(version)]
#[command(about = "Wallpaper rotation with luminosity-aware time scheduling")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Commands>,

    /// Wallpaper directory (overrides config)
    #[arg(short, long)]
    pub(crate) dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Pick and apply the next wallpaper (default command)
    Rotate {
        /// Choose but don't apply or record anything
        #[arg(long)]
        dry_run: bool,

        /// Selection mode for this run: smart, pure or sequential
        #[arg(short, long)]
        mode: Option<String>,
    },
    /// Apply a specific wallpaper, bypassing selection
    Apply {
        /// Path to the image
        path: PathBuf,
    },
    /// Show the currently applied wallpaper
    Current,
    /// Analyze wallpaper luminosity and update classifications
    Analyze {
        /// Re-analyze even unchanged files
        #[arg(short, long)]
        force: bool,
    },
    /// List candidates with their classifications
    List {
        /// Evaluate schedules at this time instead of now (HH:MM)
        #[arg(short, long)]
        at: Option<String>,

        /// Only show one classification: dark, medium or light
        #[arg(short, long)]
        classification: Option<String>,
    },
    /// Pin an image's classification against re-analysis
    Override {
        /// Path to the image
        path: PathBuf,
        /// dark, medium or light
        classification: String,
    },
    /// Manage per-classification time schedules
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
    /// Manage custom image tags
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },
    /// Manage the exclusion list
    Exclude {
        #[command(subcommand)]
        action: ExcludeAction,
    },
    /// Show metadata statistics
    Stats,
    /// Drop metadata records whose files no longer exist
    Gc,
    /// Forget all selection memory (recent set, shuffle queue)
    Reset,
}

#[derive(Subcommand)]
pub(crate) enum ScheduleAction {
    /// Show all schedules and any coverage gaps
    Show,
    /// Enable a classification's schedule
    Enable {
        /// dark, medium or light
        classification: String,
    },
    /// Disable a classification's schedule
    Disable {
        /// dark, medium or light
        classification: String,
    },
    /// Replace a classification's time ranges
    Set {
        /// dark, medium or light
        classification: String,
        /// Comma-separated ranges, e.g. "20:00-06:00" or "06:00-09:00,17:00-20:00"
        ranges: String,
    },
    /// Report times of day no enabled schedule covers
    Check,
    /// Edit schedules interactively
    Edit,
}

#[derive(Subcommand)]
pub(crate) enum TagAction {
    /// List all tags
    List,
    /// Add a tag to an image
    Add {
        /// Path to the image
        path: PathBuf,
        /// Tag to add
        tag: String,
    },
    /// Remove a tag from an image
    Remove {
        /// Path to the image
        path: PathBuf,
        /// Tag to remove
        tag: String,
    },
    /// Show images with a specific tag
    Show {
        /// Tag to filter by
        tag: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum ExcludeAction {
    /// List excluded files
    List,
    /// Exclude a file from rotation
    Add {
        /// Path to the image
        path: PathBuf,
    },
    /// Remove a file from the exclusion list
    Remove {
        /// Path to the image
        path: PathBuf,
    },
}
