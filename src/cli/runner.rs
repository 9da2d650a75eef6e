use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use super::{Cli, Commands};
use crate::cli_cmds::*;
use crate::config::Config;

pub(crate) fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(dir) = cli.dir {
        config.wallpaper.directory = dir;
    }

    match cli.command {
        Some(Commands::Rotate { dry_run, mode }) => {
            cmd_rotate(config, dry_run, mode.as_deref())?;
        }
        Some(Commands::Apply { path }) => {
            cmd_apply(&config, &path)?;
        }
        Some(Commands::Current) => {
            cmd_current(&config)?;
        }
        Some(Commands::Analyze { force }) => {
            cmd_analyze(&config, force)?;
        }
        Some(Commands::List { at, classification }) => {
            cmd_list(&config, at.as_deref(), classification.as_deref())?;
        }
        Some(Commands::Override {
            path,
            classification,
        }) => {
            cmd_override(&path, &classification)?;
        }
        Some(Commands::Schedule { action }) => {
            cmd_schedule(action)?;
        }
        Some(Commands::Tag { action }) => {
            cmd_tag(action)?;
        }
        Some(Commands::Exclude { action }) => {
            cmd_exclude(config, action)?;
        }
        Some(Commands::Stats) => {
            cmd_stats()?;
        }
        Some(Commands::Gc) => {
            cmd_gc()?;
        }
        Some(Commands::Reset) => {
            cmd_reset(config)?;
        }
        None => {
            // Bare invocation rotates
            cmd_rotate(config, false, None)?;
        }
    }

    Ok(())
}
