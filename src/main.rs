mod analyze;
mod cli;
mod cli_cmds;
mod config;
mod filter;
mod metadata;
mod rotation;
mod select;
mod shell;
mod utils;

use anyhow::Result;

fn main() -> Result<()> {
    cli::run()
}
