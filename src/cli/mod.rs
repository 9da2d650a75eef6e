mod args;
mod runner;

pub(crate) use args::{Cli, Commands, ExcludeAction, ScheduleAction, TagAction};
pub(crate) use runner::run;
