mod core;
mod schedule_cmds;
mod tag_cmds;

pub use self::core::{
    cmd_analyze, cmd_apply, cmd_current, cmd_exclude, cmd_gc, cmd_list, cmd_override, cmd_reset,
    cmd_rotate, cmd_stats,
};
pub use schedule_cmds::cmd_schedule;
pub use tag_cmds::cmd_tag;
