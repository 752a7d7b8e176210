//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod normalize;
pub mod stats;
pub mod util;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::config::Context;
use crate::error::CliError;

/// Dispatch a command to its handler.
pub async fn dispatch(cmd: &Command, global: &GlobalOpts) -> Result<(), CliError> {
    // Config commands must work even when the config itself is invalid.
    if let Command::Config(args) = cmd {
        return config_cmd::handle(args, global);
    }

    let ctx = Context::resolve(global)?;
    match cmd {
        Command::Normalize(args) => normalize::handle(args, &ctx),
        Command::Stats(args) => stats::handle(args, &ctx),
        Command::Watch(args) => watch::handle(args, &ctx).await,
        Command::Config(args) => config_cmd::handle(args, global),
    }
}
