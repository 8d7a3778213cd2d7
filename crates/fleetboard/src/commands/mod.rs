//! Command dispatch: bridges CLI args -> collection managers -> output formatting.

pub mod config_cmd;
pub mod faqs;
pub mod games;
pub mod members;
pub mod ordered;
pub mod resources;
pub mod util;

use fleetboard_core::{Backend, Dashboard};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub use ordered::Ctx;

/// Dispatch a collection command to its handler.
pub async fn dispatch<B: Backend>(
    cmd: Command,
    dashboard: &Dashboard<B>,
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Members(args) => members::handle(dashboard, args, ctx, global).await,
        Command::Games(args) => games::handle(dashboard, args, ctx, global).await,
        Command::Faqs(args) => faqs::handle(dashboard, args, ctx, global).await,
        Command::Resources(args) => resources::handle(dashboard, args, ctx, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before dispatch".into(),
        )),
    }
}
