mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fleetboard_core::Dashboard;

use crate::cli::{Cli, Command};
use crate::commands::Ctx;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let global = cli.global;
    match cli.command {
        // Config commands don't need a backend connection
        Command::Config(args) => commands::config_cmd::handle(args, &global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "fleetboard", &mut std::io::stdout());
            Ok(())
        }

        // Watching keeps the dashboard (and its change feeds) alive
        cmd if cmd.is_watch() => {
            let resolved = config::resolve(&global)?;
            let ctx = Ctx {
                locale: resolved.locale,
                color: output::should_color(&global.color),
            };
            let dashboard = Dashboard::connect(&resolved.backend, &resolved.options)?;

            tracing::debug!(command = ?cmd, "dispatching watch");
            let result = commands::dispatch(cmd, &dashboard, &ctx, &global).await;
            dashboard.unmount_all().await;
            result
        }

        // Everything else is a single request/response cycle
        cmd => {
            let resolved = config::resolve(&global)?;
            let ctx = Ctx {
                locale: resolved.locale,
                color: output::should_color(&global.color),
            };

            tracing::debug!(command = ?cmd, "dispatching command");
            let global = &global;
            Dashboard::oneshot(resolved.backend, resolved.options, |dashboard| async move {
                Ok(commands::dispatch(cmd, &dashboard, &ctx, global).await)
            })
            .await?
        }
    }
}
