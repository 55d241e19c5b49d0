//! Gallery launcher: lists the available visualizations and runs one in a
//! window.

mod assets;
mod curve;
mod routes;
mod views;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use orrery_engine::config::SessionConfig;
use orrery_engine::logging::{LoggingConfig, init_logging};
use orrery_engine::runtime::{Runtime, RuntimeConfig, WINDOW_SELECTOR};

#[derive(Parser)]
#[command(name = "orrery", about = "A gallery of real-time 3D visualizations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the available visualizations.
    List,
    /// Open a visualization in a window.
    Run {
        /// Route name, as shown by `list`.
        route: String,
    },
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    match Cli::parse().command {
        Command::List => {
            for route in routes::ROUTES {
                println!("{:<12} {}", route.path, route.description);
            }
            Ok(())
        }
        Command::Run { route } => {
            let route = routes::find(&route)
                .with_context(|| format!("unknown route {route:?}; try `orrery list`"))?;
            log::info!("starting {}", route.path);
            Runtime::run(
                RuntimeConfig {
                    title: format!("orrery: {}", route.title),
                    ..RuntimeConfig::default()
                },
                SessionConfig::new(WINDOW_SELECTOR),
                (route.build)(),
            )
        }
    }
}
