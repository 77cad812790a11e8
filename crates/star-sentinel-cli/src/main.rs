//! Star Sentinel CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use star_sentinel_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            star_sentinel_cli::run::execute(args).await?;
        }
        Commands::Simulate(args) => {
            star_sentinel_cli::simulate::execute(args).await?;
        }
        Commands::Config(args) => {
            star_sentinel_cli::print_config(&args)?;
        }
        Commands::Version => {
            println!("star-sentinel {}", env!("CARGO_PKG_VERSION"));
            println!("fusion engine version: {}", star_sentinel_fusion::VERSION);
        }
    }

    Ok(())
}
