mod cli;
mod commands;
mod error;
mod fanout;
mod http;
mod mcp;
mod page_range;
mod pdf;
mod select;
mod service;
mod store;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout belongs to the MCP transport and to command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pagesplice=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Serve {
            store,
            addr,
            max_body_mb,
            expire_minutes,
            sweep_interval_secs,
        } => {
            let options = commands::serve::ServeOptions {
                addr,
                max_body_mb,
                expire_after: Duration::from_secs(expire_minutes * 60),
                sweep_interval: Duration::from_secs(sweep_interval_secs.max(1)),
            };
            commands::serve::run(&store, options).await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path)?;
        }
        Commands::Merge { inputs, store } => {
            commands::merge::run(&inputs, &store).await?;
        }
        Commands::Split {
            path,
            ranges,
            pages,
            merge,
            store,
        } => {
            commands::split::run(&path, ranges.as_deref(), pages.as_deref(), merge, &store).await?;
        }
        Commands::Cleanup {
            store,
            older_than_minutes,
        } => {
            commands::cleanup::run(&store, older_than_minutes).await?;
        }
    }

    Ok(())
}
