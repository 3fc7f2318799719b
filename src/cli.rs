use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagesplice")]
#[command(about = "Merge and split PDFs by page, as a CLI, HTTP service or MCP server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where outputs are written and how they are addressed.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Directory output PDFs are written to
    #[arg(long, env = "PAGESPLICE_STORE_DIR", default_value = "pagesplice-output")]
    pub store_dir: PathBuf,

    /// Base URL reported for stored outputs (defaults to the store directory)
    #[arg(long, env = "PAGESPLICE_PUBLIC_URL")]
    pub public_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Run the HTTP API
    Serve {
        #[command(flatten)]
        store: StoreArgs,

        /// Address to listen on
        #[arg(long, env = "PAGESPLICE_ADDR", default_value = "0.0.0.0:3000")]
        addr: SocketAddr,

        /// Largest accepted request body, in MiB
        #[arg(long, env = "PAGESPLICE_MAX_BODY_MB", default_value = "100")]
        max_body_mb: usize,

        /// Stored outputs older than this are deleted
        #[arg(long, env = "PAGESPLICE_EXPIRE_MINUTES", default_value = "3")]
        expire_minutes: u64,

        /// How often to look for expired outputs
        #[arg(long, default_value = "60")]
        sweep_interval_secs: u64,
    },

    /// Display the page count of a PDF
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Combine PDFs into one, optionally rotating each file
    #[command(alias = "cat")]
    Merge {
        /// PDF files to merge, as PATH or PATH:DEGREES (e.g., "scan.pdf:90")
        #[arg(required = true)]
        inputs: Vec<String>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Split a PDF by page ranges or extract single pages
    #[command(alias = "burst")]
    Split {
        /// PDF file to split
        path: PathBuf,

        /// Page ranges, one output each (e.g., "1-5,8-10")
        #[arg(short, long, conflicts_with = "pages", required_unless_present = "pages")]
        ranges: Option<String>,

        /// Page numbers, one output each (e.g., "3,1,7")
        #[arg(short, long)]
        pages: Option<String>,

        /// Combine all selected pages into a single output
        #[arg(short, long)]
        merge: bool,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Delete stored outputs older than the given age
    Cleanup {
        #[command(flatten)]
        store: StoreArgs,

        /// Maximum age in minutes
        #[arg(long, env = "PAGESPLICE_EXPIRE_MINUTES", default_value = "3")]
        older_than_minutes: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_split_requires_a_selection() {
        assert!(Cli::try_parse_from(["pagesplice", "split", "a.pdf"]).is_err());
        assert!(
            Cli::try_parse_from(["pagesplice", "split", "a.pdf", "-r", "1-2", "-p", "3"]).is_err()
        );
        assert!(Cli::try_parse_from(["pagesplice", "split", "a.pdf", "-p", "3", "--merge"]).is_ok());
    }
}
