//! Command-line interface

use crate::{config::EnvManager, types::Provider};
use clap::{Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::PathBuf;

/// Measure HTTP(S) latency to cloud provider regions
#[derive(Parser, Debug, Clone)]
#[command(name = "pingcloud")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Region table to use instead of the built-in one (CSV: region,name,address)
    #[arg(long, value_name = "FILE", global = true)]
    pub endpoints: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// One sub-command per cloud provider
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Amazon Web Services regions
    Aws(ProviderArgs),
    /// Google Cloud Platform regions
    Gcp(ProviderArgs),
    /// Microsoft Azure regions
    Azure(ProviderArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// Print the region table instead of probing
    #[arg(short, long)]
    pub list: bool,

    /// Rank every region by median latency
    #[arg(long)]
    pub rank: bool,

    /// Samples per region for --rank
    #[arg(long, value_name = "N")]
    pub samples: Option<u32>,

    /// Probes in flight for --rank
    #[arg(long, value_name = "C")]
    pub concurrency: Option<usize>,

    /// Report transport failures inline and keep probing
    #[arg(long)]
    pub keep_going: bool,

    /// Region codes to trace phase by phase
    #[arg(value_name = "REGION")]
    pub regions: Vec<String>,
}

impl Cli {
    /// Parse process arguments, with the environment variable reference in `--help`
    pub fn parse_args() -> Self {
        let matches = Self::command()
            .after_long_help(EnvManager::display_env_help())
            .get_matches();

        match Self::from_arg_matches(&matches) {
            Ok(cli) => cli,
            Err(e) => e.exit(),
        }
    }

    pub fn provider(&self) -> Provider {
        match self.command {
            Command::Aws(_) => Provider::Aws,
            Command::Gcp(_) => Provider::Gcp,
            Command::Azure(_) => Provider::Azure,
        }
    }

    pub fn provider_args(&self) -> &ProviderArgs {
        match &self.command {
            Command::Aws(args) | Command::Gcp(args) | Command::Azure(args) => args,
        }
    }
}
