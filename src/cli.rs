use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "country-gdp-cache")]
#[command(version, about = "Cache country metadata with exchange-rate based GDP estimates")]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Serve the HTTP API (default)
    Serve,

    /// Fetch both sources once, store the result and render the summary image
    Refresh,

    /// Print how many countries are cached and when they were last refreshed
    Status,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Serve)
    }
}
