//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "jobsearch",
    version,
    about = "Natural-language job search over a hybrid vector index",
    long_about = "jobsearch turns a natural-language job query into a semantic search plus structured \
                  filters, retrieves matching postings from a hybrid sparse/dense index, and summarizes \
                  the best matches."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/jobsearch/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for jobs with a natural-language query
    Search {
        /// Query text, e.g. "senior python developer in San Francisco"
        query: String,

        /// Number of jobs to return (defaults to search.default_top)
        #[arg(short, long)]
        top: Option<usize>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
