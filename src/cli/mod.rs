//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "huntsmith",
    version,
    author = "neur0map",
    about = "Originality-guarded puzzle generation for scavenger-hunt scenes",
    long_about = "Huntsmith keeps a knowledge base of reference material and generates new puzzles \
                  with a language model, rejecting any draft that stays too close to a reference \
                  or leaks where it came from."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/huntsmith/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Profile to apply on top of the config file
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk, embed and store a reference document
    Ingest {
        /// UTF-8 text file to ingest
        path: PathBuf,

        /// Source title
        #[arg(short, long)]
        title: String,

        /// License note for the source
        #[arg(short, long)]
        license: Option<String>,

        /// Where the source came from
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Generate an original puzzle from a JSON request
    Generate {
        /// Request file, or "-" for stdin
        #[arg(short, long, value_name = "FILE|-")]
        request: String,
    },

    /// Search the knowledge base
    Search {
        /// Search query text
        query: String,

        /// Maximum number of results to return
        #[arg(short, long)]
        limit: Option<usize>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage ingested sources
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },

    /// Show or change the originality policy
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SourcesAction {
    /// List ingested sources
    List {
        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Delete a source and its chunks
    Delete {
        /// Source identifier
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PolicyAction {
    /// Show the policy in effect
    Show,

    /// Store new thresholds
    Set {
        /// Maximum cosine similarity to any reference
        #[arg(long)]
        max_cosine: Option<f32>,

        /// Maximum 5-gram Jaccard overlap with any reference
        #[arg(long)]
        max_jaccard: Option<f32>,
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
