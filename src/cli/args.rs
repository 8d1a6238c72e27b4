//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::config::OutputFormat;

/// Composite tree analysis for structural models
#[derive(Parser, Debug)]
#[command(name = "comptree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug logging (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Output format (overrides config)
    #[arg(short, long, value_enum, global = true, env = "COMPTREE_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Config file to use instead of the global/local lookup
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a root type and print its tree
    Check {
        /// TOML model file
        #[arg(value_hint = ValueHint::FilePath)]
        model: PathBuf,
        /// Name of the root type
        #[arg(short, long)]
        root: String,
        /// Render branches in their total order
        #[arg(long)]
        sorted: bool,
    },

    /// List every ill-formed branch below a root type
    Report {
        /// TOML model file
        #[arg(value_hint = ValueHint::FilePath)]
        model: PathBuf,
        /// Name of the root type
        #[arg(short, long)]
        root: String,
    },

    /// Analyze every class and data type of a model as a root
    Roots {
        /// TOML model file
        #[arg(value_hint = ValueHint::FilePath)]
        model: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show {
        /// Model file whose directory holds a local config
        #[arg(value_hint = ValueHint::FilePath)]
        model: Option<PathBuf>,
    },

    /// Show config paths
    Path,

    /// Print a config template
    Template,
}
