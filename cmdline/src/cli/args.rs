//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// cmdline - run a command, stream its output, exit with its exit code
#[derive(Parser, Debug)]
#[command(name = "cmdline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file with command presets
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a program
    Run {
        /// Program to run (looked up on PATH, never through a shell)
        program: String,

        /// Argument string (split with shell-style quoting on Unix, passed verbatim on Windows)
        #[arg(short, long, default_value = "", allow_hyphen_values = true)]
        args: String,

        /// Working directory
        #[arg(short = 'C', long, default_value = ".")]
        dir: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run a preset from the config file
    Preset {
        /// Preset name
        name: String,

        /// Argument string, replacing the preset's own
        #[arg(short, long, allow_hyphen_values = true)]
        args: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List presets from the config file
    Presets,
}

/// How to present the child's output.
#[derive(Args, Debug, Clone, Copy)]
pub struct OutputArgs {
    /// Prefix lines with [out] or [err]
    #[arg(long)]
    pub tag: bool,

    /// Print a JSON run report to stdout when the process exits
    #[arg(long)]
    pub json: bool,
}
