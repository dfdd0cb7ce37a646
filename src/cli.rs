// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `scriptexec`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scriptexec",
    version,
    about = "Run scripts as tracked tasks with progress and durable logs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `Scriptexec.toml` in the current directory is used when
    /// present, otherwise built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Who is running the tasks (free text, recorded on every task).
    #[arg(long, value_name = "NAME", required_unless_present = "dry_run")]
    pub owner: Option<String>,

    /// Catalog script to run; repeat to run several concurrently.
    ///
    /// With neither `--script` nor a trailing command, the `sample` script
    /// is run.
    #[arg(long = "script", value_name = "NAME")]
    pub scripts: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SCRIPTEXEC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print final task records as JSON instead of their logs.
    #[arg(long)]
    pub json: bool,

    /// Parse + validate config, print the script catalog, run nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Ad-hoc command to run as an extra task: executable then arguments.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
