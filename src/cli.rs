// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `pipeforge`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipeforge",
    version,
    about = "Run declarative asset-build task graphs, once or under a file watcher.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run. Defaults to the task named `default`.
    #[arg(value_name = "TASK")]
    pub task: Option<String>,

    /// Path to the build description (TOML).
    #[arg(long, value_name = "PATH", default_value = "Pipeforge.toml")]
    pub config: String,

    /// Keep running and re-execute bound tasks on file changes.
    #[arg(long)]
    pub watch: bool,

    /// Parse + validate, print the graph, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPEFORGE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
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
