// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetflow",
    version,
    about = "Minify, bundle, lint and watch a static asset tree.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to run, in order.
    #[arg(value_name = "TASK", default_value = "default")]
    pub tasks: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// If omitted, `Assetflow.toml` is used when present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Source tree root (overrides `[paths].source`).
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Destination tree root (overrides `[paths].dest`).
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Maximum number of tasks running at once (overrides `[build].jobs`).
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the available tasks and exit.
    #[arg(long)]
    pub list: bool,

    /// Print the resolved execution plan without running anything.
    #[arg(long)]
    pub dry_run: bool,
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

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
