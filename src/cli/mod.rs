//! Command-line interface definitions for the `stagehand` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Args, Parser};

/// Top-level CLI for the `stagehand` binary.
#[derive(Debug, Parser)]
#[command(
    name = "stagehand",
    about = "Generate CD pipeline scripts that prepare hosts and start instances",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Generate the host preparation script.
    #[command(
        name = "prepare-host",
        about = "Generate the script that provisions the target host"
    )]
    PrepareHost(StageArgs),
    /// Generate the instance start script.
    #[command(
        name = "start-instance",
        about = "Generate the script that starts or refreshes the instance"
    )]
    StartInstance(StageArgs),
    /// Generate the startup monitoring script.
    #[command(
        name = "monitor-startup",
        about = "Generate the script that checks the instance came up"
    )]
    MonitorStartup(StageArgs),
}

/// Overrides shared by every stage subcommand.
#[derive(Debug, Default, Args)]
pub(crate) struct StageArgs {
    /// Instance to generate the script for, overriding
    /// `STAGEHAND_INSTANCE_UUID`.
    #[arg(long, value_name = "UUID")]
    pub(crate) instance: Option<String>,
    /// Instance definition store, overriding `STAGEHAND_STORE_PATH`.
    #[arg(long, value_name = "PATH")]
    pub(crate) store: Option<String>,
    /// Directory the script is written to, overriding `STAGEHAND_BUILD_DIR`.
    #[arg(long, value_name = "DIR", conflicts_with = "stdout")]
    pub(crate) build_dir: Option<String>,
    /// Print the script on standard output instead of saving it.
    #[arg(long)]
    pub(crate) stdout: bool,
}
