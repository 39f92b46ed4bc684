//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// tfprobe -- validate a Terraform module against a provider-version matrix.
///
/// Use `tfprobe <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "tfprobe", version, about, long_about = None)]
pub struct Cli {
    /// Path to the tfprobe.toml configuration file.
    #[arg(short, long, default_value = "tfprobe.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reset, template and apply the module for every matrix case.
    Run(RunArgs),

    /// Reset the workspace and write the generated files without applying.
    Prepare(PrepareArgs),

    /// Remove cached provisioning state from the workspace.
    Reset,

    /// Manage configuration.
    Config(ConfigArgs),
}

/// Overrides shared by `run` and `prepare`.
#[derive(Args, Debug, Default, Clone)]
pub struct ParamOverrides {
    /// Provider version constraint(s); replaces the configured matrix.
    #[arg(long = "provider-version", value_name = "CONSTRAINT")]
    pub provider_versions: Vec<String>,

    /// Override the cloud region.
    #[arg(long)]
    pub region: Option<String>,

    /// Override the assumed-role ARN (empty string clears it).
    #[arg(long)]
    pub role_arn: Option<String>,
}

// ---- run ----

/// Run the apply/destroy lifecycle across the provider matrix.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub overrides: ParamOverrides,

    /// Only run the named case(s), e.g. `aws-6`.
    #[arg(long = "case", value_name = "ID")]
    pub cases: Vec<String>,

    /// Keep provisioned resources after the run (skip destroy).
    #[arg(long)]
    pub keep_after: bool,

    /// Per-case timeout in seconds (overrides terraform.timeout_secs).
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

// ---- prepare ----

/// Write the generated files for a single case.
#[derive(Args, Debug)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub overrides: ParamOverrides,

    /// Case to prepare (default: the first configured case).
    #[arg(long = "case", value_name = "ID")]
    pub case: Option<String>,
}

// ---- config ----

/// Manage tfprobe configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, terraform, run).
        #[arg(long)]
        section: Option<String>,
    },
}
