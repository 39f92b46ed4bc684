//! `tfprobe run` command handler

use std::path::Path;
use std::time::Duration;

use tracing::info;

use tfprobe_core::config::TfprobeConfig;
use tfprobe_provisioner::{ApplyOptions, TerraformCli};

use crate::cli::RunArgs;
use crate::commands::{apply_overrides, select_cases};
use crate::error::CliError;
use crate::output::OutputWriter;
use crate::runner::run_matrix;

/// Execute the `run` command.
///
/// Runs the selected matrix cases against the configured workspace and
/// renders a [`MatrixReport`](crate::runner::MatrixReport).
///
/// # Errors
///
/// Returns `CliError::Config` for invalid configuration or overrides,
/// `CliError::Command` for an unknown `--case`, and `CliError::CasesFailed`
/// when at least one case did not pass.
pub async fn execute(
    args: RunArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = TfprobeConfig::load_or_default(config_path).await?;
    apply_overrides(&mut config, &args.overrides)?;
    if args.keep_after {
        config.run.keep_after = true;
    }

    let timeout_secs = args.timeout_secs.unwrap_or(config.terraform.timeout_secs);
    if timeout_secs == 0 {
        return Err(CliError::Config(
            "--timeout-secs must be greater than 0".to_owned(),
        ));
    }

    let cases = select_cases(config.run_cases(), &args.cases)?;
    let workspace = config.workspace_dir();
    let provisioner = TerraformCli::from_config(&config.terraform);
    let template = ApplyOptions::from_config(&config.terraform);

    info!(
        workspace = %workspace.display(),
        binary = provisioner.binary(),
        cases = cases.len(),
        keep_after = config.run.keep_after,
        "running provider matrix"
    );

    let report = run_matrix(
        &provisioner,
        &workspace,
        &template,
        &cases,
        Duration::from_secs(timeout_secs),
    )
    .await;

    writer.render(&report)?;

    if !report.all_passed() {
        return Err(CliError::CasesFailed {
            failed: report.failed(),
            total: report.cases.len(),
        });
    }

    Ok(())
}
