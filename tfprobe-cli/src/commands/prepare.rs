//! `tfprobe prepare` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use tfprobe_core::config::TfprobeConfig;
use tfprobe_core::error::TfprobeError;
use tfprobe_workspace::prepare_workspace;

use crate::cli::PrepareArgs;
use crate::commands::{apply_overrides, select_cases};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `prepare` command.
pub async fn execute(
    args: PrepareArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = TfprobeConfig::load_or_default(config_path).await?;
    let report = prepare(&mut config, &args).await?;
    writer.render(&report)?;
    Ok(())
}

/// Reset the workspace and write the generated files for one case.
///
/// Uses `--case` when given, otherwise the first configured case.
pub async fn prepare(
    config: &mut TfprobeConfig,
    args: &PrepareArgs,
) -> Result<PrepareReport, CliError> {
    apply_overrides(config, &args.overrides)?;

    let wanted: Vec<String> = args.case.iter().cloned().collect();
    let case = select_cases(config.run_cases(), &wanted)?
        .into_iter()
        .next()
        .ok_or_else(|| CliError::Command("no case to prepare".to_owned()))?;
    case.params.validate()?;

    let workspace = config.workspace_dir();
    info!(
        workspace = %workspace.display(),
        case = %case.id,
        "preparing workspace"
    );

    let (reset, written) = prepare_workspace(&workspace, &config.terraform.var_file, &case.params)
        .await
        .map_err(TfprobeError::from)?;

    Ok(PrepareReport {
        workspace: workspace.display().to_string(),
        case: case.id,
        provider_version: case.params.provider_version,
        removed: reset
            .removed
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        written: vec![
            written.var_file.display().to_string(),
            written.provider_pin.display().to_string(),
        ],
    })
}

/// Files touched by `prepare`.
#[derive(Debug, Serialize)]
pub struct PrepareReport {
    pub workspace: String,
    pub case: String,
    pub provider_version: String,
    pub removed: Vec<String>,
    pub written: Vec<String>,
}

impl Render for PrepareReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Prepared {} ({}) in {}",
            self.case.bold(),
            self.provider_version,
            self.workspace
        )?;
        if self.removed.is_empty() {
            writeln!(w, "  Removed: (nothing cached)")?;
        }
        for path in &self.removed {
            writeln!(w, "  Removed: {}", path.yellow())?;
        }
        for path in &self.written {
            writeln!(w, "  Wrote:   {}", path.green())?;
        }
        Ok(())
    }
}
