//! `tfprobe reset` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use tfprobe_core::config::TfprobeConfig;
use tfprobe_core::error::TfprobeError;
use tfprobe_workspace::reset_workspace;

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `reset` command.
///
/// Removes only the cached artifacts; generated files are left alone.
pub async fn execute(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    let config = TfprobeConfig::load_or_default(config_path).await?;
    let workspace = config.workspace_dir();
    info!(workspace = %workspace.display(), "resetting workspace");

    let reset = reset_workspace(&workspace)
        .await
        .map_err(TfprobeError::from)?;

    let report = ResetCommandReport {
        workspace: workspace.display().to_string(),
        removed: reset
            .removed
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
    };
    writer.render(&report)?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ResetCommandReport {
    pub workspace: String,
    pub removed: Vec<String>,
}

impl Render for ResetCommandReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Workspace: {}", self.workspace.bold())?;
        if self.removed.is_empty() {
            writeln!(w, "  {}", "already clean".green())?;
        }
        for path in &self.removed {
            writeln!(w, "  Removed: {}", path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_report_render_clean() {
        let report = ResetCommandReport {
            workspace: "test_data/test_module".to_owned(),
            removed: Vec::new(),
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("should render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("already clean"));
    }

    #[test]
    fn test_reset_report_json() {
        let report = ResetCommandReport {
            workspace: "ws".to_owned(),
            removed: vec!["ws/.terraform".to_owned()],
        };
        let json = serde_json::to_value(&report).expect("should serialize");
        assert_eq!(json["removed"][0].as_str(), Some("ws/.terraform"));
    }
}
