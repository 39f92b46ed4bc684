//! `tfprobe config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use tfprobe_core::config::TfprobeConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

const SECTIONS: [&str; 3] = ["general", "terraform", "run"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Execute the config validate subcommand.
///
/// Unlike the other commands, a missing file is reported as invalid here.
///
/// # Errors
///
/// Returns `CliError::Config` if validation fails (parse errors, invalid values, missing file).
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = match TfprobeConfig::load(config_path).await {
        Ok(_) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Execute the config show subcommand.
///
/// Displays the effective configuration (file + env overrides + defaults)
/// with the account id in `run.role_arn` masked.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = TfprobeConfig::load_or_default(config_path).await?;
    let report = build_config_report(config, config_path, section.as_deref())?;

    writer.render(&report)?;

    Ok(())
}

/// Serialize the (masked) configuration, optionally a single section.
pub fn build_config_report(
    mut config: TfprobeConfig,
    config_path: &Path,
    section: Option<&str>,
) -> Result<ConfigReport, CliError> {
    config.run.role_arn = redact_account_id(&config.run.role_arn);

    let config_toml = match section {
        None => toml::to_string_pretty(&config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("terraform") => toml::to_string_pretty(&config.terraform),
        Some("run") => toml::to_string_pretty(&config.run),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {} (expected: {})",
                other,
                SECTIONS.join(", ")
            )));
        }
    }
    .unwrap_or_else(|e| format!("(serialization error: {})", e));

    Ok(ConfigReport {
        source: config_path.display().to_string(),
        section: section.map(str::to_owned),
        config_toml,
    })
}

/// Mask the account id field of an ARN.
///
/// `arn:aws:iam::123456789012:role/ci` becomes
/// `arn:aws:iam::***REDACTED***:role/ci`. Anything that is not a
/// six-field ARN with an account id is returned unchanged.
fn redact_account_id(arn: &str) -> String {
    let fields: Vec<&str> = arn.splitn(6, ':').collect();
    if fields.len() != 6 || fields[0] != "arn" || fields[4].is_empty() {
        return arn.to_owned();
    }
    format!(
        "{}:{}:{}:{}:***REDACTED***:{}",
        fields[0], fields[1], fields[2], fields[3], fields[5]
    )
}

/// Configuration display report.
///
/// The `config_toml` field is skipped during JSON serialization (only used for text rendering).
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("tfprobe.toml")
    }

    #[test]
    fn test_redact_account_id() {
        assert_eq!(
            redact_account_id("arn:aws:iam::123456789012:role/ci"),
            "arn:aws:iam::***REDACTED***:role/ci"
        );
        // role paths may contain ':' only in the resource part
        assert_eq!(
            redact_account_id("arn:aws-us-gov:iam::123456789012:role/a:b"),
            "arn:aws-us-gov:iam::***REDACTED***:role/a:b"
        );
    }

    #[test]
    fn test_redact_account_id_leaves_non_arns() {
        assert_eq!(redact_account_id(""), "");
        assert_eq!(redact_account_id("not-an-arn"), "not-an-arn");
        assert_eq!(redact_account_id("arn:aws:s3:::bucket"), "arn:aws:s3:::bucket");
    }

    #[test]
    fn test_build_config_report_full_masks_role() {
        let mut config = TfprobeConfig::default();
        config.run.role_arn = "arn:aws:iam::123456789012:role/ci".to_owned();

        let report = build_config_report(config, path(), None).expect("should build");
        assert!(report.section.is_none());
        assert!(report.config_toml.contains("[general]"));
        assert!(report.config_toml.contains("[terraform]"));
        assert!(report.config_toml.contains("***REDACTED***"));
        assert!(!report.config_toml.contains("123456789012"));
    }

    #[test]
    fn test_build_config_report_single_section() {
        let report = build_config_report(TfprobeConfig::default(), path(), Some("terraform"))
            .expect("should build");
        assert_eq!(report.section.as_deref(), Some("terraform"));
        assert!(report.config_toml.contains("timeout_secs = 3600"));
        assert!(!report.config_toml.contains("region"));
    }

    #[test]
    fn test_build_config_report_unknown_section() {
        let err = match build_config_report(TfprobeConfig::default(), path(), Some("ebpf")) {
            Err(e) => e,
            Ok(_) => panic!("unknown section should fail"),
        };
        assert!(err.to_string().contains("general, terraform, run"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_config_report_render_text_specific_section() {
        let report = ConfigReport {
            source: "/etc/tfprobe.toml".to_owned(),
            section: Some("run".to_owned()),
            config_toml: "region = \"us-east-1\"".to_owned(),
        };

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("[run]"), "should show section name");
        assert!(output.contains("region"), "should show config content");
    }

    #[test]
    fn test_config_report_json_skips_toml() {
        let report = ConfigReport {
            source: "test.toml".to_owned(),
            section: Some("general".to_owned()),
            config_toml: "log_level = \"info\"".to_owned(),
        };

        let parsed = serde_json::to_value(&report).expect("JSON serialization should succeed");
        assert_eq!(parsed["source"].as_str(), Some("test.toml"));
        assert_eq!(parsed["section"].as_str(), Some("general"));
        assert!(
            parsed.get("config_toml").is_none(),
            "config_toml should be skipped"
        );
    }

    #[test]
    fn test_config_validation_report_invalid() {
        let report = ConfigValidationReport {
            source: "bad.toml".to_owned(),
            valid: false,
            errors: vec!["invalid value for 'run.region': must not be empty".to_owned()],
        };

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("INVALID"), "should show invalid status");
        assert!(output.contains("run.region"), "should show error message");
    }

    #[test]
    fn test_config_validation_report_valid() {
        let report = ConfigValidationReport {
            source: "tfprobe.toml".to_owned(),
            valid: true,
            errors: Vec::new(),
        };

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("VALID"), "should show valid status");
        assert!(!output.contains("Error:"), "should not show errors");
    }
}
