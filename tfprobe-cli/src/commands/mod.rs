//! Command handlers -- one module per subcommand

pub mod config;
pub mod prepare;
pub mod reset;
pub mod run;

use tfprobe_core::config::{TfprobeConfig, cases_from_versions};
use tfprobe_core::types::RunCase;

use crate::cli::ParamOverrides;
use crate::error::CliError;

/// Apply command-line overrides on top of the loaded configuration.
///
/// Re-validates afterwards so an override such as `--region ""` is rejected
/// the same way a bad config file would be.
pub fn apply_overrides(
    config: &mut TfprobeConfig,
    overrides: &ParamOverrides,
) -> Result<(), CliError> {
    if !overrides.provider_versions.is_empty() {
        config.run.cases = cases_from_versions(&overrides.provider_versions);
    }
    if let Some(ref region) = overrides.region {
        config.run.region = region.clone();
    }
    if let Some(ref role_arn) = overrides.role_arn {
        config.run.role_arn = role_arn.clone();
    }
    config.validate()?;
    Ok(())
}

/// Keep only the cases named in `wanted`, preserving configured order.
///
/// An empty filter keeps every case; an unknown id is an error.
pub fn select_cases(cases: Vec<RunCase>, wanted: &[String]) -> Result<Vec<RunCase>, CliError> {
    if wanted.is_empty() {
        return Ok(cases);
    }

    if let Some(unknown) = wanted.iter().find(|id| !cases.iter().any(|c| &c.id == *id)) {
        let available: Vec<&str> = cases.iter().map(|c| c.id.as_str()).collect();
        return Err(CliError::Command(format!(
            "unknown case: {} (available: {})",
            unknown,
            available.join(", ")
        )));
    }

    Ok(cases
        .into_iter()
        .filter(|c| wanted.contains(&c.id))
        .collect())
}
