//! Single-case lifecycle and the provider-version matrix.
//!
//! [`prepare_and_run`] resets the workspace, writes the generated files and
//! applies the module through the scoped [`terraform_apply`]. [`run_matrix`]
//! repeats that for every [`RunCase`], one at a time, against the same
//! workspace directory.

use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use tfprobe_core::error::{ProvisionError, TfprobeError};
use tfprobe_core::types::{ApplyOutput, RunCase, RunParams};
use tfprobe_provisioner::{ApplyOptions, Provisioner, terraform_apply};
use tfprobe_workspace::prepare_workspace;

use crate::output::Render;

/// Reset the workspace, write the generated files, then apply (and destroy).
///
/// `template` supplies the var file name and trace flag; `destroy_after` and
/// `json_output` are always derived here. The apply output is logged once at
/// `info` as pretty-printed JSON and returned to the caller.
///
/// # Errors
///
/// Returns the first failing step unchanged: invalid params, workspace
/// reset/write, or the provisioner (apply before destroy).
pub async fn prepare_and_run<P: Provisioner>(
    provisioner: &P,
    dir: &Path,
    template: &ApplyOptions,
    params: &RunParams,
) -> Result<ApplyOutput, TfprobeError> {
    params.validate()?;

    let (reset, written) = prepare_workspace(dir, &template.var_file, params).await?;
    debug!(
        removed = reset.removed.len(),
        var_file = %written.var_file.display(),
        provider_pin = %written.provider_pin.display(),
        "workspace prepared"
    );

    let options = template
        .clone()
        .with_destroy_after(params.destroy_after())
        .with_json_output(true);

    let output = terraform_apply(provisioner, dir, &options, |output| {
        info!("{}", output.to_pretty());
        output.clone()
    })
    .await?;

    Ok(output)
}

/// Run every case sequentially, each bounded by `timeout`.
///
/// A failing or timed-out case is recorded and the next case still runs.
/// Dropping a timed-out case also drops its provisioner future, which kills
/// any child process it spawned.
pub async fn run_matrix<P: Provisioner>(
    provisioner: &P,
    dir: &Path,
    template: &ApplyOptions,
    cases: &[RunCase],
    timeout: Duration,
) -> MatrixReport {
    let mut report = MatrixReport {
        workspace: dir.display().to_string(),
        cases: Vec::with_capacity(cases.len()),
    };

    for case in cases {
        let run_id = Uuid::new_v4();
        let span = info_span!("case", id = %case.id, run_id = %run_id);

        let outcome = async {
            info!(provider_version = %case.params.provider_version, "starting case");
            let started = Instant::now();

            let result = match tokio::time::timeout(
                timeout,
                prepare_and_run(provisioner, dir, template, &case.params),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ProvisionError::Timeout {
                    secs: timeout.as_secs(),
                }
                .into()),
            };

            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            match &result {
                Ok(_) => info!(elapsed_ms, "case passed"),
                Err(e) => error!(elapsed_ms, error = %e, "case failed"),
            }

            CaseOutcome {
                id: case.id.clone(),
                provider_version: case.params.provider_version.clone(),
                run_id: run_id.to_string(),
                passed: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
                elapsed_ms,
            }
        }
        .instrument(span)
        .await;

        report.cases.push(outcome);
    }

    info!(
        total = report.cases.len(),
        failed = report.failed(),
        "matrix finished"
    );
    report
}

/// Result of one matrix case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub id: String,
    pub provider_version: String,
    pub run_id: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

/// Outcome of a whole [`run_matrix`] call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatrixReport {
    pub workspace: String,
    pub cases: Vec<CaseOutcome>,
}

impl MatrixReport {
    pub fn failed(&self) -> usize {
        self.cases.iter().filter(|c| !c.passed).count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

impl Render for MatrixReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Matrix: {}", self.workspace.bold())?;
        writeln!(
            w,
            "{:<12} {:<14} {:<6} {:>10}",
            "CASE", "PROVIDER", "RESULT", "ELAPSED"
        )?;
        for case in &self.cases {
            let result = if case.passed {
                "PASS".green().bold()
            } else {
                "FAIL".red().bold()
            };
            writeln!(
                w,
                "{:<12} {:<14} {:<6} {:>8}ms",
                case.id, case.provider_version, result, case.elapsed_ms
            )?;
            if let Some(ref err) = case.error {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        writeln!(w)?;
        writeln!(
            w,
            "{} passed, {} failed",
            self.cases.len() - self.failed(),
            self.failed()
        )?;
        Ok(())
    }
}
