//! Integration tests for `tfprobe run`, `prepare` and `reset` against a
//! fake `terraform` shell script.
//!
//! The script is written and executed right away, so these tests run
//! serially to avoid ETXTBSY.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use tfprobe_cli::cli::{OutputFormat, ParamOverrides, PrepareArgs, RunArgs};
use tfprobe_cli::commands;
use tfprobe_cli::error::CliError;
use tfprobe_cli::output::OutputWriter;

struct Fixture {
    root: TempDir,
    config_path: PathBuf,
    log: PathBuf,
}

impl Fixture {
    /// `fail_on` names the subcommand the fake binary fails on.
    fn new(fail_on: Option<&str>) -> Self {
        let root = TempDir::new().expect("should create temp dir");
        let log = root.path().join("calls.log");
        let binary = root.path().join("terraform");
        let script = format!(
            r#"#!/bin/sh
echo "$*" >> "{log}"
if [ "$1" = "{fail}" ]; then
  echo "Error: simulated $1 failure" >&2
  exit 1
fi
if [ "$1" = "output" ]; then
  printf '%s\n' '{{"id":{{"value":"ok"}}}}'
fi
exit 0
"#,
            log = log.display(),
            fail = fail_on.unwrap_or("__never__"),
        );
        fs::write(&binary, script).expect("should write fake terraform");
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755))
            .expect("should chmod fake terraform");

        let module = root.path().join("modules/test_module");
        fs::create_dir_all(module.join(".terraform")).expect("should seed .terraform");
        fs::write(module.join(".terraform.lock.hcl"), "# stale").expect("should seed lock");
        fs::write(module.join("main.tf"), "").expect("should write module");

        let config_path = root.path().join("tfprobe.toml");
        fs::write(
            &config_path,
            format!(
                r#"
[terraform]
binary = "{binary}"
root_dir = "{root}"
module = "test_module"
timeout_secs = 60

[run]
region = "us-west-2"
"#,
                binary = binary.display(),
                root = root.path().join("modules").display(),
            ),
        )
        .expect("should write config");

        Self {
            root,
            config_path,
            log,
        }
    }

    fn module(&self) -> PathBuf {
        self.root.path().join("modules/test_module")
    }

    fn subcommands(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(|l| l.split_whitespace().next().unwrap_or_default().to_owned())
            .collect()
    }
}

fn run_args(cases: &[&str]) -> RunArgs {
    RunArgs {
        overrides: ParamOverrides::default(),
        cases: cases.iter().map(|c| (*c).to_owned()).collect(),
        keep_after: false,
        timeout_secs: None,
    }
}

fn writer() -> OutputWriter {
    OutputWriter::new(OutputFormat::Json)
}

fn assert_reset(dir: &Path) {
    assert!(!dir.join(".terraform").exists());
    assert!(!dir.join(".terraform.lock.hcl").exists());
}

#[tokio::test]
#[serial]
async fn test_run_applies_and_destroys_every_case() {
    let fixture = Fixture::new(None);

    commands::run::execute(run_args(&[]), &fixture.config_path, &writer())
        .await
        .expect("run should succeed");

    let lifecycle = ["init", "apply", "output", "destroy"];
    let expected: Vec<String> = lifecycle
        .iter()
        .chain(lifecycle.iter())
        .map(|s| (*s).to_owned())
        .collect();
    assert_eq!(fixture.subcommands(), expected);

    let pin = fs::read_to_string(fixture.module().join("terraform.tf")).expect("pin written");
    assert!(pin.contains("version = \"~> 6.0\""), "last case wins: {pin}");
    let tfvars =
        fs::read_to_string(fixture.module().join("terraform.tfvars")).expect("tfvars written");
    assert_eq!(tfvars, "region          = \"us-west-2\"\n");
}

#[tokio::test]
#[serial]
async fn test_run_single_case_keep_after() {
    let fixture = Fixture::new(None);
    let mut args = run_args(&["aws-5"]);
    args.keep_after = true;

    commands::run::execute(args, &fixture.config_path, &writer())
        .await
        .expect("run should succeed");

    assert_eq!(fixture.subcommands(), vec!["init", "apply", "output"]);
    let pin = fs::read_to_string(fixture.module().join("terraform.tf")).expect("pin written");
    assert!(pin.contains("version = \"~> 5.31\""));
}

#[tokio::test]
#[serial]
async fn test_run_failing_apply_exits_with_cases_failed() {
    let fixture = Fixture::new(Some("apply"));

    let err = commands::run::execute(run_args(&[]), &fixture.config_path, &writer())
        .await
        .unwrap_err();

    match err {
        CliError::CasesFailed { failed, total } => {
            assert_eq!(CliError::CasesFailed { failed, total }.exit_code(), 4);
            assert_eq!(failed, 2);
            assert_eq!(total, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    // every failed apply is still followed by a destroy
    assert_eq!(
        fixture.subcommands(),
        vec!["init", "apply", "destroy", "init", "apply", "destroy"]
    );
}

#[tokio::test]
#[serial]
async fn test_run_unknown_case_is_rejected_before_any_work() {
    let fixture = Fixture::new(None);

    let err = commands::run::execute(run_args(&["aws-4"]), &fixture.config_path, &writer())
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::Command(_)));
    assert!(fixture.subcommands().is_empty());
    assert!(fixture.module().join(".terraform").exists());
}

#[tokio::test]
#[serial]
async fn test_prepare_writes_files_without_terraform() {
    let fixture = Fixture::new(None);
    let args = PrepareArgs {
        overrides: ParamOverrides {
            provider_versions: vec!["~> 6.0".to_owned()],
            region: None,
            role_arn: Some("arn:aws:iam::123456789012:role/ci".to_owned()),
        },
        case: None,
    };

    commands::prepare::execute(args, &fixture.config_path, &writer())
        .await
        .expect("prepare should succeed");

    assert_reset(&fixture.module());
    assert!(fixture.subcommands().is_empty());
    let tfvars =
        fs::read_to_string(fixture.module().join("terraform.tfvars")).expect("tfvars written");
    assert_eq!(
        tfvars,
        "region          = \"us-west-2\"\nrole_arn      = \"arn:aws:iam::123456789012:role/ci\"\n"
    );
}

#[tokio::test]
#[serial]
async fn test_reset_only_removes_cached_state() {
    let fixture = Fixture::new(None);
    fs::write(fixture.module().join("terraform.tfvars"), "keep").expect("should write tfvars");

    commands::reset::execute(&fixture.config_path, &writer())
        .await
        .expect("reset should succeed");

    assert_reset(&fixture.module());
    assert!(fixture.module().join("main.tf").exists());
    assert!(fixture.module().join("terraform.tfvars").exists());

    // idempotent
    commands::reset::execute(&fixture.config_path, &writer())
        .await
        .expect("second reset should succeed");
}
