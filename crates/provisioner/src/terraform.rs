//! `terraform` 실행 파일 기반 프로비저너
//!
//! 모든 명령은 워크스페이스 디렉토리에서 비대화식으로 실행됩니다
//! (`TF_IN_AUTOMATION=1`, `-input=false`, `-no-color`).
//! init/apply/destroy 출력은 줄 단위로 `debug` 로그에 전달하고,
//! 실패 시 stderr 마지막 몇 줄을 에러에 담습니다.

use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use tfprobe_core::config::TerraformConfig;
use tfprobe_core::error::ProvisionError;
use tfprobe_core::types::ApplyOutput;

use crate::provisioner::{ApplyOptions, Provisioner};

/// 에러 메시지에 포함할 stderr 줄 수
const STDERR_TAIL_LINES: usize = 20;

/// `terraform` CLI 프로비저너
#[derive(Debug, Clone)]
pub struct TerraformCli {
    binary: String,
}

impl TerraformCli {
    /// 실행 파일 이름 또는 경로로 생성합니다.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn from_config(config: &TerraformConfig) -> Self {
        Self::new(config.binary.clone())
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn command(&self, dir: &Path, options: &ApplyOptions, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .current_dir(dir)
            .env("TF_IN_AUTOMATION", "1")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if options.trace {
            cmd.env("TF_LOG", "JSON");
        }
        cmd
    }

    fn display(&self, args: &[String]) -> String {
        format!("{} {}", self.binary, args.join(" "))
    }

    /// 명령을 실행하며 출력을 로그로 흘려보냅니다.
    async fn run_streaming(
        &self,
        dir: &Path,
        options: &ApplyOptions,
        args: Vec<String>,
    ) -> Result<(), ProvisionError> {
        let command = self.display(&args);
        info!(command = %command, dir = %dir.display(), "running terraform");

        let mut child = self
            .command(dir, options, &args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProvisionError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (_, stderr_tail, status) = tokio::join!(
            forward_lines(stdout, "stdout", 0),
            forward_lines(stderr, "stderr", STDERR_TAIL_LINES),
            child.wait(),
        );
        let status = status.map_err(|source| ProvisionError::Spawn {
            command: command.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ProvisionError::CommandFailed {
                command,
                code: status.code(),
                stderr_tail,
            })
        }
    }

    /// `terraform output -json` 결과를 파싱합니다.
    async fn collect_output(
        &self,
        dir: &Path,
        options: &ApplyOptions,
    ) -> Result<ApplyOutput, ProvisionError> {
        let args = to_args(&["output", "-no-color", "-json"]);
        let command = self.display(&args);
        debug!(command = %command, "collecting terraform outputs");

        let output = self
            .command(dir, options, &args)
            .output()
            .await
            .map_err(|source| ProvisionError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProvisionError::CommandFailed {
                command,
                code: output.status.code(),
                stderr_tail: tail_of(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_LINES),
            });
        }

        let value: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ProvisionError::OutputParse(e.to_string()))?;
        Ok(ApplyOutput::new(value))
    }
}

impl Provisioner for TerraformCli {
    async fn apply(
        &self,
        dir: &Path,
        options: &ApplyOptions,
    ) -> Result<ApplyOutput, ProvisionError> {
        self.run_streaming(dir, options, to_args(&["init", "-no-color", "-input=false"]))
            .await?;
        self.run_streaming(dir, options, mutate_args("apply", &options.var_file))
            .await?;
        if options.json_output {
            self.collect_output(dir, options).await
        } else {
            Ok(ApplyOutput::default())
        }
    }

    async fn destroy(&self, dir: &Path, options: &ApplyOptions) -> Result<(), ProvisionError> {
        self.run_streaming(dir, options, mutate_args("destroy", &options.var_file))
            .await
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| (*a).to_owned()).collect()
}

/// apply/destroy 공통 인자
fn mutate_args(subcommand: &str, var_file: &str) -> Vec<String> {
    vec![
        subcommand.to_owned(),
        "-no-color".to_owned(),
        "-input=false".to_owned(),
        "-auto-approve".to_owned(),
        format!("-var-file={var_file}"),
    ]
}

/// 스트림을 줄 단위로 로그에 남기고, 마지막 `keep`줄을 반환합니다.
///
/// UTF-8이 아닌 바이트는 대체 문자로 바꿔 읽으며, EOF까지 계속 읽어
/// 자식 프로세스가 닫힌 파이프에 쓰지 않도록 합니다.
async fn forward_lines<R>(stream: Option<R>, name: &'static str, keep: usize) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return String::new();
    };
    let mut tail: VecDeque<String> = VecDeque::with_capacity(keep);
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let decoded = String::from_utf8_lossy(&buf);
                let line = decoded.trim_end_matches(['\n', '\r']);
                debug!(target: "terraform", stream = name, "{line}");
                if keep > 0 {
                    if tail.len() == keep {
                        tail.pop_front();
                    }
                    tail.push_back(line.to_owned());
                }
            }
            Err(e) => {
                warn!(stream = name, error = %e, "failed to read terraform output");
                break;
            }
        }
    }
    tail.into_iter().collect::<Vec<_>>().join("\n")
}

fn tail_of(text: &str, keep: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(keep);
    lines[start..].join("\n")
}
