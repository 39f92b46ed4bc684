//! 생성 파일 렌더링: `terraform.tfvars`, `terraform.tf`
//!
//! 두 파일은 매 실행마다 덮어쓰며 다시 읽지 않습니다.
//! 문자열 값은 HCL 문자열 리터럴 규칙에 맞게 이스케이프합니다.

use std::path::{Path, PathBuf};

use tracing::debug;

pub use tfprobe_core::config::{PROVIDER_NAME, PROVIDER_PIN_FILE};
use tfprobe_core::error::WorkspaceError;
use tfprobe_core::types::RunParams;


/// 프로바이더 소스 식별자 (고정)
pub const PROVIDER_SOURCE: &str = "hashicorp/aws";

/// [`write_config`]가 쓴 파일 경로
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenConfig {
    pub var_file: PathBuf,
    pub provider_pin: PathBuf,
}

/// 변수 파일 내용을 렌더링합니다.
///
/// `region`은 항상, `role_arn`은 값이 있을 때만 출력합니다.
pub fn render_tfvars(params: &RunParams) -> String {
    let mut out = format!("region          = {}\n", hcl_string(&params.region));
    if let Some(role_arn) = params.role_arn() {
        out.push_str(&format!("role_arn      = {}\n", hcl_string(role_arn)));
    }
    out
}

/// 프로바이더 버전 고정 블록을 렌더링합니다.
pub fn render_provider_pin(provider_version: &str) -> String {
    format!(
        r#"terraform {{
  required_providers {{
    {name} = {{
      source  = {source}
      version = {version}
    }}
  }}
}}
"#,
        name = PROVIDER_NAME,
        source = hcl_string(PROVIDER_SOURCE),
        version = hcl_string(provider_version),
    )
}

/// 두 설정 파일을 워크스페이스에 덮어씁니다.
pub async fn write_config(
    dir: &Path,
    var_file: &str,
    params: &RunParams,
) -> Result<WrittenConfig, WorkspaceError> {
    let var_path = dir.join(var_file);
    write_file(&var_path, render_tfvars(params)).await?;

    let pin_path = dir.join(PROVIDER_PIN_FILE);
    write_file(&pin_path, render_provider_pin(&params.provider_version)).await?;

    debug!(
        var_file = %var_path.display(),
        provider_pin = %pin_path.display(),
        provider_version = %params.provider_version,
        "wrote terraform config"
    );

    Ok(WrittenConfig {
        var_file: var_path,
        provider_pin: pin_path,
    })
}

async fn write_file(path: &Path, content: String) -> Result<(), WorkspaceError> {
    tokio::fs::write(path, content)
        .await
        .map_err(|source| WorkspaceError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// HCL 따옴표 문자열 리터럴
///
/// `\`, `"`, 제어 문자를 이스케이프하고 템플릿 시작(`${`, `%{`)을 두 번 씁니다.
fn hcl_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
