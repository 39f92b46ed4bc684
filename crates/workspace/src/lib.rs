//! 모듈 워크스페이스 초기화 및 설정 파일 생성
//!
//! # Module Structure
//!
//! - [`reset`]: 캐시 아티팩트(`.terraform/`, `.terraform.lock.hcl`) 삭제
//! - [`render`]: `terraform.tfvars` / `terraform.tf` 렌더링 및 쓰기
//!
//! # 처리 순서
//!
//! ```text
//! reset_workspace ──> write_config ──> (provisioner.apply)
//! ```
//!
//! [`prepare_workspace`]는 위 두 단계를 순서대로 수행합니다.

pub mod render;
pub mod reset;

use std::path::Path;

use tfprobe_core::error::WorkspaceError;
use tfprobe_core::types::RunParams;

pub use render::{
    PROVIDER_NAME, PROVIDER_PIN_FILE, PROVIDER_SOURCE, WrittenConfig, render_provider_pin,
    render_tfvars, write_config,
};
pub use reset::{Removal, ResetReport, STATE_ARTIFACTS, remove_artifact, reset_workspace};

/// 워크스페이스를 초기화하고 설정 파일 두 개를 새로 씁니다.
///
/// 캐시 삭제가 끝난 뒤에만 파일을 쓰며, 어느 단계든 실패하면 즉시 반환합니다.
pub async fn prepare_workspace(
    dir: &Path,
    var_file: &str,
    params: &RunParams,
) -> Result<(ResetReport, WrittenConfig), WorkspaceError> {
    let report = reset_workspace(dir).await?;
    let written = write_config(dir, var_file, params).await?;
    Ok((report, written))
}
