//! 외부 apply/destroy 협력자 추상화
//!
//! [`Provisioner`] trait은 프로비저닝 도구 호출을 감싸며,
//! 운영 코드는 [`TerraformCli`](crate::TerraformCli), 테스트는 `MockProvisioner`를 사용합니다.

use std::future::Future;
use std::path::Path;

use tfprobe_core::config::TerraformConfig;
use tfprobe_core::error::ProvisionError;
use tfprobe_core::types::ApplyOutput;

/// apply/destroy 호출 옵션
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    /// 스코프 종료 시 destroy 수행 여부
    pub destroy_after: bool,
    /// apply 후 `output -json` 결과 수집 여부
    pub json_output: bool,
    /// apply/destroy에 전달할 변수 파일 (워크스페이스 기준 상대 경로)
    pub var_file: String,
    /// `TF_LOG=JSON` 트레이스 활성화
    pub trace: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            destroy_after: true,
            json_output: true,
            var_file: "terraform.tfvars".to_owned(),
            trace: false,
        }
    }
}

impl ApplyOptions {
    /// `[terraform]` 설정의 변수 파일/트레이스 값을 사용합니다.
    pub fn from_config(config: &TerraformConfig) -> Self {
        Self::default()
            .with_var_file(config.var_file.clone())
            .with_trace(config.trace)
    }

    pub fn with_destroy_after(mut self, destroy_after: bool) -> Self {
        self.destroy_after = destroy_after;
        self
    }

    pub fn with_json_output(mut self, json_output: bool) -> Self {
        self.json_output = json_output;
        self
    }

    pub fn with_var_file(mut self, var_file: impl Into<String>) -> Self {
        self.var_file = var_file.into();
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

/// 프로비저닝 도구 추상화
///
/// 구현체는 `dir`을 작업 디렉토리로 사용해야 합니다.
/// destroy 보장은 구현체가 아닌 [`terraform_apply`](crate::terraform_apply)가 담당합니다.
pub trait Provisioner: Send + Sync {
    /// 모듈을 초기화하고 적용한 뒤 출력을 반환합니다.
    ///
    /// `json_output`이 꺼져 있으면 `ApplyOutput::default()`(null)를 반환합니다.
    ///
    /// # Errors
    ///
    /// - `ProvisionError::Spawn`: 실행 파일을 시작할 수 없음
    /// - `ProvisionError::CommandFailed`: init/apply/output 중 하나가 실패
    /// - `ProvisionError::OutputParse`: 출력이 JSON이 아님
    fn apply(
        &self,
        dir: &Path,
        options: &ApplyOptions,
    ) -> impl Future<Output = Result<ApplyOutput, ProvisionError>> + Send;

    /// 모듈이 만든 리소스를 모두 제거합니다.
    fn destroy(
        &self,
        dir: &Path,
        options: &ApplyOptions,
    ) -> impl Future<Output = Result<(), ProvisionError>> + Send;
}
