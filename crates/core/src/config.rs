//! 설정 관리: tfprobe.toml 파싱 및 런타임 설정
//!
//! [`TfprobeConfig`]는 로깅, terraform 실행, 실행 매트릭스 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`TFPROBE_RUN_REGION=eu-west-1` 형식)
//! 3. 설정 파일 (`tfprobe.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), tfprobe_core::error::TfprobeError> {
//! use tfprobe_core::config::TfprobeConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = TfprobeConfig::load("tfprobe.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = TfprobeConfig::parse("[run]\nregion = \"eu-west-1\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, TfprobeError};
use crate::types::{RunCase, RunParams, case_id_for};

/// 생성되는 프로바이더 이름 (케이스 ID 접두사로도 사용)
pub const PROVIDER_NAME: &str = "aws";

/// 매 실행 전에 지우는 캐시 아티팩트 (워크스페이스 기준 상대 경로)
pub const STATE_ARTIFACTS: [&str; 2] = [".terraform", ".terraform.lock.hcl"];

/// 프로바이더 버전을 고정하는 생성 파일 이름
pub const PROVIDER_PIN_FILE: &str = "terraform.tf";

/// tfprobe 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfprobeConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// terraform 실행 설정
    #[serde(default)]
    pub terraform: TerraformConfig,
    /// 실행 매트릭스 설정
    #[serde(default)]
    pub run: RunConfig,
}

impl TfprobeConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TfprobeError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값을 사용합니다.
    ///
    /// 설정 파일 없이도 기본 매트릭스(`aws-5`, `aws-6`)로 실행할 수 있게 합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, TfprobeError> {
        let path = path.as_ref();
        match Self::load(path).await {
            Err(TfprobeError::Config(ConfigError::FileNotFound { .. })) => {
                warn!(path = %path.display(), "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TfprobeError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TfprobeError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                TfprobeError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, TfprobeError> {
        toml::from_str(toml_str).map_err(|e| {
            TfprobeError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `TFPROBE_{SECTION}_{FIELD}`
    /// 예: `TFPROBE_RUN_KEEP_AFTER=true`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "TFPROBE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "TFPROBE_GENERAL_LOG_FORMAT");

        // Terraform
        override_string(&mut self.terraform.binary, "TFPROBE_TERRAFORM_BINARY");
        override_path(&mut self.terraform.root_dir, "TFPROBE_TERRAFORM_ROOT_DIR");
        override_string(&mut self.terraform.module, "TFPROBE_TERRAFORM_MODULE");
        override_string(&mut self.terraform.var_file, "TFPROBE_TERRAFORM_VAR_FILE");
        override_bool(&mut self.terraform.trace, "TFPROBE_TERRAFORM_TRACE");
        override_u64(
            &mut self.terraform.timeout_secs,
            "TFPROBE_TERRAFORM_TIMEOUT_SECS",
        );

        // Run
        override_string(&mut self.run.region, "TFPROBE_RUN_REGION");
        override_string(&mut self.run.role_arn, "TFPROBE_RUN_ROLE_ARN");
        override_bool(&mut self.run.keep_after, "TFPROBE_RUN_KEEP_AFTER");
        if let Ok(val) = std::env::var("TFPROBE_RUN_PROVIDER_VERSIONS") {
            let versions = split_csv(&val);
            if versions.is_empty() {
                warn!(
                    env_key = "TFPROBE_RUN_PROVIDER_VERSIONS",
                    "empty provider version list in env var, ignoring"
                );
            } else {
                self.run.cases = cases_from_versions(&versions);
            }
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), TfprobeError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.terraform.binary.trim().is_empty() {
            return Err(invalid("terraform.binary", "must not be empty"));
        }
        if self.terraform.module.trim().is_empty() {
            return Err(invalid("terraform.module", "must not be empty"));
        }
        if self.terraform.var_file.trim().is_empty() {
            return Err(invalid("terraform.var_file", "must not be empty"));
        }
        if self.terraform.timeout_secs == 0 {
            return Err(invalid("terraform.timeout_secs", "must be greater than 0"));
        }

        if self.run.region.trim().is_empty() {
            return Err(invalid("run.region", "must not be empty"));
        }
        if self.run.cases.is_empty() {
            return Err(invalid("run.cases", "at least one case is required"));
        }

        let mut seen = HashSet::new();
        for case in &self.run.cases {
            if case.id.trim().is_empty() {
                return Err(invalid("run.cases.id", "must not be empty"));
            }
            if !seen.insert(case.id.as_str()) {
                return Err(invalid(
                    "run.cases.id",
                    format!("duplicate case id '{}'", case.id),
                ));
            }
            if case.provider_version.trim().is_empty() {
                return Err(invalid(
                    "run.cases.provider_version",
                    format!("case '{}' has an empty provider version", case.id),
                ));
            }
        }

        Ok(())
    }

    /// 모듈 워크스페이스 디렉토리 (`root_dir/module`)
    pub fn workspace_dir(&self) -> PathBuf {
        self.terraform.root_dir.join(&self.terraform.module)
    }

    /// 설정된 매트릭스를 실행 케이스 목록으로 변환합니다.
    pub fn run_cases(&self) -> Vec<RunCase> {
        let role_arn = Some(self.run.role_arn.clone());
        self.run
            .cases
            .iter()
            .map(|case| {
                RunCase::new(
                    case.id.clone(),
                    RunParams::new(
                        self.run.region.clone(),
                        role_arn.clone(),
                        case.provider_version.clone(),
                        self.run.keep_after,
                    ),
                )
            })
            .collect()
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// terraform 실행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformConfig {
    /// terraform 실행 파일 경로 또는 이름
    pub binary: String,
    /// 테스트 모듈들이 위치한 루트 디렉토리
    pub root_dir: PathBuf,
    /// 테스트할 모듈 디렉토리 이름
    pub module: String,
    /// 생성할 변수 파일 이름
    pub var_file: String,
    /// `TF_LOG=JSON` 트레이스 활성화
    pub trace: bool,
    /// 케이스당 최대 실행 시간 (초)
    pub timeout_secs: u64,
}

impl TerraformConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            binary: "terraform".to_owned(),
            root_dir: PathBuf::from("test_data"),
            module: "test_module".to_owned(),
            var_file: "terraform.tfvars".to_owned(),
            trace: false,
            timeout_secs: 3600,
        }
    }
}

/// 실행 매트릭스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// 클라우드 리전
    pub region: String,
    /// assume할 역할 ARN (빈 문자열 = 미지정)
    pub role_arn: String,
    /// 실행 후 리소스 유지 여부
    pub keep_after: bool,
    /// 프로바이더 버전 매트릭스
    pub cases: Vec<CaseConfig>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_owned(),
            role_arn: String::new(),
            keep_after: false,
            cases: cases_from_versions(&["~> 5.31".to_owned(), "~> 6.0".to_owned()]),
        }
    }
}

/// 매트릭스의 한 행
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseConfig {
    /// 케이스 식별자
    pub id: String,
    /// 프로바이더 버전 제약
    pub provider_version: String,
}

/// 버전 제약 목록으로 케이스 목록을 만듭니다.
///
/// ID는 major 버전에서 유도하며, 충돌하면 순번을 붙입니다.
pub fn cases_from_versions(versions: &[String]) -> Vec<CaseConfig> {
    let mut seen: HashSet<String> = HashSet::new();
    versions
        .iter()
        .map(|version| {
            let base = case_id_for(PROVIDER_NAME, version);
            let mut id = base.clone();
            let mut n = 2;
            while !seen.insert(id.clone()) {
                id = format!("{base}-{n}");
                n += 1;
            }
            CaseConfig {
                id,
                provider_version: version.clone(),
            }
        })
        .collect()
}

fn invalid(field: &str, reason: impl Into<String>) -> TfprobeError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_path(target: &mut PathBuf, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = PathBuf::from(val);
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn split_csv(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}
