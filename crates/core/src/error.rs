//! 에러 타입: 도메인별 에러 정의
//!
//! 캐시 아티팩트가 이미 없는 경우(`NotFound`)를 제외한 모든 실패는
//! 이 타입들로 감싸져 호출자까지 그대로 전파됩니다.

use std::path::PathBuf;

/// tfprobe 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum TfprobeError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 워크스페이스 초기화/파일 생성 에러
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// 프로비저닝(apply/destroy) 에러
    #[error("provision error: {0}")]
    Provision(#[from] ProvisionError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 워크스페이스 에러
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// 캐시 아티팩트 삭제 실패 (`NotFound`는 여기에 포함되지 않음)
    #[error("failed to remove {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 생성 파일 쓰기 실패
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceError {
    /// 원인이 된 I/O 에러 종류
    pub fn io_kind(&self) -> std::io::ErrorKind {
        match self {
            Self::Remove { source, .. } | Self::Write { source, .. } => source.kind(),
        }
    }
}

/// 프로비저닝 에러
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// 외부 명령 실행 실패
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// 외부 명령이 0이 아닌 코드로 종료
    #[error("'{command}' exited with {}: {stderr_tail}", .code.map_or_else(|| "signal".to_owned(), |c| format!("code {c}")))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr_tail: String,
    },

    /// `terraform output -json` 결과 파싱 실패
    #[error("failed to parse terraform output: {0}")]
    OutputParse(String),

    /// 실행 시간 초과
    #[error("run exceeded {secs}s timeout")]
    Timeout { secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_error_reports_path_and_kind() {
        let err = WorkspaceError::Remove {
            path: PathBuf::from("/tmp/ws/.terraform"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.io_kind(), std::io::ErrorKind::PermissionDenied);
        assert!(err.to_string().contains("/tmp/ws/.terraform"));
    }

    #[test]
    fn command_failed_display_includes_exit_code() {
        let err = ProvisionError::CommandFailed {
            command: "terraform apply".to_owned(),
            code: Some(1),
            stderr_tail: "Error: no credentials".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("code 1"));
        assert!(msg.contains("no credentials"));
    }

    #[test]
    fn command_failed_display_without_code_mentions_signal() {
        let err = ProvisionError::CommandFailed {
            command: "terraform destroy".to_owned(),
            code: None,
            stderr_tail: String::new(),
        };
        assert!(err.to_string().contains("signal"));
    }

    #[test]
    fn provision_error_converts_into_top_level() {
        let err: TfprobeError = ProvisionError::Timeout { secs: 5 }.into();
        assert!(matches!(
            err,
            TfprobeError::Provision(ProvisionError::Timeout { secs: 5 })
        ));
    }
}
