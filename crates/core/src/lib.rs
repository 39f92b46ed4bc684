//! tfprobe 공통 크레이트
//!
//! - [`error`]: 에러 타입 (`TfprobeError`, `WorkspaceError`, `ProvisionError`)
//! - [`config`]: `tfprobe.toml` 설정 (`TfprobeConfig`)
//! - [`types`]: 도메인 타입 (`RunParams`, `RunCase`, `ApplyOutput`)

pub mod config;
pub mod error;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, ProvisionError, TfprobeError, WorkspaceError};

// 설정
pub use config::TfprobeConfig;

// 도메인 타입
pub use types::{ApplyOutput, RunCase, RunParams};
