//! 테스트용 프로비저너
//!
//! 호출 순서와 apply 시점의 워크스페이스 상태를 기록합니다.
//! 클론은 같은 기록을 공유합니다.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tfprobe_core::config::{PROVIDER_PIN_FILE, STATE_ARTIFACTS};
use tfprobe_core::error::ProvisionError;
use tfprobe_core::types::ApplyOutput;

use crate::provisioner::{ApplyOptions, Provisioner};

/// 기록된 호출
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionCall {
    Apply { dir: PathBuf, destroy_after: bool },
    Destroy { dir: PathBuf },
    /// 테스트가 직접 남긴 표식 (예: 스코프 본문 실행)
    Note(String),
}

/// apply 호출 시점의 워크스페이스 상태
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySnapshot {
    /// 존재하던 캐시 아티팩트
    pub state_artifacts: Vec<String>,
    /// 생성 파일 이름 → 내용
    pub files: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct Record {
    calls: Vec<ProvisionCall>,
    snapshots: Vec<ApplySnapshot>,
}

/// 설정 가능한 응답을 돌려주는 `Provisioner` 구현
#[derive(Debug, Clone, Default)]
pub struct MockProvisioner {
    /// apply가 반환할 출력
    pub output: serde_json::Value,
    /// apply 실패 시뮬레이션
    pub fail_apply: bool,
    /// destroy 실패 시뮬레이션
    pub fail_destroy: bool,
    /// apply 지연 (타임아웃 테스트용)
    pub apply_delay: Option<Duration>,
    record: Arc<Mutex<Record>>,
}

impl MockProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, output: serde_json::Value) -> Self {
        self.output = output;
        self
    }

    pub fn with_failing_apply(mut self) -> Self {
        self.fail_apply = true;
        self
    }

    pub fn with_failing_destroy(mut self) -> Self {
        self.fail_destroy = true;
        self
    }

    pub fn with_apply_delay(mut self, delay: Duration) -> Self {
        self.apply_delay = Some(delay);
        self
    }

    /// 기록된 호출 목록
    pub fn calls(&self) -> Vec<ProvisionCall> {
        self.lock().calls.clone()
    }

    /// apply마다 찍은 워크스페이스 스냅샷
    pub fn snapshots(&self) -> Vec<ApplySnapshot> {
        self.lock().snapshots.clone()
    }

    pub fn apply_count(&self) -> usize {
        self.count(|c| matches!(c, ProvisionCall::Apply { .. }))
    }

    pub fn destroy_count(&self) -> usize {
        self.count(|c| matches!(c, ProvisionCall::Destroy { .. }))
    }

    /// 호출 목록에 표식을 남깁니다.
    pub fn record_note(&self, note: &str) {
        self.lock().calls.push(ProvisionCall::Note(note.to_owned()));
    }

    fn count(&self, pred: impl Fn(&ProvisionCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    fn lock(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn snapshot(dir: &Path, var_file: &str) -> ApplySnapshot {
    let state_artifacts = STATE_ARTIFACTS
        .iter()
        .filter(|name| dir.join(name).symlink_metadata().is_ok())
        .map(|name| (*name).to_owned())
        .collect();
    let files = [var_file, PROVIDER_PIN_FILE]
        .into_iter()
        .filter_map(|name| {
            std::fs::read_to_string(dir.join(name))
                .ok()
                .map(|content| (name.to_owned(), content))
        })
        .collect();
    ApplySnapshot {
        state_artifacts,
        files,
    }
}

fn mock_failure(command: &str) -> ProvisionError {
    ProvisionError::CommandFailed {
        command: format!("terraform {command}"),
        code: Some(1),
        stderr_tail: "mock failure".to_owned(),
    }
}

impl Provisioner for MockProvisioner {
    async fn apply(
        &self,
        dir: &Path,
        options: &ApplyOptions,
    ) -> Result<ApplyOutput, ProvisionError> {
        {
            let mut record = self.lock();
            record.calls.push(ProvisionCall::Apply {
                dir: dir.to_path_buf(),
                destroy_after: options.destroy_after,
            });
            record.snapshots.push(snapshot(dir, &options.var_file));
        }

        if let Some(delay) = self.apply_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_apply {
            return Err(mock_failure("apply"));
        }
        if options.json_output {
            Ok(ApplyOutput::new(self.output.clone()))
        } else {
            Ok(ApplyOutput::default())
        }
    }

    async fn destroy(&self, dir: &Path, _options: &ApplyOptions) -> Result<(), ProvisionError> {
        self.lock().calls.push(ProvisionCall::Destroy {
            dir: dir.to_path_buf(),
        });
        if self.fail_destroy {
            return Err(mock_failure("destroy"));
        }
        Ok(())
    }
}
