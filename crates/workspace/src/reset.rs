//! 캐시 아티팩트 삭제
//!
//! 이전 실행이 남긴 `.terraform/` 디렉토리와 `.terraform.lock.hcl` 파일을 지웁니다.
//! 이미 없는 경로는 에러가 아닙니다. 다른 프로세스가 먼저 지웠을 수 있으므로
//! 조회/삭제 중 `NotFound`는 성공으로 취급하고, 그 외 에러(권한 등)는 전파합니다.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use tfprobe_core::error::WorkspaceError;

pub use tfprobe_core::config::STATE_ARTIFACTS;

/// 단일 경로 삭제 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// 디렉토리를 재귀적으로 삭제함
    Directory,
    /// 파일(또는 심볼릭 링크)을 삭제함
    File,
    /// 경로가 존재하지 않음
    Absent,
}

/// [`reset_workspace`] 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetReport {
    /// 실제로 삭제된 경로
    pub removed: Vec<PathBuf>,
}

impl ResetReport {
    pub fn is_clean_noop(&self) -> bool {
        self.removed.is_empty()
    }
}

/// 경로 하나를 삭제합니다.
///
/// 디렉토리면 재귀 삭제, 그 외에는 `remove_file`을 사용합니다.
/// 심볼릭 링크는 따라가지 않고 링크 자체를 지웁니다.
pub async fn remove_artifact(path: &Path) -> Result<Removal, WorkspaceError> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Removal::Absent),
        Err(source) => {
            return Err(WorkspaceError::Remove {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let (result, removal) = if metadata.is_dir() {
        (tokio::fs::remove_dir_all(path).await, Removal::Directory)
    } else {
        (tokio::fs::remove_file(path).await, Removal::File)
    };

    match result {
        Ok(()) => Ok(removal),
        // 조회와 삭제 사이에 다른 프로세스가 먼저 지운 경우
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Removal::Absent),
        Err(source) => Err(WorkspaceError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// 워크스페이스의 모든 캐시 아티팩트를 삭제합니다.
///
/// 연속으로 여러 번 호출해도 안전합니다.
pub async fn reset_workspace(dir: &Path) -> Result<ResetReport, WorkspaceError> {
    let mut report = ResetReport::default();
    for artifact in STATE_ARTIFACTS {
        let path = dir.join(artifact);
        match remove_artifact(&path).await? {
            Removal::Absent => {
                debug!(path = %path.display(), "state artifact already absent");
            }
            removal => {
                debug!(path = %path.display(), ?removal, "removed state artifact");
                report.removed.push(path);
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed_artifacts(dir: &Path) {
        let cache = dir.join(".terraform/providers/registry.terraform.io");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("marker"), "cached").unwrap();
        std::fs::write(dir.join(".terraform.lock.hcl"), "# lock").unwrap();
    }

    #[tokio::test]
    async fn remove_artifact_missing_path_is_absent() {
        let temp = TempDir::new().unwrap();
        let removal = remove_artifact(&temp.path().join(".terraform")).await.unwrap();
        assert_eq!(removal, Removal::Absent);
    }

    #[tokio::test]
    async fn remove_artifact_deletes_directory_recursively() {
        let temp = TempDir::new().unwrap();
        seed_artifacts(temp.path());
        let path = temp.path().join(".terraform");
        assert_eq!(remove_artifact(&path).await.unwrap(), Removal::Directory);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn remove_artifact_deletes_regular_file() {
        let temp = TempDir::new().unwrap();
        seed_artifacts(temp.path());
        let path = temp.path().join(".terraform.lock.hcl");
        assert_eq!(remove_artifact(&path).await.unwrap(), Removal::File);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn remove_artifact_removes_symlink_not_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("real-cache");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();
        let link = temp.path().join(".terraform");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(remove_artifact(&link).await.unwrap(), Removal::File);
        assert!(!link.exists());
        assert!(target.join("keep").exists());
    }

    #[tokio::test]
    async fn remove_artifact_propagates_not_a_directory() {
        // 워크스페이스 자리에 일반 파일이 있으면 ENOTDIR, NotFound가 아니므로 전파
        let temp = TempDir::new().unwrap();
        let bogus_dir = temp.path().join("not-a-dir");
        std::fs::write(&bogus_dir, "file").unwrap();

        let err = remove_artifact(&bogus_dir.join(".terraform"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::Remove { .. }));
        assert_ne!(err.io_kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn reset_reports_removed_paths() {
        let temp = TempDir::new().unwrap();
        seed_artifacts(temp.path());
        let report = reset_workspace(temp.path()).await.unwrap();
        assert_eq!(report.removed.len(), 2);
        assert!(report.removed.contains(&temp.path().join(".terraform")));
        assert!(report.removed.contains(&temp.path().join(".terraform.lock.hcl")));
    }

    #[tokio::test]
    async fn reset_on_clean_directory_is_noop() {
        let temp = TempDir::new().unwrap();
        let report = reset_workspace(temp.path()).await.unwrap();
        assert!(report.is_clean_noop());
    }
}
