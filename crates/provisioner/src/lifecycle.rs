//! apply → 본문 → destroy 스코프
//!
//! 적용된 인프라를 하나의 리소스로 보고, 스코프를 벗어나는 모든 경로
//! (apply 실패, 본문 패닉, 정상 종료)에서 destroy를 시도합니다.
//! `destroy_after = false`일 때만 제거를 건너뜁니다.
//!
//! 우선순위: apply 실패 > 본문 패닉 > destroy 실패.
//! 먼저 발생한 실패가 반환되고, 뒤따른 destroy 실패는 `error` 로그로만 남습니다.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::{error, info, warn};

use tfprobe_core::error::ProvisionError;
use tfprobe_core::types::ApplyOutput;

use crate::provisioner::{ApplyOptions, Provisioner};

/// 모듈을 적용하고 `body`에 출력을 넘긴 뒤, 필요하면 destroy합니다.
///
/// `body`는 동기 함수이며 apply가 성공했을 때만 호출됩니다.
/// `body`가 패닉하면 destroy를 마친 뒤 패닉을 다시 전파합니다.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), tfprobe_core::ProvisionError> {
/// use std::path::Path;
/// use tfprobe_provisioner::{ApplyOptions, TerraformCli, terraform_apply};
///
/// let tf = TerraformCli::new("terraform");
/// let options = ApplyOptions::default();
/// terraform_apply(&tf, Path::new("test_data/test_module"), &options, |output| {
///     println!("{}", output.to_pretty());
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn terraform_apply<P, F, T>(
    provisioner: &P,
    dir: &Path,
    options: &ApplyOptions,
    body: F,
) -> Result<T, ProvisionError>
where
    P: Provisioner,
    F: FnOnce(&ApplyOutput) -> T,
{
    info!(
        dir = %dir.display(),
        destroy_after = options.destroy_after,
        "applying terraform module"
    );

    let outcome = match provisioner.apply(dir, options).await {
        Ok(output) => Ok(panic::catch_unwind(AssertUnwindSafe(|| body(&output)))),
        Err(e) => {
            error!(dir = %dir.display(), error = %e, "terraform apply failed");
            Err(e)
        }
    };

    if options.destroy_after {
        info!(dir = %dir.display(), "destroying terraform module");
        if let Err(destroy_err) = provisioner.destroy(dir, options).await {
            match &outcome {
                Ok(Ok(_)) => return Err(destroy_err),
                _ => error!(
                    dir = %dir.display(),
                    error = %destroy_err,
                    "terraform destroy failed after an earlier failure"
                ),
            }
        }
    } else {
        warn!(dir = %dir.display(), "keeping provisioned resources after run");
    }

    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(payload)) => panic::resume_unwind(payload),
        Err(e) => Err(e),
    }
}
