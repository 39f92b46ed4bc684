//! terraform apply/destroy 라이프사이클
//!
//! # Module Structure
//!
//! - [`provisioner`]: 외부 협력자 추상화 (`Provisioner` trait, `ApplyOptions`)
//! - [`terraform`]: `terraform` 실행 파일을 호출하는 구현 (`TerraformCli`)
//! - [`lifecycle`]: apply → 본문 → destroy 스코프 (`terraform_apply`)
//! - `mock`: 호출 순서를 기록하는 테스트 더블 (`test-util` feature)
//!
//! # Architecture
//!
//! ```text
//!   terraform_apply ──> Provisioner (trait)
//!                         │        │
//!                         ▼        ▼
//!                  TerraformCli  MockProvisioner
//!                         │
//!                         ▼
//!                   terraform binary
//! ```

pub mod lifecycle;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod provisioner;
pub mod terraform;

pub use lifecycle::terraform_apply;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{ApplySnapshot, MockProvisioner, ProvisionCall};
pub use provisioner::{ApplyOptions, Provisioner};
pub use terraform::TerraformCli;
