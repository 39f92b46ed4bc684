//! 도메인 타입: 실행 파라미터, 매트릭스 케이스, apply 결과
//!
//! 이 모듈의 타입은 모든 크레이트가 공유하는 기본 데이터 구조입니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 한 번의 프로비저닝 실행에 사용되는 파라미터
///
/// 실행마다 불변이며, 생성 파일(`terraform.tfvars`, `terraform.tf`)의 내용을 결정합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    /// 클라우드 리전 (예: `us-east-1`)
    pub region: String,
    /// assume할 IAM 역할 ARN (없으면 `role_arn` 줄을 생성하지 않음)
    pub role_arn: Option<String>,
    /// 프로바이더 버전 제약 (예: `~> 6.0`)
    pub provider_version: String,
    /// 실행 후 리소스를 남겨둘지 여부
    pub keep_after: bool,
}

impl RunParams {
    /// 새 실행 파라미터를 생성합니다.
    ///
    /// 빈 문자열 `role_arn`은 `None`으로 정규화됩니다.
    pub fn new(
        region: impl Into<String>,
        role_arn: Option<String>,
        provider_version: impl Into<String>,
        keep_after: bool,
    ) -> Self {
        Self {
            region: region.into(),
            role_arn: role_arn.filter(|arn| !arn.trim().is_empty()),
            provider_version: provider_version.into(),
            keep_after,
        }
    }

    /// 필수 값이 비어 있지 않은지 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "region".to_owned(),
                reason: "region must not be empty".to_owned(),
            });
        }
        if self.provider_version.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "provider_version".to_owned(),
                reason: "provider version constraint must not be empty".to_owned(),
            });
        }
        Ok(())
    }

    /// 실제로 사용할 role ARN (비어 있으면 `None`)
    pub fn role_arn(&self) -> Option<&str> {
        self.role_arn
            .as_deref()
            .filter(|arn| !arn.trim().is_empty())
    }

    /// apply 이후 destroy를 수행해야 하는지 여부
    pub fn destroy_after(&self) -> bool {
        !self.keep_after
    }
}

/// 실행 매트릭스의 한 행
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCase {
    /// 케이스 식별자 (예: `aws-6`)
    pub id: String,
    /// 이 케이스의 실행 파라미터
    pub params: RunParams,
}

impl RunCase {
    pub fn new(id: impl Into<String>, params: RunParams) -> Self {
        Self {
            id: id.into(),
            params,
        }
    }
}

/// 버전 제약에서 케이스 식별자를 유도합니다.
///
/// 첫 번째 숫자 구성요소(major)를 사용합니다: `~> 5.31` → `aws-5`.
/// 숫자가 없으면 공백/연산자를 제거한 문자열을 사용합니다.
pub fn case_id_for(provider: &str, constraint: &str) -> String {
    let major: String = constraint
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if major.is_empty() {
        let compact: String = constraint
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
            .collect();
        format!("{provider}-{compact}")
    } else {
        format!("{provider}-{major}")
    }
}

/// 외부 apply 협력자가 반환한 구조화된 출력
///
/// 형태에 대한 불변식은 없으며, 로그로 출력하기 위해서만 사용됩니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplyOutput(pub serde_json::Value);

impl ApplyOutput {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }

    /// 최상위 출력 이름 → `value` 필드 조회
    ///
    /// `terraform output -json`은 `{"name": {"sensitive", "type", "value"}}` 형태입니다.
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name).and_then(|entry| entry.get("value"))
    }

    /// 4칸 들여쓰기 JSON 문자열로 렌더링합니다.
    pub fn to_pretty(&self) -> String {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        match serde::Serialize::serialize(&self.0, &mut ser) {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            // Value 직렬화는 실패하지 않지만, 실패해도 로그 출력은 유지
            Err(_) => self.0.to_string(),
        }
    }
}

impl fmt::Display for ApplyOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pretty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_role_arn_is_normalized_to_none() {
        let params = RunParams::new("us-east-1", Some("  ".to_owned()), "~> 6.0", false);
        assert!(params.role_arn.is_none());
        assert!(params.role_arn().is_none());
    }

    #[test]
    fn validate_rejects_empty_region() {
        let params = RunParams::new("", None, "~> 6.0", false);
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("region"));
    }

    #[test]
    fn validate_rejects_empty_provider_version() {
        let params = RunParams::new("us-east-1", None, " ", false);
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("provider_version"));
    }

    #[test]
    fn destroy_after_is_inverse_of_keep_after() {
        assert!(RunParams::new("us-east-1", None, "~> 6.0", false).destroy_after());
        assert!(!RunParams::new("us-east-1", None, "~> 6.0", true).destroy_after());
    }

    #[test]
    fn case_id_uses_major_version() {
        assert_eq!(case_id_for("aws", "~> 5.31"), "aws-5");
        assert_eq!(case_id_for("aws", "~> 6.0"), "aws-6");
        assert_eq!(case_id_for("aws", ">= 10.2, < 11"), "aws-10");
        assert_eq!(case_id_for("aws", "latest"), "aws-latest");
    }

    #[test]
    fn to_pretty_uses_four_space_indent() {
        let output = ApplyOutput::new(serde_json::json!({
            "bucket": { "sensitive": false, "type": "string", "value": "b-1" }
        }));
        let text = output.to_pretty();
        assert!(text.contains("\n    \"bucket\": {"));
        assert!(text.contains("\n        \"value\": \"b-1\""));
    }

    #[test]
    fn get_reads_nested_value_field() {
        let output = ApplyOutput::new(serde_json::json!({
            "vpc_id": { "sensitive": false, "type": "string", "value": "vpc-123" }
        }));
        assert_eq!(output.get("vpc_id"), Some(&serde_json::json!("vpc-123")));
        assert!(output.get("missing").is_none());
    }
}
