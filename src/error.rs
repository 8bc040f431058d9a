//! # 에러 처리 모듈
//!
//! 코스 저작 엔진에서 발생할 수 있는 에러 타입을 정의합니다.
//!
//! 에러는 세 갈래로 나뉩니다:
//! - `ValidationError`: 로컬 검증 실패. 네트워크에 도달하지 않고 동기적으로 보고됩니다.
//! - `RemoteCallError`: 원격 카탈로그 호출 실패. 서버 봉투의 메시지를 담습니다.
//! - `PartialBatchFailure`: 서로 독립적인 일괄 작업 중 일부만 실패한 경우.
//!
//! `AuthoringError`는 세션 API가 반환하는 통합 에러입니다.
//! 어떤 에러도 세션 자체를 망가뜨리지 않으며, 실패 후에도 편집을 계속할 수 있습니다.

use std::fmt;

use thiserror::Error;

use crate::models::MaterialCategory;

/// 서버가 메시지를 주지 않았을 때 사용자에게 보여줄 기본 문구
pub const GENERIC_REMOTE_FAILURE: &str = "Request failed. Please try again.";

/// 로컬 검증 에러. 원격 호출 전에 작업을 막습니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 저장 전에 반드시 채워야 하는 필드가 비어 있음
    #[error("{0} is required")]
    MissingField(&'static str),

    /// 선택한 자료 분류에서 허용하지 않는 확장자
    #[error("{file_name} is not an allowed {category} file")]
    DisallowedExtension {
        file_name: String,
        category: MaterialCategory,
    },

    /// 내용이 비어 있는 파일
    #[error("{0} is empty")]
    EmptyFile(String),

    /// 코스가 아직 한 번도 저장되지 않아 서버 ID가 없음
    #[error("save the course before editing {0}")]
    CourseNotSaved(&'static str),
}

/// 원격 호출 에러
///
/// 서버 봉투(`{ success, message, data }`)에 메시지가 있으면 그 메시지를,
/// 없으면 `GENERIC_REMOTE_FAILURE`를 사용자에게 보여줍니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteCallError {
    pub message: String,
    /// HTTP 상태 코드 (전송 자체가 실패했다면 None)
    pub status: Option<u16>,
}

impl RemoteCallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// 봉투 메시지가 비어 있으면 기본 문구로 대체합니다.
    pub fn from_envelope(message: Option<String>, status: Option<u16>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_REMOTE_FAILURE.to_string());
        Self { message, status }
    }
}

impl From<reqwest::Error> for RemoteCallError {
    fn from(err: reqwest::Error) -> Self {
        tracing::debug!("transport error: {}", err);
        Self {
            message: GENERIC_REMOTE_FAILURE.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

/// 일괄 작업 중 실패한 하나의 하위 작업
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// 사용자에게 보여줄 하위 작업 이름 (예: 학습 목표 내용, 파일 이름)
    pub label: String,
    pub error: RemoteCallError,
}

/// 독립적인 하위 작업들 중 일부만 실패했음을 하나로 묶어 보고합니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct PartialBatchFailure {
    /// 작업 종류 (예: "outcome changes", "files uploaded")
    pub operation: &'static str,
    pub succeeded: usize,
    pub failures: Vec<BatchFailure>,
}

impl PartialBatchFailure {
    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    pub fn failed_labels(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.label.as_str()).collect()
    }
}

impl fmt::Display for PartialBatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} {}, {} failed: {}",
            self.succeeded,
            self.total(),
            self.operation,
            self.failures.len(),
            self.failed_labels().join(", ")
        )
    }
}

/// 세션 API의 통합 에러 타입
#[derive(Debug, Error)]
pub enum AuthoringError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteCallError),

    #[error("module not found: {0}")]
    ModuleNotFound(String),

    #[error("material not found")]
    MaterialNotFound,

    #[error("outcome not found")]
    OutcomeNotFound,

    #[error("instructor not found: {0}")]
    InstructorNotFound(String),

    /// 응답이 도착하기 전에 편집 내용이 롤백됨.
    /// 롤백 이후의 버퍼에는 늦게 도착한 응답을 적용하지 않습니다.
    #[error("response arrived after a discard (epoch {issued}, now {current})")]
    Stale { issued: u64, current: u64 },
}
