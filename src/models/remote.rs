//! # 원격 카탈로그 응답 모델
//!
//! 카탈로그 서비스는 모든 응답을 봉투 형태로 감싸 보냅니다:
//! ```json
//! { "success": true, "message": "ok", "data": { ... } }
//! ```
//! 코스 목록은 여기에 `currentPage`, `totalPages`, `totalCourses`, `limit`이 추가됩니다.
//!
//! 서버 구현마다 필드 표기가 조금씩 달라서(`_id`/`id`, 숫자/문자열 ID,
//! 문자열로 온 가격 등) 역직렬화를 느슨하게 받아들입니다.
//! 없는 필드는 기본값으로 채우고, 편집 버퍼로의 변환은 `sync` 모듈이 담당합니다.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 단일 엔티티/컬렉션 응답 봉투
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

/// 페이지네이션이 붙은 코스 목록 응답
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<Vec<T>>,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_courses: u64,
    #[serde(default)]
    pub limit: u32,
}

/// 봉투를 벗긴 페이지 결과
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_courses: u64,
    pub limit: u32,
}

/// ID는 문자열 또는 숫자로 올 수 있습니다.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("invalid id: {}", other))),
    }
}

/// 숫자 필드가 문자열("49.00")로 오는 경우도 받아들입니다.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(lenient_f64(deserializer)?
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u32))
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(lenient_f64(deserializer)?
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u64))
}

/// 중첩 배열이 `null`로 오면 빈 배열로 취급합니다.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// 코스 레코드 (기본 정보 + 개요)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseRecord {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub age_group: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(alias = "thumbnailUrl")]
    pub thumbnail: Option<String>,
    pub access_tier: Option<String>,
    pub enrollment_type: Option<String>,
    pub is_visible: Option<bool>,
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    pub duration: Option<u32>,
    pub duration_unit: Option<String>,
    pub level: Option<String>,
    pub prerequisites: Option<String>,
    pub target_audience: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutcomeRecord {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    #[serde(alias = "outcome")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaterialRecord {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    #[serde(alias = "name")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    pub size: Option<u64>,
    #[serde(alias = "type")]
    pub mime_type: Option<String>,
    pub category: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(alias = "locator", alias = "fileUrl")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleRecord {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    pub session_count: Option<u32>,
    #[serde(alias = "sessionDuration", deserialize_with = "lenient_u32")]
    pub session_duration_minutes: Option<u32>,
    #[serde(alias = "lectures", deserialize_with = "null_as_empty")]
    pub materials: Vec<MaterialRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstructorRecord {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    #[serde(alias = "fullName")]
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryRecord {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    pub name: Option<String>,
    #[serde(alias = "subcategories", deserialize_with = "null_as_empty")]
    pub sub_categories: Vec<CategoryRecord>,
}
