//! # HTTP 카탈로그 클라이언트
//!
//! `CatalogApi`의 reqwest 구현입니다. 엔드포인트마다 얇은 메서드 하나씩이며,
//! 공통 처리(봉투 검사, 메시지 추출, 로깅)는 `call()`에 모여 있습니다.
//!
//! ## 엔드포인트
//! - `GET    /courses?page&limit`                     → 코스 목록 (페이지네이션)
//! - `GET    /courses/{id}`                           → 코스 조회
//! - `POST   /courses`, `PUT /courses/{id}`           → 기본 정보 + 개요 저장 (multipart)
//! - `GET    /courses/{id}/outcomes`                  → 학습 목표 목록
//! - `POST   /courses/{id}/outcomes`                  → 학습 목표 생성
//! - `PUT    /courses/{id}/outcomes/{oid}`            → 학습 목표 수정
//! - `DELETE /courses/{id}/outcomes/{oid}`            → 학습 목표 삭제
//! - `GET    /courses/{id}/modules`                   → 모듈 목록 (자료 포함)
//! - `POST   /courses/{id}/modules`, `PUT .../{mid}`  → 모듈 생성/수정
//! - `DELETE /courses/{id}/modules/{mid}`             → 모듈 삭제
//! - `POST   /modules/{mid}/materials`                → 자료 업로드 (multipart, 진행률)
//! - `PATCH  /modules/{mid}/materials/{matid}`        → 자료 이름 변경
//! - `DELETE /modules/{mid}/materials/{matid}`        → 자료 삭제
//! - `GET    /instructors`                            → 전체 강사
//! - `GET    /courses/{id}/instructors`               → 배정된 강사
//! - `POST   /courses/{id}/instructors`               → 강사 배정
//! - `DELETE /courses/{id}/instructors/{iid}`         → 강사 배정 해제
//! - `GET    /categories`                             → 카테고리 (하위 카테고리 포함)

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use futures::stream;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::*;
use crate::config::{Config, DEFAULT_UPLOAD_CHUNK_BYTES};
use crate::error::RemoteCallError;

const MISSING_DATA: &str = "The catalog service returned no data.";
const UNEXPECTED_SHAPE: &str = "The catalog service returned an unexpected response.";

/// 요청 본문 종류
enum Payload {
    Empty,
    Json(Value),
    Multipart(Form),
}

/// reqwest 기반 카탈로그 클라이언트.
/// `Client`는 내부적으로 Arc를 쓰므로 clone해도 연결 풀을 공유합니다.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
    chunk_bytes: usize,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            chunk_bytes: DEFAULT_UPLOAD_CHUNK_BYTES,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build catalog HTTP client")?;
        Ok(Self {
            client,
            base_url: config.catalog_base_url.clone(),
            chunk_bytes: config.authoring.upload_chunk_bytes.max(1),
        })
    }

    /// 업로드 진행률 보고 단위
    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 요청을 보내고 봉투를 검사합니다.
    ///
    /// - HTTP 상태가 실패이거나 `success: false`이면 봉투의 `message`로 에러를 만듭니다.
    /// - 본문이 비어 있는 성공 응답(204 등)은 `Value::Null`로 돌려줍니다.
    /// - `success` 필드가 없으면 HTTP 상태로 판단합니다.
    async fn call(&self, method: Method, path: &str, payload: Payload) -> Result<Value, RemoteCallError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, path);

        let mut request = self.client.request(method.clone(), &url);
        request = match payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(&body),
            Payload::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return if status.is_success() {
                Ok(Value::Null)
            } else {
                Err(RemoteCallError::from_envelope(None, Some(status.as_u16())))
            };
        }

        let value: Value = match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{} {} returned non-JSON body: {}", method, path, err);
                return Err(RemoteCallError::from_envelope(None, Some(status.as_u16())));
            }
        };

        let success = value
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or_else(|| status.is_success());

        if status.is_success() && success {
            Ok(value)
        } else {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);
            let err = RemoteCallError::from_envelope(message, Some(status.as_u16()));
            tracing::warn!("{} {} failed ({}): {}", method, path, status, err);
            Err(err)
        }
    }

    async fn get(&self, path: &str) -> Result<Value, RemoteCallError> {
        self.call(Method::GET, path, Payload::Empty).await
    }

    async fn delete(&self, path: &str) -> Result<(), RemoteCallError> {
        self.call(Method::DELETE, path, Payload::Empty).await.map(|_| ())
    }

    fn course_multipart(form: &CourseForm) -> Result<Form, RemoteCallError> {
        let mut multipart = Form::new();
        for (name, value) in form.text_fields() {
            multipart = multipart.text(name, value);
        }
        if let Some(file) = &form.thumbnail_file {
            let part = Part::bytes(file.bytes.clone())
                .file_name(upload_file_name(&file.name))
                .mime_str(&file.mime_type)?;
            multipart = multipart.part("thumbnail", part);
        }
        Ok(multipart)
    }
}

/// 봉투의 `data`를 T로 변환합니다. 없으면 에러.
fn data<T: DeserializeOwned>(body: Value) -> Result<T, RemoteCallError> {
    let envelope: Envelope<Value> = serde_json::from_value(body).map_err(|err| {
        tracing::warn!("malformed envelope: {}", err);
        RemoteCallError::new(UNEXPECTED_SHAPE)
    })?;
    let data = envelope
        .data
        .filter(|v| !v.is_null())
        .ok_or_else(|| RemoteCallError::new(MISSING_DATA))?;
    serde_json::from_value(data).map_err(|err| {
        tracing::warn!("unexpected data shape: {}", err);
        RemoteCallError::new(UNEXPECTED_SHAPE)
    })
}

/// 컬렉션 응답. `data`가 없거나 null이면 빈 목록으로 취급합니다.
fn list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, RemoteCallError> {
    match body.get("data") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(_) => data(body),
    }
}

/// 업로드용 파일 이름. 확장자는 소문자로, 나머지는 slug로 정리합니다.
/// 예: "Lecture 01 Intro.MP4" → "lecture-01-intro.mp4"
pub fn upload_file_name(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(slug::slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "material".to_string());
    match extension_of(name) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

impl CatalogApi for HttpCatalog {
    async fn list_courses(&self, page: u32, limit: u32) -> Result<Page<CourseRecord>, RemoteCallError> {
        let body = self
            .get(&format!("/courses?page={}&limit={}", page.max(1), limit.max(1)))
            .await?;
        let envelope: PagedEnvelope<CourseRecord> = serde_json::from_value(body).map_err(|err| {
            tracing::warn!("unexpected course page shape: {}", err);
            RemoteCallError::new(UNEXPECTED_SHAPE)
        })?;
        Ok(Page {
            items: envelope.data.unwrap_or_default(),
            current_page: envelope.current_page,
            total_pages: envelope.total_pages,
            total_courses: envelope.total_courses,
            limit: envelope.limit,
        })
    }

    async fn fetch_course(&self, id: &CourseId) -> Result<CourseRecord, RemoteCallError> {
        data(self.get(&format!("/courses/{}", id)).await?)
    }

    async fn create_course(&self, form: &CourseForm) -> Result<CourseRecord, RemoteCallError> {
        let multipart = Self::course_multipart(form)?;
        data(self.call(Method::POST, "/courses", Payload::Multipart(multipart)).await?)
    }

    async fn update_course(&self, id: &CourseId, form: &CourseForm) -> Result<CourseRecord, RemoteCallError> {
        let multipart = Self::course_multipart(form)?;
        let path = format!("/courses/{}", id);
        data(self.call(Method::PUT, &path, Payload::Multipart(multipart)).await?)
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RemoteCallError> {
        list(self.get("/categories").await?)
    }

    async fn list_outcomes(&self, course: &CourseId) -> Result<Vec<OutcomeRecord>, RemoteCallError> {
        list(self.get(&format!("/courses/{}/outcomes", course)).await?)
    }

    async fn create_outcome(&self, request: &OutcomeRequest) -> Result<OutcomeRecord, RemoteCallError> {
        let path = format!("/courses/{}/outcomes", request.course_id);
        let body = serde_json::to_value(request).map_err(|_| RemoteCallError::new(UNEXPECTED_SHAPE))?;
        data(self.call(Method::POST, &path, Payload::Json(body)).await?)
    }

    async fn update_outcome(&self, request: &OutcomeRequest) -> Result<OutcomeRecord, RemoteCallError> {
        let outcome_id = request
            .outcome_id
            .as_deref()
            .ok_or_else(|| RemoteCallError::new("outcome id is required for an update"))?;
        let path = format!("/courses/{}/outcomes/{}", request.course_id, outcome_id);
        let body = serde_json::to_value(request).map_err(|_| RemoteCallError::new(UNEXPECTED_SHAPE))?;
        data(self.call(Method::PUT, &path, Payload::Json(body)).await?)
    }

    async fn delete_outcome(&self, course: &CourseId, outcome: &OutcomeId) -> Result<(), RemoteCallError> {
        self.delete(&format!("/courses/{}/outcomes/{}", course, outcome)).await
    }

    async fn list_modules(&self, course: &CourseId) -> Result<Vec<ModuleRecord>, RemoteCallError> {
        list(self.get(&format!("/courses/{}/modules", course)).await?)
    }

    async fn create_module(&self, request: &ModuleRequest) -> Result<ModuleRecord, RemoteCallError> {
        let path = format!("/courses/{}/modules", request.course_id);
        let body = serde_json::to_value(request).map_err(|_| RemoteCallError::new(UNEXPECTED_SHAPE))?;
        data(self.call(Method::POST, &path, Payload::Json(body)).await?)
    }

    async fn update_module(&self, request: &ModuleRequest) -> Result<ModuleRecord, RemoteCallError> {
        let module_id = request
            .module_id
            .as_deref()
            .ok_or_else(|| RemoteCallError::new("module id is required for an update"))?;
        let path = format!("/courses/{}/modules/{}", request.course_id, module_id);
        let body = serde_json::to_value(request).map_err(|_| RemoteCallError::new(UNEXPECTED_SHAPE))?;
        data(self.call(Method::PUT, &path, Payload::Json(body)).await?)
    }

    async fn delete_module(&self, course: &CourseId, module_id: &str) -> Result<(), RemoteCallError> {
        self.delete(&format!("/courses/{}/modules/{}", course, module_id)).await
    }

    async fn upload_material(
        &self,
        request: UploadRequest,
        progress: Option<ProgressSender>,
    ) -> Result<MaterialRecord, RemoteCallError> {
        let UploadRequest {
            module_id,
            handle,
            title,
            category,
            file,
        } = request;
        let total = file.size();
        let file_name = upload_file_name(&file.name);

        // 본문을 청크 스트림으로 보내면서 청크마다 진행률을 보고합니다.
        let chunks: Vec<Vec<u8>> = file.bytes.chunks(self.chunk_bytes).map(<[u8]>::to_vec).collect();
        let mut sent = 0u64;
        let body = stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            if let Some(tx) = &progress {
                // 수신 측이 이미 닫혔어도 업로드는 계속합니다.
                let _ = tx.send(UploadProgress {
                    handle,
                    sent_bytes: sent,
                    total_bytes: total,
                });
            }
            Ok::<_, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(body), total)
            .file_name(file_name)
            .mime_str(&file.mime_type)?;
        let form = Form::new()
            .text("title", title)
            .text("category", category.as_str())
            .part("file", part);

        let path = format!("/modules/{}/materials", module_id);
        data(self.call(Method::POST, &path, Payload::Multipart(form)).await?)
    }

    async fn rename_material(&self, module_id: &str, material: &MaterialId, title: &str) -> Result<(), RemoteCallError> {
        let path = format!("/modules/{}/materials/{}", module_id, material);
        self.call(Method::PATCH, &path, Payload::Json(json!({ "title": title })))
            .await
            .map(|_| ())
    }

    async fn delete_material(&self, module_id: &str, material: &MaterialId) -> Result<(), RemoteCallError> {
        self.delete(&format!("/modules/{}/materials/{}", module_id, material)).await
    }

    async fn list_instructors(&self) -> Result<Vec<InstructorRecord>, RemoteCallError> {
        list(self.get("/instructors").await?)
    }

    async fn list_course_instructors(&self, course: &CourseId) -> Result<Vec<InstructorRecord>, RemoteCallError> {
        list(self.get(&format!("/courses/{}/instructors", course)).await?)
    }

    async fn assign_instructor(&self, course: &CourseId, instructor_id: &str) -> Result<(), RemoteCallError> {
        let path = format!("/courses/{}/instructors", course);
        self.call(Method::POST, &path, Payload::Json(json!({ "instructorId": instructor_id })))
            .await
            .map(|_| ())
    }

    async fn unassign_instructor(&self, course: &CourseId, instructor_id: &str) -> Result<(), RemoteCallError> {
        self.delete(&format!("/courses/{}/instructors/{}", course, instructor_id)).await
    }
}
