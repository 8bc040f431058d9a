//! # 원격 카탈로그 접근 계층
//!
//! 코스/학습 목표/모듈/자료/강사/카테고리 서비스와 통신하는 경계입니다.
//! 엔드포인트 하나당 메서드 하나를 가진 `CatalogApi` 트레이트로 추상화하여,
//! 실제 HTTP 구현(`HttpCatalog`)과 테스트용 가짜 구현을 바꿔 끼울 수 있게 합니다.
//!
//! 모든 메서드는 봉투(`{ success, message, data }`)를 벗긴 결과를 돌려주고,
//! 실패는 서버 메시지를 담은 `RemoteCallError`로 보고합니다.

pub mod http;

use std::future::Future;

use serde::Serialize;

use crate::drafts::DraftHandle;
use crate::error::RemoteCallError;
use crate::models::*;

pub use http::HttpCatalog;

/// 업로드 진행률을 받는 채널
pub type ProgressSender = tokio::sync::mpsc::UnboundedSender<UploadProgress>;

/// 업로드 진행 이벤트. 어느 임시 자료의 업로드인지 핸들로 구분합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub handle: DraftHandle,
    pub sent_bytes: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        ((self.sent_bytes.min(self.total_bytes) * 100) / self.total_bytes) as u8
    }
}

/// 기본 정보 + 개요 저장 요청 (multipart 폼)
#[derive(Debug, Clone, PartialEq)]
pub struct CourseForm {
    pub title: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub age_group: Option<String>,
    pub price: f64,
    pub access_tier: AccessTier,
    pub enrollment_type: EnrollmentType,
    pub is_visible: bool,
    pub description: String,
    pub duration: u32,
    pub duration_unit: DurationUnit,
    pub level: Option<String>,
    pub prerequisites: String,
    pub target_audience: String,
    /// 기존 썸네일 주소 (새 파일이 없을 때 유지용)
    pub thumbnail_url: Option<String>,
    /// 새로 고른 썸네일 파일
    pub thumbnail_file: Option<PickedFile>,
}

impl CourseForm {
    pub fn from_course(course: &EditableCourse) -> Self {
        let basic = &course.basic_info;
        let overview = &course.overview;
        let (thumbnail_url, thumbnail_file) = match &basic.thumbnail {
            Some(Thumbnail::Remote(url)) => (Some(url.clone()), None),
            Some(Thumbnail::Pending(file)) => (None, Some(file.clone())),
            None => (None, None),
        };

        Self {
            title: basic.title.trim().to_string(),
            category: basic.category.clone(),
            sub_category: basic.sub_category.clone(),
            age_group: basic.age_group.clone(),
            price: basic.price,
            access_tier: basic.access_tier,
            enrollment_type: basic.enrollment_type,
            is_visible: basic.is_visible,
            description: overview.description.clone(),
            duration: overview.duration,
            duration_unit: overview.duration_unit,
            level: overview.level.clone(),
            prerequisites: overview.prerequisites.clone(),
            target_audience: overview.target_audience.clone(),
            thumbnail_url,
            thumbnail_file,
        }
    }

    /// multipart 폼의 텍스트 필드 목록. 값이 없는 선택 필드는 보내지 않습니다.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("title", self.title.clone()),
            ("price", self.price.to_string()),
            ("accessTier", self.access_tier.as_str().to_string()),
            ("enrollmentType", self.enrollment_type.as_str().to_string()),
            ("isVisible", self.is_visible.to_string()),
            ("description", self.description.clone()),
            ("duration", self.duration.to_string()),
            ("durationUnit", self.duration_unit.as_str().to_string()),
            ("prerequisites", self.prerequisites.clone()),
            ("targetAudience", self.target_audience.clone()),
        ];
        let optional = [
            ("category", &self.category),
            ("subCategory", &self.sub_category),
            ("ageGroup", &self.age_group),
            ("level", &self.level),
            ("thumbnail", &self.thumbnail_url),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                fields.push((name, value.clone()));
            }
        }
        fields
    }
}

/// 학습 목표 생성/수정 요청 본문
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRequest {
    pub course_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome_id: Option<String>,
    pub description: String,
}

/// 모듈 생성/수정 요청 본문
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRequest {
    pub course_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
    pub title: String,
    pub description: String,
    pub session_count: u32,
    pub session_duration_minutes: u32,
}

impl ModuleRequest {
    pub fn from_module(course_id: &CourseId, module: &ModuleEditState) -> Self {
        Self {
            course_id: course_id.0.clone(),
            module_id: module.id.remote().map(str::to_string),
            title: module.title.trim().to_string(),
            description: module.description.clone(),
            session_count: module.session_count,
            session_duration_minutes: module.session_duration_minutes,
        }
    }
}

/// 자료 업로드 요청. 파일 내용은 레지스트리에서 복사해 옵니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub module_id: String,
    pub handle: DraftHandle,
    pub title: String,
    pub category: MaterialCategory,
    pub file: PickedFile,
}

/// 원격 카탈로그 서비스
pub trait CatalogApi: Send + Sync {
    fn list_courses(
        &self,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<Page<CourseRecord>, RemoteCallError>> + Send;

    fn fetch_course(
        &self,
        id: &CourseId,
    ) -> impl Future<Output = Result<CourseRecord, RemoteCallError>> + Send;

    fn create_course(
        &self,
        form: &CourseForm,
    ) -> impl Future<Output = Result<CourseRecord, RemoteCallError>> + Send;

    fn update_course(
        &self,
        id: &CourseId,
        form: &CourseForm,
    ) -> impl Future<Output = Result<CourseRecord, RemoteCallError>> + Send;

    fn list_categories(
        &self,
    ) -> impl Future<Output = Result<Vec<CategoryRecord>, RemoteCallError>> + Send;

    fn list_outcomes(
        &self,
        course: &CourseId,
    ) -> impl Future<Output = Result<Vec<OutcomeRecord>, RemoteCallError>> + Send;

    fn create_outcome(
        &self,
        request: &OutcomeRequest,
    ) -> impl Future<Output = Result<OutcomeRecord, RemoteCallError>> + Send;

    fn update_outcome(
        &self,
        request: &OutcomeRequest,
    ) -> impl Future<Output = Result<OutcomeRecord, RemoteCallError>> + Send;

    fn delete_outcome(
        &self,
        course: &CourseId,
        outcome: &OutcomeId,
    ) -> impl Future<Output = Result<(), RemoteCallError>> + Send;

    fn list_modules(
        &self,
        course: &CourseId,
    ) -> impl Future<Output = Result<Vec<ModuleRecord>, RemoteCallError>> + Send;

    fn create_module(
        &self,
        request: &ModuleRequest,
    ) -> impl Future<Output = Result<ModuleRecord, RemoteCallError>> + Send;

    fn update_module(
        &self,
        request: &ModuleRequest,
    ) -> impl Future<Output = Result<ModuleRecord, RemoteCallError>> + Send;

    fn delete_module(
        &self,
        course: &CourseId,
        module_id: &str,
    ) -> impl Future<Output = Result<(), RemoteCallError>> + Send;

    fn upload_material(
        &self,
        request: UploadRequest,
        progress: Option<ProgressSender>,
    ) -> impl Future<Output = Result<MaterialRecord, RemoteCallError>> + Send;

    fn rename_material(
        &self,
        module_id: &str,
        material: &MaterialId,
        title: &str,
    ) -> impl Future<Output = Result<(), RemoteCallError>> + Send;

    fn delete_material(
        &self,
        module_id: &str,
        material: &MaterialId,
    ) -> impl Future<Output = Result<(), RemoteCallError>> + Send;

    fn list_instructors(
        &self,
    ) -> impl Future<Output = Result<Vec<InstructorRecord>, RemoteCallError>> + Send;

    fn list_course_instructors(
        &self,
        course: &CourseId,
    ) -> impl Future<Output = Result<Vec<InstructorRecord>, RemoteCallError>> + Send;

    fn assign_instructor(
        &self,
        course: &CourseId,
        instructor_id: &str,
    ) -> impl Future<Output = Result<(), RemoteCallError>> + Send;

    fn unassign_instructor(
        &self,
        course: &CourseId,
        instructor_id: &str,
    ) -> impl Future<Output = Result<(), RemoteCallError>> + Send;
}
