//! # 섹션 동기화
//!
//! 원격 레코드를 편집 버퍼로 옮기는 변환과, 코스 전체를 불러오는 `load_course`.
//!
//! ## 변환 규칙
//! - 비어 있거나 공백뿐인 선택형 문자열 → `None`
//! - 없는 배열 → 빈 `Vec`, 없는 숫자 → 0
//! - 새로 만든 모듈의 로컬 ID는 생성 응답을 받는 즉시 서버 ID로 교체
//!
//! ## 불러오기 순서
//! 코스 레코드를 먼저 받고, 그다음 학습 목표/모듈/강사를 동시에 요청합니다.
//! 코스 레코드 실패는 전체 실패이고, 나머지 섹션 실패는 `LoadReport`에 기록만 합니다.

use chrono::Utc;

use crate::catalog::CatalogApi;
use crate::error::RemoteCallError;
use crate::models::*;

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// 코스 레코드의 기본 정보와 개요를 버퍼에 덮어씁니다.
/// 응답에 ID가 있으면 코스 식별자도 채택합니다.
pub fn apply_course_record(course: &mut EditableCourse, record: &CourseRecord) {
    if !record.id.trim().is_empty() {
        course.identity = Some(CourseId(record.id.clone()));
    }

    let basic = &mut course.basic_info;
    basic.title = text(&record.title);
    basic.category = non_blank(&record.category);
    basic.sub_category = non_blank(&record.sub_category);
    basic.age_group = non_blank(&record.age_group);
    basic.price = record.price.unwrap_or(0.0);
    basic.thumbnail = non_blank(&record.thumbnail).map(Thumbnail::Remote);
    basic.access_tier = record
        .access_tier
        .as_deref()
        .map(AccessTier::parse)
        .unwrap_or_default();
    basic.enrollment_type = record
        .enrollment_type
        .as_deref()
        .map(EnrollmentType::parse)
        .unwrap_or_default();
    basic.is_visible = record.is_visible.unwrap_or(false);

    let overview = &mut course.overview;
    overview.description = text(&record.description);
    overview.duration = record.duration.unwrap_or(0);
    overview.duration_unit = record
        .duration_unit
        .as_deref()
        .map(DurationUnit::parse)
        .unwrap_or_default();
    overview.level = non_blank(&record.level);
    overview.prerequisites = text(&record.prerequisites);
    overview.target_audience = text(&record.target_audience);
}

pub fn outcome_from_record(record: &OutcomeRecord) -> Outcome {
    Outcome::from_remote(OutcomeId(record.id.clone()), text(&record.description))
}

/// 서버 레코드를 확정 자료로 변환합니다.
/// 업로드 직후라면 `draft`의 이름/크기/형식을 빈 필드의 기본값으로 씁니다.
pub fn material_from_record(record: &MaterialRecord, draft: Option<&DraftMaterial>) -> CommittedMaterial {
    let mime_type = non_blank(&record.mime_type)
        .or_else(|| draft.map(|d| d.mime_type.clone()))
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let category = match (non_blank(&record.category), draft) {
        (Some(category), _) => MaterialCategory::parse(&category),
        (None, Some(draft)) => draft.category,
        (None, None) => MaterialCategory::from_mime(&mime_type),
    };

    CommittedMaterial {
        id: MaterialId(record.id.clone()),
        display_name: non_blank(&record.title)
            .or_else(|| draft.map(|d| d.display_name.clone()))
            .unwrap_or_default(),
        size_bytes: record
            .size
            .or_else(|| draft.map(|d| d.size_bytes))
            .unwrap_or(0),
        mime_type,
        category,
        created_at: record.created_at.unwrap_or_else(Utc::now),
        locator: text(&record.url),
    }
}

pub fn module_from_record(record: &ModuleRecord) -> ModuleEditState {
    let committed_materials: Vec<CommittedMaterial> = record
        .materials
        .iter()
        .map(|m| material_from_record(m, None))
        .collect();
    let material_category = committed_materials
        .last()
        .map(|m| m.category)
        .unwrap_or_default();

    ModuleEditState {
        id: ModuleId::Remote(record.id.clone()),
        title: text(&record.title),
        description: text(&record.description),
        session_count: record.session_count.unwrap_or(0),
        session_duration_minutes: record.session_duration_minutes.unwrap_or(0),
        material_category,
        committed_materials,
        draft_materials: Vec::new(),
        committing: false,
    }
}

/// 모듈 생성 응답의 서버 ID를 채택합니다. 응답에 ID가 없으면 false.
pub fn adopt_module_id(module: &mut ModuleEditState, record: &ModuleRecord) -> bool {
    if record.id.trim().is_empty() {
        return false;
    }
    if let ModuleId::Local(_) = module.id {
        tracing::info!(local = %module.id, remote = %record.id, "adopted server module id");
    }
    module.id = ModuleId::Remote(record.id.clone());
    true
}

pub fn instructor_from_record(record: &InstructorRecord) -> InstructorSummary {
    InstructorSummary {
        id: record.id.clone(),
        name: non_blank(&record.name).unwrap_or_else(|| record.id.clone()),
        email: non_blank(&record.email),
    }
}

/// 불러오기 중 실패한 보조 섹션 목록
#[derive(Debug, Default, Clone)]
pub struct LoadReport {
    pub failed_sections: Vec<(&'static str, RemoteCallError)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed_sections.is_empty()
    }

    fn record<T>(&mut self, section: &'static str, result: Result<T, RemoteCallError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(section, error = %err, "failed to load course section");
                self.failed_sections.push((section, err));
                None
            }
        }
    }
}

/// 코스 하나를 서버에서 불러와 새 편집 버퍼를 만듭니다.
pub async fn load_course<A: CatalogApi>(
    api: &A,
    id: &CourseId,
) -> Result<(EditableCourse, LoadReport), RemoteCallError> {
    let record = api.fetch_course(id).await?;

    let mut course = EditableCourse::new();
    apply_course_record(&mut course, &record);
    if course.identity.is_none() {
        course.identity = Some(id.clone());
    }

    let (outcomes, modules, all_instructors, assigned) = futures::join!(
        api.list_outcomes(id),
        api.list_modules(id),
        api.list_instructors(),
        api.list_course_instructors(id),
    );

    let mut report = LoadReport::default();
    if let Some(records) = report.record("outcomes", outcomes) {
        course.outcomes = records.iter().map(outcome_from_record).collect();
    }
    if let Some(records) = report.record("modules", modules) {
        course.modules = records.iter().map(module_from_record).collect();
    }
    let all = report.record("instructors", all_instructors).unwrap_or_default();
    let assigned = report.record("course instructors", assigned).unwrap_or_default();
    course.instructors = InstructorRoster::new(
        all.iter().map(instructor_from_record).collect(),
        assigned.iter().map(instructor_from_record).collect(),
    );

    tracing::info!(
        course = %id,
        outcomes = course.outcomes.len(),
        modules = course.modules.len(),
        failed = report.failed_sections.len(),
        "loaded course"
    );
    Ok((course, report))
}
