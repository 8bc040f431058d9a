//! 통합 테스트 공용 도구: 메모리 기반 가짜 카탈로그
//!
//! 모든 호출을 순서대로 기록하고, 키로 지정한 호출을 실패시킬 수 있습니다.
//! 키 형식: `"create_course"`, `"create_outcome:<설명>"`, `"upload:<파일 이름>"` 등.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use course_authoring::catalog::*;
use course_authoring::models::*;
use course_authoring::RemoteCallError;

#[derive(Default)]
struct State {
    calls: Vec<String>,
    failures: HashSet<String>,
    next_id: u64,
    course: Option<CourseRecord>,
    outcomes: Vec<OutcomeRecord>,
    modules: Vec<ModuleRecord>,
    instructors: Vec<InstructorRecord>,
    course_instructors: Vec<InstructorRecord>,
}

#[derive(Clone, Default)]
pub struct FakeCatalog {
    state: Arc<Mutex<State>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    /// 호출을 기록하고, 실패 키에 걸리면 에러를 돌려줍니다.
    fn record(&self, call: &str, key: &str) -> Result<(), RemoteCallError> {
        self.with_state(|s| {
            s.calls.push(call.to_string());
            if s.failures.contains(key) || s.failures.contains(call) {
                Err(RemoteCallError::from_envelope(Some(format!("{} rejected", call)), Some(500)))
            } else {
                Ok(())
            }
        })
    }

    fn next_id(&self, prefix: &str) -> String {
        self.with_state(|s| {
            s.next_id += 1;
            format!("{}-{}", prefix, s.next_id)
        })
    }

    pub fn fail_on(&self, key: &str) {
        self.with_state(|s| {
            s.failures.insert(key.to_string());
        });
    }

    pub fn clear_failures(&self) {
        self.with_state(|s| s.failures.clear());
    }

    pub fn calls(&self) -> Vec<String> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn seed_course(&self, record: CourseRecord) {
        self.with_state(|s| s.course = Some(record));
    }

    pub fn seed_outcomes(&self, outcomes: Vec<OutcomeRecord>) {
        self.with_state(|s| s.outcomes = outcomes);
    }

    pub fn seed_modules(&self, modules: Vec<ModuleRecord>) {
        self.with_state(|s| s.modules = modules);
    }

    pub fn seed_instructors(&self, all: Vec<InstructorRecord>, assigned: Vec<InstructorRecord>) {
        self.with_state(|s| {
            s.instructors = all;
            s.course_instructors = assigned;
        });
    }
}

impl CatalogApi for FakeCatalog {
    async fn list_courses(&self, page: u32, limit: u32) -> Result<Page<CourseRecord>, RemoteCallError> {
        self.record("list_courses", "list_courses")?;
        let items: Vec<CourseRecord> = self.with_state(|s| s.course.clone().into_iter().collect());
        Ok(Page {
            total_courses: items.len() as u64,
            items,
            current_page: page,
            total_pages: 1,
            limit,
        })
    }

    async fn fetch_course(&self, id: &CourseId) -> Result<CourseRecord, RemoteCallError> {
        self.record(&format!("fetch_course:{}", id), "fetch_course")?;
        self.with_state(|s| s.course.clone())
            .ok_or_else(|| RemoteCallError::from_envelope(Some("Course not found".into()), Some(404)))
    }

    async fn create_course(&self, form: &CourseForm) -> Result<CourseRecord, RemoteCallError> {
        self.record("create_course", "create_course")?;
        tokio::task::yield_now().await;
        Ok(CourseRecord {
            id: self.next_id("course"),
            title: Some(form.title.clone()),
            thumbnail: form.thumbnail_file.as_ref().map(|f| format!("https://cdn/{}", f.name)),
            ..Default::default()
        })
    }

    async fn update_course(&self, id: &CourseId, form: &CourseForm) -> Result<CourseRecord, RemoteCallError> {
        self.record("update_course", "update_course")?;
        tokio::task::yield_now().await;
        Ok(CourseRecord {
            id: id.0.clone(),
            title: Some(form.title.clone()),
            thumbnail: form.thumbnail_url.clone(),
            ..Default::default()
        })
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RemoteCallError> {
        self.record("list_categories", "list_categories")?;
        Ok(Vec::new())
    }

    async fn list_outcomes(&self, _course: &CourseId) -> Result<Vec<OutcomeRecord>, RemoteCallError> {
        self.record("list_outcomes", "list_outcomes")?;
        Ok(self.with_state(|s| s.outcomes.clone()))
    }

    async fn create_outcome(&self, request: &OutcomeRequest) -> Result<OutcomeRecord, RemoteCallError> {
        let call = format!("create_outcome:{}", request.description);
        tokio::task::yield_now().await;
        self.record(&call, "create_outcome")?;
        Ok(OutcomeRecord {
            id: self.next_id("outcome"),
            description: Some(request.description.clone()),
        })
    }

    async fn update_outcome(&self, request: &OutcomeRequest) -> Result<OutcomeRecord, RemoteCallError> {
        let call = format!("update_outcome:{}", request.description);
        tokio::task::yield_now().await;
        self.record(&call, "update_outcome")?;
        Ok(OutcomeRecord {
            id: request.outcome_id.clone().unwrap_or_default(),
            description: Some(request.description.clone()),
        })
    }

    async fn delete_outcome(&self, _course: &CourseId, outcome: &OutcomeId) -> Result<(), RemoteCallError> {
        tokio::task::yield_now().await;
        self.record(&format!("delete_outcome:{}", outcome), "delete_outcome")
    }

    async fn list_modules(&self, _course: &CourseId) -> Result<Vec<ModuleRecord>, RemoteCallError> {
        self.record("list_modules", "list_modules")?;
        Ok(self.with_state(|s| s.modules.clone()))
    }

    async fn create_module(&self, request: &ModuleRequest) -> Result<ModuleRecord, RemoteCallError> {
        self.record(&format!("create_module:{}", request.title), "create_module")?;
        Ok(ModuleRecord {
            id: self.next_id("module"),
            title: Some(request.title.clone()),
            ..Default::default()
        })
    }

    async fn update_module(&self, request: &ModuleRequest) -> Result<ModuleRecord, RemoteCallError> {
        self.record(&format!("update_module:{}", request.title), "update_module")?;
        Ok(ModuleRecord {
            id: request.module_id.clone().unwrap_or_default(),
            title: Some(request.title.clone()),
            ..Default::default()
        })
    }

    async fn delete_module(&self, _course: &CourseId, module_id: &str) -> Result<(), RemoteCallError> {
        self.record(&format!("delete_module:{}", module_id), "delete_module")
    }

    async fn upload_material(
        &self,
        request: UploadRequest,
        progress: Option<ProgressSender>,
    ) -> Result<MaterialRecord, RemoteCallError> {
        tokio::task::yield_now().await;
        self.record(&format!("upload:{}", request.file.name), "upload")?;
        if let Some(tx) = progress {
            let _ = tx.send(UploadProgress {
                handle: request.handle,
                sent_bytes: request.file.size(),
                total_bytes: request.file.size(),
            });
        }
        Ok(MaterialRecord {
            id: self.next_id("material"),
            title: Some(request.title),
            size: Some(request.file.size()),
            mime_type: Some(request.file.mime_type.clone()),
            category: Some(request.category.as_str().to_string()),
            created_at: None,
            url: Some(format!("https://cdn/{}/{}", request.module_id, request.file.name)),
        })
    }

    async fn rename_material(&self, _module_id: &str, material: &MaterialId, title: &str) -> Result<(), RemoteCallError> {
        self.record(&format!("rename_material:{}:{}", material, title), "rename_material")
    }

    async fn delete_material(&self, _module_id: &str, material: &MaterialId) -> Result<(), RemoteCallError> {
        self.record(&format!("delete_material:{}", material), "delete_material")
    }

    async fn list_instructors(&self) -> Result<Vec<InstructorRecord>, RemoteCallError> {
        self.record("list_instructors", "list_instructors")?;
        Ok(self.with_state(|s| s.instructors.clone()))
    }

    async fn list_course_instructors(&self, _course: &CourseId) -> Result<Vec<InstructorRecord>, RemoteCallError> {
        self.record("list_course_instructors", "list_course_instructors")?;
        Ok(self.with_state(|s| s.course_instructors.clone()))
    }

    async fn assign_instructor(&self, _course: &CourseId, instructor_id: &str) -> Result<(), RemoteCallError> {
        self.record(&format!("assign_instructor:{}", instructor_id), "assign_instructor")
    }

    async fn unassign_instructor(&self, _course: &CourseId, instructor_id: &str) -> Result<(), RemoteCallError> {
        self.record(&format!("unassign_instructor:{}", instructor_id), "unassign_instructor")
    }
}

// ── 테스트 데이터 ──

pub fn course_record(id: &str, title: &str) -> CourseRecord {
    CourseRecord {
        id: id.into(),
        title: Some(title.into()),
        ..Default::default()
    }
}

pub fn instructor(id: &str, name: &str) -> InstructorRecord {
    InstructorRecord {
        id: id.into(),
        name: Some(name.into()),
        email: None,
    }
}

pub fn video(name: &str) -> PickedFile {
    PickedFile::new(name, vec![7u8; 32])
}

/// 네 필드가 모두 채워진 모듈 값
pub fn fill_module(module: &mut ModuleEditState, title: &str) {
    module.title = title.into();
    module.description = format!("{} description", title);
    module.session_count = 2;
    module.session_duration_minutes = 45;
}
