//! # 저작 세션 (AuthoringSession)
//!
//! 코스 하나를 편집하는 동안의 모든 상태를 단독으로 소유합니다.
//! - 편집 버퍼 (`EditableCourse`)
//! - 임시 파일 핸들 레지스트리
//! - 체크포인트와 세대(epoch)
//! - 마지막으로 계산한 완료율
//!
//! 전역 상태는 없으며, 세션을 만든 쪽이 `&mut`로 넘겨 사용합니다.
//! 버퍼를 바꾸는 모든 메서드는 끝에서 완료율을 다시 계산합니다.
//!
//! ## 체크포인트 갱신 시점
//! 최초 생성/불러오기, 코스 저장 성공, 모듈 저장, 모듈 삭제,
//! 확정 자료 삭제/이름 변경, 강사 배정 변경.
//! 즉 서버 상태가 바뀐 직후마다 다시 찍습니다.

use std::collections::HashSet;

use futures::stream::{FuturesUnordered, StreamExt};

use crate::catalog::{CatalogApi, ModuleRequest, ProgressSender};
use crate::config::AuthoringSettings;
use crate::drafts::{self, DraftHandle, HandleRegistry, PickOutcome};
use crate::error::{AuthoringError, BatchFailure, PartialBatchFailure, RemoteCallError, ValidationError};
use crate::models::*;
use crate::progress::{self, CompletionReport};
use crate::save::{self, SaveOutcome, SaveReport, SaveTicket};
use crate::snapshot::CheckpointManager;
use crate::sync::{self, LoadReport};

const UPLOAD_BATCH: &str = "files uploaded";

/// 모듈 저장 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSaveReport {
    /// 저장 후의 모듈 ID (새 모듈이면 서버 ID로 바뀐 값)
    pub module_id: ModuleId,
    pub uploaded: usize,
    pub failures: Vec<BatchFailure>,
}

impl ModuleSaveReport {
    pub fn attempted(&self) -> usize {
        self.uploaded + self.failures.len()
    }

    pub fn partial_failure(&self) -> Option<PartialBatchFailure> {
        if self.failures.is_empty() {
            return None;
        }
        Some(PartialBatchFailure {
            operation: UPLOAD_BATCH,
            succeeded: self.uploaded,
            failures: self.failures.clone(),
        })
    }

    pub fn message(&self) -> String {
        match self.partial_failure() {
            Some(failure) => failure.to_string(),
            None if self.uploaded == 0 => "Module saved.".to_string(),
            None => format!("Module saved, {} {}.", self.uploaded, UPLOAD_BATCH),
        }
    }
}

pub struct AuthoringSession<A: CatalogApi> {
    api: A,
    course: EditableCourse,
    registry: HandleRegistry,
    checkpoints: CheckpointManager,
    settings: AuthoringSettings,
    progress: CompletionReport,
}

impl<A: CatalogApi> AuthoringSession<A> {
    /// 새 코스를 위한 빈 세션
    pub fn new(api: A, settings: AuthoringSettings) -> Self {
        Self::with_course(api, EditableCourse::new(), settings)
    }

    fn with_course(api: A, course: EditableCourse, settings: AuthoringSettings) -> Self {
        let mut registry = HandleRegistry::new();
        let mut checkpoints = CheckpointManager::new();
        checkpoints.capture(&course, &mut registry);
        let progress = progress::evaluate(&course, settings.min_outcomes);
        Self {
            api,
            course,
            registry,
            checkpoints,
            settings,
            progress,
        }
    }

    /// 서버의 코스를 불러와 세션을 엽니다.
    /// 보조 섹션(학습 목표, 모듈, 강사) 실패는 `LoadReport`로 알려주고 세션은 열립니다.
    pub async fn load(
        api: A,
        id: &CourseId,
        settings: AuthoringSettings,
    ) -> Result<(Self, LoadReport), RemoteCallError> {
        let (course, report) = sync::load_course(&api, id).await?;
        Ok((Self::with_course(api, course, settings), report))
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn course(&self) -> &EditableCourse {
        &self.course
    }

    pub fn progress(&self) -> &CompletionReport {
        &self.progress
    }

    pub fn settings(&self) -> &AuthoringSettings {
        &self.settings
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    pub fn epoch(&self) -> u64 {
        self.checkpoints.epoch()
    }

    pub fn preview_url(&self, handle: DraftHandle) -> Option<&str> {
        self.registry.preview_url(handle)
    }

    fn refresh(&mut self) {
        self.progress = progress::evaluate(&self.course, self.settings.min_outcomes);
    }

    fn capture(&mut self) {
        self.checkpoints.capture(&self.course, &mut self.registry);
    }

    fn course_id(&self, what: &'static str) -> Result<CourseId, ValidationError> {
        self.course
            .identity
            .clone()
            .ok_or(ValidationError::CourseNotSaved(what))
    }

    fn module_mut(&mut self, id: &ModuleId) -> Result<&mut ModuleEditState, AuthoringError> {
        self.course
            .module_mut(id)
            .ok_or_else(|| AuthoringError::ModuleNotFound(id.to_string()))
    }

    fn module(&self, id: &ModuleId) -> Result<&ModuleEditState, AuthoringError> {
        self.course
            .module(id)
            .ok_or_else(|| AuthoringError::ModuleNotFound(id.to_string()))
    }

    /// 버퍼를 직접 고칩니다 (기본 정보, 개요, 모듈 필드 등).
    ///
    /// 클로저가 임시 자료를 버퍼에서 빼면 그 핸들도 여기서 정리합니다.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut EditableCourse) -> R) -> R {
        let before = self.course.draft_handles();
        let result = f(&mut self.course);
        let after: HashSet<DraftHandle> = self.course.draft_handles().into_iter().collect();
        for handle in before.into_iter().filter(|h| !after.contains(h)) {
            self.checkpoints.retire(handle, &mut self.registry);
        }
        self.refresh();
        result
    }

    // ── 학습 목표 ────────────────────────────────────────────

    pub fn add_outcome(&mut self, description: impl Into<String>) -> OutcomeKey {
        let outcome = Outcome::new(description);
        let key = outcome.key;
        self.course.outcomes.push(outcome);
        self.refresh();
        key
    }

    pub fn update_outcome(&mut self, key: OutcomeKey, description: impl Into<String>) -> Result<(), AuthoringError> {
        let outcome = self
            .course
            .outcome_mut(key)
            .ok_or(AuthoringError::OutcomeNotFound)?;
        outcome.description = description.into();
        self.refresh();
        Ok(())
    }

    /// 학습 목표를 뺍니다. 서버에 있던 항목이면 다음 저장에서 삭제되도록 표시합니다.
    pub fn remove_outcome(&mut self, key: OutcomeKey) -> Result<Outcome, AuthoringError> {
        let index = self
            .course
            .outcomes
            .iter()
            .position(|o| o.key == key)
            .ok_or(AuthoringError::OutcomeNotFound)?;
        let outcome = self.course.outcomes.remove(index);
        if let Some(id) = &outcome.id {
            if !self.course.removed_outcomes.contains(id) {
                self.course.removed_outcomes.push(id.clone());
            }
        }
        self.refresh();
        Ok(outcome)
    }

    // ── 모듈 ────────────────────────────────────────────────

    /// 로컬 임시 ID를 가진 빈 모듈을 추가합니다.
    pub fn add_module(&mut self) -> ModuleId {
        let module = ModuleEditState::new();
        let id = module.id.clone();
        self.course.modules.push(module);
        self.refresh();
        id
    }

    /// 모듈을 삭제합니다.
    /// 서버에 없는 모듈은 로컬에서만 지우고, 서버 모듈은 원격 삭제가 성공한 뒤에 지웁니다.
    pub async fn remove_module(&mut self, id: &ModuleId) -> Result<(), AuthoringError> {
        self.module(id)?;
        if let ModuleId::Remote(remote_id) = id {
            let course_id = self.course_id("modules")?;
            self.api.delete_module(&course_id, remote_id).await?;
        }

        let index = self
            .course
            .modules
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| AuthoringError::ModuleNotFound(id.to_string()))?;
        let module = self.course.modules.remove(index);
        for handle in module.draft_handles() {
            self.checkpoints.retire(handle, &mut self.registry);
        }
        tracing::info!(module = %id, "module removed");

        if id.is_persisted() {
            self.capture();
        }
        self.refresh();
        Ok(())
    }

    pub fn set_material_category(&mut self, id: &ModuleId, category: MaterialCategory) -> Result<(), AuthoringError> {
        self.module_mut(id)?.material_category = category;
        Ok(())
    }

    // ── 자료 ────────────────────────────────────────────────

    pub fn pick_files(&mut self, id: &ModuleId, files: Vec<PickedFile>) -> Result<PickOutcome, AuthoringError> {
        let module = self
            .course
            .module_mut(id)
            .ok_or_else(|| AuthoringError::ModuleNotFound(id.to_string()))?;
        let outcome = drafts::pick_files(module, files, &mut self.registry);
        self.refresh();
        Ok(outcome)
    }

    /// 자료를 삭제합니다.
    /// - 확정 자료: 원격 삭제가 성공해야 로컬에서도 지웁니다.
    /// - 임시 자료: 핸들을 정리하고 로컬에서만 지웁니다.
    pub async fn remove_material(&mut self, id: &ModuleId, key: &MaterialKey) -> Result<(), AuthoringError> {
        match key {
            MaterialKey::Draft(handle) => {
                let module = self
                    .course
                    .module_mut(id)
                    .ok_or_else(|| AuthoringError::ModuleNotFound(id.to_string()))?;
                drafts::remove_draft(module, *handle, &mut self.checkpoints, &mut self.registry)?;
            }
            MaterialKey::Committed(material_id) => {
                let module = self.module(id)?;
                let remote_id = module
                    .id
                    .remote()
                    .map(str::to_string)
                    .ok_or_else(|| AuthoringError::ModuleNotFound(id.to_string()))?;
                if module.committed(material_id).is_none() {
                    return Err(AuthoringError::MaterialNotFound);
                }

                self.api.delete_material(&remote_id, material_id).await?;
                self.module_mut(id)?
                    .committed_materials
                    .retain(|m| &m.id != material_id);
                tracing::info!(module = %id, material = %material_id, "material deleted");
                self.capture();
            }
        }
        self.refresh();
        Ok(())
    }

    /// 자료 이름을 바꿉니다.
    /// - 확정 자료: 원격 변경이 성공해야 로컬 이름도 바뀝니다.
    /// - 임시 자료: 새 이름의 파일로 핸들을 다시 발급합니다. 반환값은 새 키입니다.
    pub async fn rename_material(
        &mut self,
        id: &ModuleId,
        key: &MaterialKey,
        new_name: &str,
    ) -> Result<MaterialKey, AuthoringError> {
        match key {
            MaterialKey::Draft(handle) => {
                let module = self
                    .course
                    .module_mut(id)
                    .ok_or_else(|| AuthoringError::ModuleNotFound(id.to_string()))?;
                let renamed = drafts::rename_draft(
                    module,
                    *handle,
                    new_name,
                    &mut self.checkpoints,
                    &mut self.registry,
                )?;
                Ok(MaterialKey::Draft(renamed))
            }
            MaterialKey::Committed(material_id) => {
                let module = self.module(id)?;
                let remote_id = module
                    .id
                    .remote()
                    .map(str::to_string)
                    .ok_or_else(|| AuthoringError::ModuleNotFound(id.to_string()))?;
                let current = module
                    .committed(material_id)
                    .ok_or(AuthoringError::MaterialNotFound)?;
                let name = drafts::normalized_rename(&current.display_name, new_name)?;

                self.api.rename_material(&remote_id, material_id, &name).await?;
                if let Some(material) = self
                    .module_mut(id)?
                    .committed_materials
                    .iter_mut()
                    .find(|m| &m.id == material_id)
                {
                    material.display_name = name;
                }
                self.capture();
                Ok(key.clone())
            }
        }
    }

    /// 모듈을 저장하고 임시 자료를 모두 업로드합니다.
    ///
    /// 1. 모듈 제목 검증
    /// 2. 모듈 생성(서버 ID 채택) 또는 수정. 실패하면 업로드 없이 에러
    /// 3. 임시 자료를 동시에 업로드. 하나가 끝날 때마다 확정 처리와 완료율 갱신
    /// 4. 실패한 업로드는 임시 자료로 남고, 보고서에 이름이 기록됩니다 (자동 재시도 없음)
    pub async fn save_module(
        &mut self,
        id: &ModuleId,
        progress_tx: Option<ProgressSender>,
    ) -> Result<ModuleSaveReport, AuthoringError> {
        let course_id = self.course_id("modules")?;
        let module = self.module(id)?;
        if module.title.trim().is_empty() {
            return Err(ValidationError::MissingField("module title").into());
        }

        let request = ModuleRequest::from_module(&course_id, module);
        let record = if module.id.is_persisted() {
            self.api.update_module(&request).await?
        } else {
            let record = self.api.create_module(&request).await?;
            if record.id.trim().is_empty() {
                return Err(RemoteCallError::new("The catalog service did not return a module id.").into());
            }
            record
        };

        let module = self
            .course
            .module_mut(id)
            .ok_or_else(|| AuthoringError::ModuleNotFound(id.to_string()))?;
        sync::adopt_module_id(module, &record);
        let module_id = module.id.clone();
        let remote_id = module
            .id
            .remote()
            .map(str::to_string)
            .ok_or_else(|| AuthoringError::ModuleNotFound(module_id.to_string()))?;
        let requests = drafts::plan_uploads(module, &remote_id, &self.registry);
        module.committing = !requests.is_empty();
        self.refresh();
        tracing::info!(module = %module_id, uploads = requests.len(), "module saved, uploading drafts");

        let api = &self.api;
        let mut uploads: FuturesUnordered<_> = requests
            .into_iter()
            .map(|request| {
                let progress_tx = progress_tx.clone();
                async move {
                    let handle = request.handle;
                    let label = request.title.clone();
                    let result = api.upload_material(request, progress_tx).await;
                    (handle, label, result)
                }
            })
            .collect();

        let mut uploaded = 0;
        let mut failures = Vec::new();
        while let Some((handle, label, result)) = uploads.next().await {
            match result {
                Ok(record) => {
                    if let Some(module) = self.course.module_mut(&module_id) {
                        drafts::commit_upload(module, handle, &record, &mut self.checkpoints, &mut self.registry);
                    }
                    uploaded += 1;
                }
                Err(error) => {
                    tracing::warn!(module = %module_id, file = %label, error = %error, "upload failed");
                    failures.push(BatchFailure { label, error });
                }
            }
            self.progress = progress::evaluate(&self.course, self.settings.min_outcomes);
        }
        drop(uploads);

        if let Some(module) = self.course.module_mut(&module_id) {
            module.committing = false;
        }
        self.capture();
        self.refresh();

        let report = ModuleSaveReport {
            module_id,
            uploaded,
            failures,
        };
        tracing::info!(module = %report.module_id, "{}", report.message());
        Ok(report)
    }

    // ── 강사 ────────────────────────────────────────────────

    pub async fn assign_instructor(&mut self, instructor_id: &str) -> Result<(), AuthoringError> {
        let course_id = self.course_id("instructors")?;
        let roster = &self.course.instructors;
        if !roster.contains(instructor_id) {
            return Err(AuthoringError::InstructorNotFound(instructor_id.to_string()));
        }
        if roster.is_assigned(instructor_id) {
            return Ok(());
        }

        self.api.assign_instructor(&course_id, instructor_id).await?;
        self.course.instructors.assign(instructor_id);
        tracing::info!(course = %course_id, instructor = instructor_id, "instructor assigned");
        self.capture();
        Ok(())
    }

    pub async fn unassign_instructor(&mut self, instructor_id: &str) -> Result<(), AuthoringError> {
        let course_id = self.course_id("instructors")?;
        let roster = &self.course.instructors;
        if !roster.contains(instructor_id) {
            return Err(AuthoringError::InstructorNotFound(instructor_id.to_string()));
        }
        if !roster.is_assigned(instructor_id) {
            return Ok(());
        }

        self.api.unassign_instructor(&course_id, instructor_id).await?;
        self.course.instructors.unassign(instructor_id);
        tracing::info!(course = %course_id, instructor = instructor_id, "instructor unassigned");
        self.capture();
        Ok(())
    }

    // ── 저장과 롤백 ──────────────────────────────────────────

    /// 저장 준비. 현재 세대가 티켓에 기록됩니다.
    pub fn prepare_save(&self) -> Result<SaveTicket, AuthoringError> {
        Ok(save::prepare_save(&self.course, self.epoch())?)
    }

    /// `save::execute` 결과를 반영합니다.
    /// 준비 이후 `discard()`가 있었다면 `AuthoringError::Stale`입니다.
    /// 이때도 서버가 발급한 식별자는 버퍼와 체크포인트 양쪽에 남깁니다.
    pub fn apply_save(&mut self, outcome: SaveOutcome) -> Result<SaveReport, AuthoringError> {
        let epoch = self.epoch();
        if outcome.epoch() != epoch {
            self.checkpoints
                .amend(|checkpoint| save::reconcile_stale(checkpoint, &outcome));
        }
        let applied = save::apply_save(&mut self.course, outcome, epoch);
        if applied.is_ok() {
            self.capture();
        }
        self.refresh();
        applied
    }

    /// 기본 정보와 개요를 저장하고 학습 목표를 맞춥니다.
    pub async fn save_draft(&mut self) -> Result<SaveReport, AuthoringError> {
        let ticket = self.prepare_save()?;
        let outcome = save::execute(&self.api, ticket).await?;
        self.apply_save(outcome)
    }

    /// 마지막 체크포인트로 되돌립니다. 체크포인트가 없으면 false.
    pub fn discard(&mut self) -> bool {
        match self.checkpoints.discard(&mut self.registry) {
            Some(restored) => {
                self.course = restored;
                self.refresh();
                true
            }
            None => false,
        }
    }

    /// 세션 종료. 살아 있는 핸들을 모두 회수하고 회수한 개수를 반환합니다.
    pub fn teardown(&mut self) -> usize {
        self.checkpoints.clear();
        let released = self.registry.release_all();
        if released > 0 {
            tracing::debug!(released, "released draft handles on teardown");
        }
        released
    }
}

impl<A: CatalogApi> Drop for AuthoringSession<A> {
    fn drop(&mut self) {
        self.teardown();
    }
}
