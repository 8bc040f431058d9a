//! # 다단계 저장 (Save Draft)
//!
//! 저장은 세 단계로 나뉩니다.
//!
//! ```text
//! prepare_save()  : 제목 검증 + 보낼 내용 확정 (동기, 네트워크 없음)
//!      │
//! execute()       : 1단계 코스 생성/수정 → 성공 시에만 2단계 학습 목표 삭제/생성/수정 (동시)
//!      │
//! apply_save()    : 세대(epoch) 확인 후 결과를 버퍼에 반영
//! ```
//!
//! `execute()`는 버퍼를 빌리지 않으므로 응답을 기다리는 동안에도 편집과
//! "변경 취소"가 가능합니다. 취소가 일어나면 세대가 바뀌어 늦게 도착한
//! 결과는 `AuthoringError::Stale`로 버려집니다.

use futures::future::join_all;

use crate::catalog::{CatalogApi, CourseForm, OutcomeRequest};
use crate::error::{AuthoringError, BatchFailure, PartialBatchFailure, RemoteCallError, ValidationError};
use crate::models::*;

const OUTCOME_BATCH: &str = "outcome changes succeeded";

/// 저장 준비 결과. 발급 시점의 세대를 기억합니다.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    epoch: u64,
    identity: Option<CourseId>,
    form: CourseForm,
    deletions: Vec<OutcomeId>,
    creates: Vec<(OutcomeKey, String)>,
    updates: Vec<(OutcomeKey, OutcomeId, String)>,
}

impl SaveTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_create(&self) -> bool {
        self.identity.is_none()
    }

    /// 2단계에서 보낼 호출 수
    pub fn outcome_call_count(&self) -> usize {
        self.deletions.len() + self.creates.len() + self.updates.len()
    }
}

/// 원격 호출 결과 묶음. 아직 버퍼에 반영되지 않은 상태입니다.
#[derive(Debug)]
pub struct SaveOutcome {
    epoch: u64,
    created_course: bool,
    course_id: CourseId,
    course: CourseRecord,
    deleted: Vec<(OutcomeId, Result<(), RemoteCallError>)>,
    created: Vec<(OutcomeKey, String, Result<OutcomeRecord, RemoteCallError>)>,
    updated: Vec<(OutcomeKey, String, Result<OutcomeRecord, RemoteCallError>)>,
}

impl SaveOutcome {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// 저장 결과 보고
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub course_id: CourseId,
    /// 이번 저장으로 코스가 처음 생성되었는지
    pub created_course: bool,
    pub succeeded: usize,
    pub failures: Vec<BatchFailure>,
}

impl SaveReport {
    pub fn partial_failure(&self) -> Option<PartialBatchFailure> {
        if self.failures.is_empty() {
            return None;
        }
        Some(PartialBatchFailure {
            operation: OUTCOME_BATCH,
            succeeded: self.succeeded,
            failures: self.failures.clone(),
        })
    }

    /// 사용자에게 보여줄 문구
    pub fn message(&self) -> String {
        match self.partial_failure() {
            Some(failure) => failure.to_string(),
            None if self.created_course => "Course created.".to_string(),
            None => "Course saved.".to_string(),
        }
    }
}

/// 저장할 내용을 확정합니다. 제목이 비어 있으면 네트워크에 가지 않습니다.
pub fn prepare_save(course: &EditableCourse, epoch: u64) -> Result<SaveTicket, ValidationError> {
    if course.basic_info.title.trim().is_empty() {
        return Err(ValidationError::MissingField("title"));
    }

    let mut creates = Vec::new();
    let mut updates = Vec::new();
    for outcome in course.outcomes.iter().filter(|o| !o.is_blank()) {
        let description = outcome.description.trim().to_string();
        match &outcome.id {
            Some(id) => updates.push((outcome.key, id.clone(), description)),
            None => creates.push((outcome.key, description)),
        }
    }

    Ok(SaveTicket {
        epoch,
        identity: course.identity.clone(),
        form: CourseForm::from_course(course),
        deletions: course.removed_outcomes.clone(),
        creates,
        updates,
    })
}

/// 원격 호출을 수행합니다.
///
/// 1단계(코스 생성/수정)가 실패하면 2단계는 시작하지 않고 에러를 반환합니다.
/// 2단계의 개별 실패는 결과에 담아 돌려줍니다.
pub async fn execute<A: CatalogApi>(api: &A, ticket: SaveTicket) -> Result<SaveOutcome, RemoteCallError> {
    let SaveTicket {
        epoch,
        identity,
        form,
        deletions,
        creates,
        updates,
    } = ticket;

    // 1단계
    let course = match &identity {
        None => api.create_course(&form).await?,
        Some(id) => api.update_course(id, &form).await?,
    };
    let course_id = if !course.id.trim().is_empty() {
        CourseId(course.id.clone())
    } else {
        identity
            .clone()
            .ok_or_else(|| RemoteCallError::new("The catalog service did not return a course id."))?
    };
    tracing::info!(course = %course_id, created = identity.is_none(), "saved basic info");

    // 2단계: 1단계 결과를 안 뒤에만 시작
    let course_ref = &course_id;
    let deleting = join_all(deletions.into_iter().map(|id| async move {
        let result = api.delete_outcome(course_ref, &id).await;
        (id, result)
    }));
    let creating = join_all(creates.into_iter().map(|(key, description)| async move {
        let request = OutcomeRequest {
            course_id: course_ref.0.clone(),
            outcome_id: None,
            description: description.clone(),
        };
        let result = api.create_outcome(&request).await;
        (key, description, result)
    }));
    let updating = join_all(updates.into_iter().map(|(key, id, description)| async move {
        let request = OutcomeRequest {
            course_id: course_ref.0.clone(),
            outcome_id: Some(id.0.clone()),
            description: description.clone(),
        };
        let result = api.update_outcome(&request).await;
        (key, description, result)
    }));
    let (deleted, created, updated) = futures::join!(deleting, creating, updating);

    Ok(SaveOutcome {
        epoch,
        created_course: identity.is_none(),
        course_id,
        course,
        deleted,
        created,
        updated,
    })
}

/// 롤백 이후에 도착한 응답에서 서버가 이미 확정한 부분만 반영합니다.
///
/// - 새로 발급된 코스 식별자는 항상 받아들입니다 (새 코스 → 기존 코스는 되돌릴 수 없음).
/// - 생성된 학습 목표가 버퍼에 남아 있으면 id를 붙이고, 없으면 다음 저장에서 지우도록 표시합니다.
/// - 서버에서 지워진 학습 목표는 id를 떼어 다음 저장에서 다시 만들어지게 합니다.
///
/// 편집 내용(제목, 설명 등)은 건드리지 않습니다.
pub fn reconcile_stale(course: &mut EditableCourse, outcome: &SaveOutcome) {
    course.identity = Some(outcome.course_id.clone());

    for (id, result) in &outcome.deleted {
        if result.is_err() {
            continue;
        }
        course.removed_outcomes.retain(|removed| removed != id);
        for local in course.outcomes.iter_mut().filter(|o| o.id.as_ref() == Some(id)) {
            local.id = None;
        }
    }

    for (key, _, result) in &outcome.created {
        let Ok(record) = result else { continue };
        if record.id.trim().is_empty() {
            continue;
        }
        let id = OutcomeId(record.id.clone());
        match course.outcome_mut(*key) {
            Some(local) if local.id.is_none() => local.id = Some(id),
            _ => {
                if !course.removed_outcomes.contains(&id) {
                    course.removed_outcomes.push(id);
                }
            }
        }
    }
}

/// 결과를 버퍼에 반영합니다.
/// 세대가 다르면 `reconcile_stale`만 적용하고 `AuthoringError::Stale`을 반환합니다.
pub fn apply_save(
    course: &mut EditableCourse,
    outcome: SaveOutcome,
    current_epoch: u64,
) -> Result<SaveReport, AuthoringError> {
    if outcome.epoch != current_epoch {
        tracing::warn!(
            issued = outcome.epoch,
            current = current_epoch,
            course = %outcome.course_id,
            "stale save response, keeping only server-issued ids"
        );
        reconcile_stale(course, &outcome);
        return Err(AuthoringError::Stale {
            issued: outcome.epoch,
            current: current_epoch,
        });
    }

    course.identity = Some(outcome.course_id.clone());
    let thumbnail_pending = matches!(course.basic_info.thumbnail, Some(Thumbnail::Pending(_)));
    if let Some(url) = outcome.course.thumbnail.as_deref().filter(|u| !u.trim().is_empty()) {
        if thumbnail_pending {
            course.basic_info.thumbnail = Some(Thumbnail::Remote(url.to_string()));
        }
    }

    let mut succeeded = 0;
    let mut failures = Vec::new();

    for (id, result) in outcome.deleted {
        match result {
            Ok(()) => {
                course.removed_outcomes.retain(|removed| removed != &id);
                succeeded += 1;
            }
            Err(error) => failures.push(BatchFailure {
                label: format!("delete outcome {}", id),
                error,
            }),
        }
    }

    for (key, description, result) in outcome.created {
        let record = result.and_then(|record| {
            if record.id.trim().is_empty() {
                Err(RemoteCallError::new("The catalog service did not return an outcome id."))
            } else {
                Ok(record)
            }
        });
        match record {
            Ok(record) => {
                match course.outcome_mut(key) {
                    Some(local) => local.id = Some(OutcomeId(record.id)),
                    None => tracing::warn!(outcome = %record.id, "created outcome no longer in buffer"),
                }
                succeeded += 1;
            }
            Err(error) => failures.push(BatchFailure {
                label: description,
                error,
            }),
        }
    }

    for (_, description, result) in outcome.updated {
        match result {
            Ok(_) => succeeded += 1,
            Err(error) => failures.push(BatchFailure {
                label: description,
                error,
            }),
        }
    }

    let report = SaveReport {
        course_id: outcome.course_id,
        created_course: outcome.created_course,
        succeeded,
        failures,
    };
    if report.failures.is_empty() {
        tracing::info!(course = %report.course_id, outcome_changes = succeeded, "course saved");
    } else {
        tracing::warn!(course = %report.course_id, "{}", report.message());
    }
    Ok(report)
}
