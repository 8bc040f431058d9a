//! # 모듈 자료 임시 저장/확정 파이프라인
//!
//! 네트워크와 무관한 로컬 단계만 다룹니다. 원격 호출(업로드, 삭제, 이름 변경)은
//! 세션이 수행하고, 그 결과를 이 함수들로 버퍼에 반영합니다.
//!
//! ## 핸들 소유 규칙
//! 임시 자료 하나는 핸들 하나를 단독으로 소유합니다. 버퍼에서 빠지는 모든 경로
//! (삭제, 이름 변경, 업로드 확정)는 `CheckpointManager::retire`를 거쳐야 하며,
//! 그래야 체크포인트가 참조하는 핸들이 너무 일찍 회수되지 않습니다.

use crate::catalog::UploadRequest;
use crate::error::{AuthoringError, ValidationError};
use crate::models::*;
use crate::snapshot::CheckpointManager;
use crate::sync::material_from_record;

use super::registry::{DraftHandle, HandleRegistry};

/// 파일 선택 결과
#[derive(Debug, Default)]
pub struct PickOutcome {
    /// 새로 발급된 핸들 (선택 순서대로)
    pub accepted: Vec<DraftHandle>,
    /// 거부된 파일별 검증 에러
    pub rejected: Vec<ValidationError>,
}

impl PickOutcome {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// 모듈의 현재 자료 분류로 파일을 걸러 임시 자료로 추가합니다.
pub fn pick_files(
    module: &mut ModuleEditState,
    files: Vec<PickedFile>,
    registry: &mut HandleRegistry,
) -> PickOutcome {
    let category = module.material_category;
    let mut outcome = PickOutcome::default();

    for file in files {
        if !category.allows(&file.name) {
            outcome.rejected.push(ValidationError::DisallowedExtension {
                file_name: file.name,
                category,
            });
            continue;
        }
        if file.bytes.is_empty() {
            outcome.rejected.push(ValidationError::EmptyFile(file.name));
            continue;
        }

        let display_name = file.name.clone();
        let mime_type = file.mime_type.clone();
        let size_bytes = file.size();
        let draft = DraftMaterial {
            handle: registry.allocate(file),
            display_name,
            size_bytes,
            mime_type,
            category,
        };
        outcome.accepted.push(draft.handle);
        module.draft_materials.push(draft);
    }

    if !outcome.rejected.is_empty() {
        tracing::warn!(
            module = %module.id,
            rejected = outcome.rejected.len(),
            "rejected picked files"
        );
    }
    outcome
}

/// 임시 자료를 버퍼에서 빼고 핸들을 정리합니다. 원격 호출은 없습니다.
pub fn remove_draft(
    module: &mut ModuleEditState,
    handle: DraftHandle,
    checkpoints: &mut CheckpointManager,
    registry: &mut HandleRegistry,
) -> Result<DraftMaterial, AuthoringError> {
    let index = module
        .draft_materials
        .iter()
        .position(|d| d.handle == handle)
        .ok_or(AuthoringError::MaterialNotFound)?;
    let draft = module.draft_materials.remove(index);
    checkpoints.retire(handle, registry);
    Ok(draft)
}

/// 이름 변경 후 표시할 이름. 새 이름에 확장자가 없으면 원래 확장자를 붙입니다.
pub fn normalized_rename(current: &str, requested: &str) -> Result<String, ValidationError> {
    let requested = requested.trim();
    if requested.is_empty() {
        return Err(ValidationError::MissingField("material name"));
    }
    match (extension_of(requested), extension_of(current)) {
        (None, Some(ext)) => Ok(format!("{}.{}", requested, ext)),
        _ => Ok(requested.to_string()),
    }
}

/// 임시 자료의 이름을 바꿉니다.
///
/// 이름이 바뀐 파일에 새 핸들을 발급하고, 이전 핸들은 정리합니다.
/// 새 이름도 자료 분류의 확장자 규칙을 따라야 합니다. 반환값은 새 핸들입니다.
pub fn rename_draft(
    module: &mut ModuleEditState,
    handle: DraftHandle,
    new_name: &str,
    checkpoints: &mut CheckpointManager,
    registry: &mut HandleRegistry,
) -> Result<DraftHandle, AuthoringError> {
    let draft = module
        .draft_materials
        .iter_mut()
        .find(|d| d.handle == handle)
        .ok_or(AuthoringError::MaterialNotFound)?;
    let name = normalized_rename(&draft.display_name, new_name)?;
    if !draft.category.allows(&name) {
        return Err(ValidationError::DisallowedExtension {
            file_name: name,
            category: draft.category,
        }
        .into());
    }
    let file = registry
        .file(handle)
        .ok_or(AuthoringError::MaterialNotFound)?
        .renamed(name.clone());

    let renamed = registry.allocate(file);
    draft.handle = renamed;
    draft.display_name = name;
    checkpoints.retire(handle, registry);
    Ok(renamed)
}

/// 모듈의 모든 임시 자료에 대한 업로드 요청을 만듭니다.
/// 레지스트리에서 파일을 찾을 수 없는 항목은 건너뜁니다.
pub fn plan_uploads(
    module: &ModuleEditState,
    module_id: &str,
    registry: &HandleRegistry,
) -> Vec<UploadRequest> {
    module
        .draft_materials
        .iter()
        .filter_map(|draft| {
            let Some(file) = registry.file(draft.handle) else {
                tracing::warn!(handle = draft.handle.sequence(), "draft without a live file");
                return None;
            };
            Some(UploadRequest {
                module_id: module_id.to_string(),
                handle: draft.handle,
                title: draft.display_name.clone(),
                category: draft.category,
                file: file.clone(),
            })
        })
        .collect()
}

/// 업로드 하나가 성공했을 때 버퍼에 반영합니다.
///
/// 순서: 확정 자료 추가 → 임시 자료 제거 → 핸들 정리.
/// 해당 임시 자료가 이미 없으면(롤백 등) 아무것도 하지 않고 None.
pub fn commit_upload(
    module: &mut ModuleEditState,
    handle: DraftHandle,
    record: &MaterialRecord,
    checkpoints: &mut CheckpointManager,
    registry: &mut HandleRegistry,
) -> Option<CommittedMaterial> {
    let index = module
        .draft_materials
        .iter()
        .position(|d| d.handle == handle)?;

    let committed = material_from_record(record, Some(&module.draft_materials[index]));
    module.committed_materials.push(committed.clone());
    module.draft_materials.remove(index);
    checkpoints.retire(handle, registry);

    tracing::info!(
        module = %module.id,
        material = %committed.id,
        "material committed"
    );
    Some(committed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_module() -> ModuleEditState {
        let mut module = ModuleEditState::new();
        module.material_category = MaterialCategory::Video;
        module
    }

    #[test]
    fn pick_filters_by_category() {
        let mut registry = HandleRegistry::new();
        let mut module = video_module();
        let outcome = pick_files(
            &mut module,
            vec![
                PickedFile::new("intro.mp4", vec![1, 2, 3]),
                PickedFile::new("slides.pdf", vec![1]),
                PickedFile::new("empty.mov", vec![]),
            ],
            &mut registry,
        );

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 2);
        assert!(matches!(
            outcome.rejected[0],
            ValidationError::DisallowedExtension { .. }
        ));
        assert_eq!(outcome.rejected[1], ValidationError::EmptyFile("empty.mov".into()));
        assert_eq!(module.draft_materials.len(), 1);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn rename_keeps_extension_and_swaps_handle() {
        let mut registry = HandleRegistry::new();
        let mut checkpoints = CheckpointManager::new();
        let mut module = video_module();
        let picked = pick_files(&mut module, vec![PickedFile::new("a.mp4", vec![9])], &mut registry);
        let old = picked.accepted[0];

        let new = rename_draft(&mut module, old, "Week 1 intro", &mut checkpoints, &mut registry).unwrap();

        assert_ne!(old, new);
        assert!(!registry.is_live(old));
        assert_eq!(module.draft_materials[0].display_name, "Week 1 intro.mp4");
        assert_eq!(registry.file(new).unwrap().name, "Week 1 intro.mp4");
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn rename_cannot_escape_the_category() {
        let mut registry = HandleRegistry::new();
        let mut checkpoints = CheckpointManager::new();
        let mut module = video_module();
        let picked = pick_files(&mut module, vec![PickedFile::new("a.mp4", vec![9])], &mut registry);
        let handle = picked.accepted[0];

        let err = rename_draft(&mut module, handle, "a.exe", &mut checkpoints, &mut registry).unwrap_err();

        assert!(matches!(
            err,
            AuthoringError::Validation(ValidationError::DisallowedExtension { ref file_name, category: MaterialCategory::Video })
                if file_name == "a.exe"
        ));
        assert_eq!(module.draft_materials[0].handle, handle);
        assert_eq!(module.draft_materials[0].display_name, "a.mp4");
        assert!(registry.is_live(handle));
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn blank_rename_is_rejected() {
        assert_eq!(
            normalized_rename("a.pdf", "   "),
            Err(ValidationError::MissingField("material name"))
        );
        assert_eq!(normalized_rename("a.pdf", "b.txt").unwrap(), "b.txt");
    }

    #[test]
    fn commit_moves_draft_to_committed() {
        let mut registry = HandleRegistry::new();
        let mut checkpoints = CheckpointManager::new();
        let mut module = video_module();
        let picked = pick_files(&mut module, vec![PickedFile::new("a.mp4", vec![9; 4])], &mut registry);
        let handle = picked.accepted[0];

        let record = MaterialRecord {
            id: "mat-1".into(),
            url: Some("https://cdn/a.mp4".into()),
            ..Default::default()
        };
        let committed = commit_upload(&mut module, handle, &record, &mut checkpoints, &mut registry).unwrap();

        assert_eq!(committed.display_name, "a.mp4");
        assert_eq!(committed.size_bytes, 4);
        assert!(module.draft_materials.is_empty());
        assert_eq!(module.committed_materials.len(), 1);
        assert!(!registry.is_live(handle));
        assert!(commit_upload(&mut module, handle, &record, &mut checkpoints, &mut registry).is_none());
    }
}
