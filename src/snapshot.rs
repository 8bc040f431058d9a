//! # 체크포인트(스냅샷/롤백) 관리
//!
//! 마지막으로 확정된 편집 상태를 하나만 보관하고, "변경 취소" 시 그 상태로 되돌립니다.
//!
//! ## 체크포인트 흐름
//! ```text
//! load/save 성공 ──▶ capture()  : 버퍼 전체를 깊은 복사해 유일한 체크포인트로 저장
//! 사용자 편집   ──▶ retire()   : 버퍼에서 빠진 임시 자료 핸들을 회수(또는 회수 보류)
//! 변경 취소     ──▶ discard()  : 체크포인트 이후 발급된 핸들 회수 + 체크포인트 복사본 반환
//! ```
//!
//! ## 핸들 회수 규칙
//! 체크포인트보다 먼저 발급된 핸들은 체크포인트가 아직 참조하고 있습니다.
//! 이런 핸들을 즉시 회수하면 롤백 후 버퍼가 회수된 핸들을 가리키게 되므로,
//! 다음 `capture()`로 체크포인트가 교체될 때까지 회수를 보류합니다.
//! 체크포인트 이후에 발급된 핸들은 어디에도 더 참조되지 않으므로 즉시 회수합니다.

use chrono::{DateTime, Utc};

use crate::drafts::{DraftHandle, HandleMark, HandleRegistry};
use crate::models::EditableCourse;

/// 변경 불가능한 확정 상태 하나
#[derive(Debug, Clone)]
pub struct Checkpoint {
    course: EditableCourse,
    mark: HandleMark,
    captured_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn course(&self) -> &EditableCourse {
        &self.course
    }

    pub fn mark(&self) -> HandleMark {
        self.mark
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

/// `retire` 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retirement {
    Released,
    /// 체크포인트가 참조 중이라 다음 capture까지 보류
    Deferred,
}

#[derive(Debug, Default)]
pub struct CheckpointManager {
    live: Option<Checkpoint>,
    deferred: Vec<DraftHandle>,
    /// discard()마다 1씩 증가. 롤백 이전에 시작된 원격 작업의 응답을 걸러냅니다.
    epoch: u64,
}

impl CheckpointManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 현재 버퍼를 유일한 체크포인트로 저장하고, 보류 중이던 핸들을 회수합니다.
    pub fn capture(&mut self, course: &EditableCourse, registry: &mut HandleRegistry) {
        for handle in self.deferred.drain(..) {
            registry.release(handle);
        }
        self.live = Some(Checkpoint {
            course: course.clone(),
            mark: registry.mark(),
            captured_at: Utc::now(),
        });
        tracing::debug!(
            modules = course.modules.len(),
            outcomes = course.outcomes.len(),
            live_handles = registry.live_count(),
            "captured checkpoint"
        );
    }

    /// 버퍼에서 빠진 핸들을 정리합니다.
    pub fn retire(&mut self, handle: DraftHandle, registry: &mut HandleRegistry) -> Retirement {
        match &self.live {
            Some(checkpoint) if !checkpoint.mark.covers(handle) => {
                if !self.deferred.contains(&handle) {
                    self.deferred.push(handle);
                }
                Retirement::Deferred
            }
            _ => {
                registry.release(handle);
                Retirement::Released
            }
        }
    }

    /// 체크포인트 이후에 발급된 핸들을 회수하고, 체크포인트의 새 깊은 복사본을 반환합니다.
    /// 체크포인트는 그대로 남아 있어 다시 취소할 수 있습니다.
    pub fn discard(&mut self, registry: &mut HandleRegistry) -> Option<EditableCourse> {
        let checkpoint = self.live.as_ref()?;
        let released = registry.release_since(checkpoint.mark);
        // 보류 중이던 핸들은 복원될 버퍼가 다시 참조합니다.
        self.deferred.clear();
        self.epoch += 1;
        tracing::info!(
            released = released.len(),
            epoch = self.epoch,
            "discarded unsaved edits"
        );
        Some(checkpoint.course.clone())
    }

    /// 서버에서 이미 확정된 사실을 체크포인트에 반영합니다.
    /// 핸들 표시(mark)와 캡처 시각은 바꾸지 않습니다.
    pub fn amend(&mut self, f: impl FnOnce(&mut EditableCourse)) -> bool {
        match self.live.as_mut() {
            Some(checkpoint) => {
                f(&mut checkpoint.course);
                true
            }
            None => false,
        }
    }

    pub fn checkpoint(&self) -> Option<&Checkpoint> {
        self.live.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn deferred(&self) -> &[DraftHandle] {
        &self.deferred
    }

    /// 세션 종료 시 보류 목록을 비웁니다 (실제 회수는 레지스트리의 release_all이 담당).
    pub fn clear(&mut self) {
        self.live = None;
        self.deferred.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PickedFile;

    #[test]
    fn handles_older_than_checkpoint_are_deferred() {
        let mut registry = HandleRegistry::new();
        let mut checkpoints = CheckpointManager::new();
        let old = registry.allocate(PickedFile::new("old.mp4", vec![1]));
        checkpoints.capture(&EditableCourse::new(), &mut registry);
        let new = registry.allocate(PickedFile::new("new.mp4", vec![1]));

        assert_eq!(checkpoints.retire(old, &mut registry), Retirement::Deferred);
        assert_eq!(checkpoints.retire(new, &mut registry), Retirement::Released);
        assert!(registry.is_live(old));
        assert!(!registry.is_live(new));

        checkpoints.capture(&EditableCourse::new(), &mut registry);
        assert!(!registry.is_live(old));
        assert!(checkpoints.deferred().is_empty());
    }

    #[test]
    fn discard_bumps_epoch_and_keeps_checkpoint() {
        let mut registry = HandleRegistry::new();
        let mut checkpoints = CheckpointManager::new();
        let mut course = EditableCourse::new();
        course.basic_info.title = "Saved".into();
        checkpoints.capture(&course, &mut registry);

        let restored = checkpoints.discard(&mut registry).unwrap();
        assert_eq!(restored, course);
        assert_eq!(checkpoints.epoch(), 1);
        assert!(checkpoints.discard(&mut registry).is_some());
        assert_eq!(checkpoints.epoch(), 2);
    }
}
