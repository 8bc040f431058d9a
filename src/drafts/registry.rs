//! # 임시 자료 핸들 레지스트리
//!
//! 업로드 전 파일을 가리키는 로컬 핸들을 발급하고 회수합니다.
//! 브라우저의 object URL처럼, 핸들이 살아 있는 동안 파일 내용과
//! 미리보기 주소(`blob:course-authoring/<uuid>`)를 레지스트리가 보관합니다.
//!
//! ## 불변식
//! - `allocate` 한 번마다 살아 있는 핸들이 하나 늘고, `release` 한 번마다 하나 줄어듭니다.
//! - 이미 회수한 핸들을 다시 `release`해도 아무 일도 일어나지 않습니다 (중복 정리 허용).
//! - 세션 종료 시 `release_all` 후에는 살아 있는 핸들이 없어야 합니다.
//!
//! 실행 모델이 단일 스레드이므로 락 없이 단순한 맵으로 관리합니다.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::PickedFile;

/// 레지스트리가 발급한 핸들. 번호는 단조 증가합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DraftHandle(u64);

impl DraftHandle {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// 특정 시점의 발급 위치. 이 표시 이후에 발급된 핸들을 골라낼 때 씁니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HandleMark(u64);

impl HandleMark {
    /// 이 표시 이후(포함)에 발급된 핸들인지
    pub fn covers(self, handle: DraftHandle) -> bool {
        handle.0 >= self.0
    }
}

#[derive(Debug)]
struct LiveHandle {
    file: PickedFile,
    preview_url: String,
    allocated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct HandleRegistry {
    next: u64,
    live: BTreeMap<DraftHandle, LiveHandle>,
    allocated_total: u64,
    released_total: u64,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 파일 하나에 핸들 하나를 발급합니다.
    pub fn allocate(&mut self, file: PickedFile) -> DraftHandle {
        let handle = DraftHandle(self.next);
        self.next += 1;
        let preview_url = format!("blob:course-authoring/{}", Uuid::now_v7());
        tracing::debug!(
            handle = handle.0,
            file = %file.name,
            bytes = file.bytes.len(),
            "allocated draft handle"
        );
        self.live.insert(
            handle,
            LiveHandle {
                file,
                preview_url,
                allocated_at: Utc::now(),
            },
        );
        self.allocated_total += 1;
        handle
    }

    /// 핸들을 회수합니다. 실제로 회수했으면 true, 이미 회수된 핸들이면 false.
    pub fn release(&mut self, handle: DraftHandle) -> bool {
        match self.live.remove(&handle) {
            Some(entry) => {
                self.released_total += 1;
                tracing::debug!(
                    handle = handle.0,
                    file = %entry.file.name,
                    "released draft handle"
                );
                true
            }
            None => false,
        }
    }

    /// 살아 있는 모든 핸들을 회수하고 회수한 개수를 반환합니다.
    pub fn release_all(&mut self) -> usize {
        let handles: Vec<DraftHandle> = self.live.keys().copied().collect();
        handles.into_iter().filter(|h| self.release(*h)).count()
    }

    /// `mark` 이후에 발급되어 아직 살아 있는 핸들을 모두 회수합니다.
    pub fn release_since(&mut self, mark: HandleMark) -> Vec<DraftHandle> {
        let handles: Vec<DraftHandle> = self
            .live
            .range(DraftHandle(mark.0)..)
            .map(|(h, _)| *h)
            .collect();
        for handle in &handles {
            self.release(*handle);
        }
        handles
    }

    /// 다음에 발급될 위치
    pub fn mark(&self) -> HandleMark {
        HandleMark(self.next)
    }

    pub fn is_live(&self, handle: DraftHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_handles(&self) -> Vec<DraftHandle> {
        self.live.keys().copied().collect()
    }

    pub fn file(&self, handle: DraftHandle) -> Option<&PickedFile> {
        self.live.get(&handle).map(|e| &e.file)
    }

    pub fn preview_url(&self, handle: DraftHandle) -> Option<&str> {
        self.live.get(&handle).map(|e| e.preview_url.as_str())
    }

    pub fn allocated_at(&self, handle: DraftHandle) -> Option<DateTime<Utc>> {
        self.live.get(&handle).map(|e| e.allocated_at)
    }

    pub fn allocated_total(&self) -> u64 {
        self.allocated_total
    }

    pub fn released_total(&self) -> u64 {
        self.released_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> PickedFile {
        PickedFile::new(name, vec![0u8; 8])
    }

    #[test]
    fn release_is_idempotent() {
        let mut registry = HandleRegistry::new();
        let handle = registry.allocate(file("a.mp4"));
        assert!(registry.is_live(handle));
        assert!(registry.release(handle));
        assert!(!registry.release(handle));
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.released_total(), 1);
    }

    #[test]
    fn release_since_only_touches_newer_handles() {
        let mut registry = HandleRegistry::new();
        let old = registry.allocate(file("old.mp4"));
        let mark = registry.mark();
        let new_a = registry.allocate(file("a.mp4"));
        let new_b = registry.allocate(file("b.mp4"));

        let released = registry.release_since(mark);
        assert_eq!(released, vec![new_a, new_b]);
        assert!(registry.is_live(old));
        assert!(mark.covers(new_a));
        assert!(!mark.covers(old));
    }

    #[test]
    fn every_handle_gets_its_own_preview_url() {
        let mut registry = HandleRegistry::new();
        let a = registry.allocate(file("a.pdf"));
        let b = registry.allocate(file("a.pdf"));
        assert_ne!(registry.preview_url(a), registry.preview_url(b));
        assert_eq!(registry.release_all(), 2);
        assert_eq!(registry.allocated_total(), registry.released_total());
    }
}
