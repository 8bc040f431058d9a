//! # 모듈(Module) 편집 상태
//!
//! 코스는 여러 모듈로 구성되고, 각 모듈은 확정 자료와 임시 자료를 따로 보관합니다.
//!
//! ## 모듈 ID
//! 새로 추가한 모듈은 서버에 생성되기 전까지 로컬 임시 ID(`ModuleId::Local`)를 씁니다.
//! 생성 호출이 성공하는 즉시 서버 ID(`ModuleId::Remote`)로 교체됩니다.
//!
//! ## 자료 단계
//! ```text
//! Empty ──pick──▶ HasDrafts ──save──▶ Committing ──▶ HasCommittedMaterials
//!                     ▲                                        │
//!                     └──────────────── pick ──────────────────┘
//! ```

use std::fmt;

use uuid::Uuid;

use super::material::{CommittedMaterial, DraftMaterial, MaterialCategory, MaterialId};
use crate::drafts::DraftHandle;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleId {
    /// 서버에 아직 없는 모듈
    Local(Uuid),
    /// 서버가 발급한 ID
    Remote(String),
}

impl ModuleId {
    pub fn new_local() -> Self {
        Self::Local(Uuid::now_v7())
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    pub fn remote(&self) -> Option<&str> {
        match self {
            Self::Remote(id) => Some(id),
            Self::Local(_) => None,
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(id) => write!(f, "local-{}", id),
            Self::Remote(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulePhase {
    Empty,
    HasDrafts,
    Committing,
    HasCommittedMaterials,
}

/// 편집 중인 모듈 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEditState {
    pub id: ModuleId,
    pub title: String,
    pub description: String,
    pub session_count: u32,
    pub session_duration_minutes: u32,
    /// 다음 파일 선택에 적용할 자료 분류
    pub material_category: MaterialCategory,
    pub committed_materials: Vec<CommittedMaterial>,
    pub draft_materials: Vec<DraftMaterial>,
    /// 모듈 저장(업로드)이 진행 중인지
    pub committing: bool,
}

impl Default for ModuleEditState {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleEditState {
    /// 로컬 임시 ID를 가진 빈 모듈
    pub fn new() -> Self {
        Self {
            id: ModuleId::new_local(),
            title: String::new(),
            description: String::new(),
            session_count: 0,
            session_duration_minutes: 0,
            material_category: MaterialCategory::default(),
            committed_materials: Vec::new(),
            draft_materials: Vec::new(),
            committing: false,
        }
    }

    /// 제목, 설명, 세션 수, 세션 길이가 모두 채워졌는지
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.description.trim().is_empty()
            && self.session_count > 0
            && self.session_duration_minutes > 0
    }

    pub fn has_committed_materials(&self) -> bool {
        !self.committed_materials.is_empty()
    }

    pub fn phase(&self) -> ModulePhase {
        if self.committing {
            ModulePhase::Committing
        } else if !self.draft_materials.is_empty() {
            ModulePhase::HasDrafts
        } else if !self.committed_materials.is_empty() {
            ModulePhase::HasCommittedMaterials
        } else {
            ModulePhase::Empty
        }
    }

    pub fn draft(&self, handle: DraftHandle) -> Option<&DraftMaterial> {
        self.draft_materials.iter().find(|d| d.handle == handle)
    }

    pub fn committed(&self, id: &MaterialId) -> Option<&CommittedMaterial> {
        self.committed_materials.iter().find(|m| &m.id == id)
    }

    pub fn draft_handles(&self) -> impl Iterator<Item = DraftHandle> + '_ {
        self.draft_materials.iter().map(|d| d.handle)
    }
}
