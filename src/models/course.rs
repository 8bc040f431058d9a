//! # 편집 중인 코스 (EditableCourse)
//!
//! 저작 화면이 편집 세션 동안 단독으로 소유하는 루트 집합체입니다.
//! 스냅샷은 이 구조체 전체를 `Clone`으로 깊은 복사하고,
//! 롤백 검증은 `PartialEq`로 구조적 동등성을 비교합니다.
//!
//! 선택형 필드(카테고리, 연령대, 난이도)는 `Option`으로 표현합니다.
//! "Select category" 같은 자리표시자 문자열로 미선택을 나타내지 않습니다.

use std::fmt;

use uuid::Uuid;

use super::material::PickedFile;
use super::module::{ModuleEditState, ModuleId};
use crate::drafts::DraftHandle;

/// 서버가 발급한 코스 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseId(pub String);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessTier {
    #[default]
    Free,
    Paid,
}

impl AccessTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Paid => "paid",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "paid" | "premium" => Self::Paid,
            _ => Self::Free,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrollmentType {
    #[default]
    SelfPaced,
    InstructorLed,
}

impl EnrollmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelfPaced => "self_paced",
            Self::InstructorLed => "instructor_led",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "instructor_led" | "live" => Self::InstructorLed,
            _ => Self::SelfPaced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationUnit {
    Hours,
    Days,
    #[default]
    Weeks,
    Months,
}

impl DurationUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "hour" | "hours" => Self::Hours,
            "day" | "days" => Self::Days,
            "month" | "months" => Self::Months,
            _ => Self::Weeks,
        }
    }
}

/// 코스 썸네일
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
    /// 서버에 이미 있는 이미지 주소
    Remote(String),
    /// 새로 고른 이미지. 기본 정보 저장 시 multipart로 함께 전송됩니다.
    Pending(PickedFile),
}

impl Thumbnail {
    pub fn is_present(&self) -> bool {
        match self {
            Self::Remote(url) => !url.trim().is_empty(),
            Self::Pending(file) => !file.bytes.is_empty(),
        }
    }
}

/// 기본 정보 섹션
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicInfo {
    pub title: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub age_group: Option<String>,
    pub price: f64,
    pub thumbnail: Option<Thumbnail>,
    pub access_tier: AccessTier,
    pub enrollment_type: EnrollmentType,
    pub is_visible: bool,
}

/// 개요 섹션
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Overview {
    pub description: String,
    pub duration: u32,
    pub duration_unit: DurationUnit,
    pub level: Option<String>,
    pub prerequisites: String,
    pub target_audience: String,
}

/// 세션 안에서만 쓰는 학습 목표 키.
/// 서버 ID가 없는 학습 목표도 저장 응답과 짝지을 수 있게 해줍니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutcomeKey(Uuid);

impl OutcomeKey {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for OutcomeKey {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutcomeId(pub String);

impl fmt::Display for OutcomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 학습 목표 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub key: OutcomeKey,
    /// None이면 아직 서버에 생성되지 않은 항목
    pub id: Option<OutcomeId>,
    pub description: String,
}

impl Outcome {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            key: OutcomeKey::new(),
            id: None,
            description: description.into(),
        }
    }

    pub fn from_remote(id: OutcomeId, description: impl Into<String>) -> Self {
        Self {
            key: OutcomeKey::new(),
            id: Some(id),
            description: description.into(),
        }
    }

    /// 빈 설명은 자리표시자 행으로 취급합니다.
    pub fn is_blank(&self) -> bool {
        self.description.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructorSummary {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}

/// 배정된 강사와 배정 가능한 강사 목록.
///
/// 두 목록은 항상 서로소입니다. 강사는 `assign`/`unassign`으로만
/// 한쪽에서 다른 쪽으로 이동하므로 동시에 두 목록에 있을 수 없습니다.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstructorRoster {
    assigned: Vec<InstructorSummary>,
    available: Vec<InstructorSummary>,
}

impl InstructorRoster {
    /// 전체 강사 목록과 배정된 ID 목록으로 명단을 만듭니다.
    /// 배정 목록에 있지만 전체 목록에 없는 강사도 배정 쪽에 포함합니다.
    pub fn new(all: Vec<InstructorSummary>, assigned: Vec<InstructorSummary>) -> Self {
        let available = all
            .into_iter()
            .filter(|i| !assigned.iter().any(|a| a.id == i.id))
            .collect();
        let mut deduped: Vec<InstructorSummary> = Vec::with_capacity(assigned.len());
        for instructor in assigned {
            if !deduped.iter().any(|a| a.id == instructor.id) {
                deduped.push(instructor);
            }
        }
        Self {
            assigned: deduped,
            available,
        }
    }

    pub fn assigned(&self) -> &[InstructorSummary] {
        &self.assigned
    }

    pub fn available(&self) -> &[InstructorSummary] {
        &self.available
    }

    pub fn is_assigned(&self, id: &str) -> bool {
        self.assigned.iter().any(|i| i.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.is_assigned(id) || self.available.iter().any(|i| i.id == id)
    }

    /// 배정 가능 목록에서 배정 목록 끝으로 옮깁니다. 옮겼으면 true.
    pub fn assign(&mut self, id: &str) -> bool {
        match self.available.iter().position(|i| i.id == id) {
            Some(index) => {
                let instructor = self.available.remove(index);
                self.assigned.push(instructor);
                true
            }
            None => false,
        }
    }

    /// 배정 목록에서 배정 가능 목록 끝으로 옮깁니다. 옮겼으면 true.
    pub fn unassign(&mut self, id: &str) -> bool {
        match self.assigned.iter().position(|i| i.id == id) {
            Some(index) => {
                let instructor = self.assigned.remove(index);
                self.available.push(instructor);
                true
            }
            None => false,
        }
    }
}

/// 편집 세션의 루트 집합체
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditableCourse {
    /// 첫 기본 정보 저장이 성공하기 전까지 None ("새 코스")
    pub identity: Option<CourseId>,
    pub basic_info: BasicInfo,
    pub overview: Overview,
    pub outcomes: Vec<Outcome>,
    /// 삭제 표시된 학습 목표의 서버 ID. 저장이 성공할 때까지 보관합니다.
    pub removed_outcomes: Vec<OutcomeId>,
    pub modules: Vec<ModuleEditState>,
    pub instructors: InstructorRoster,
}

impl EditableCourse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_new(&self) -> bool {
        self.identity.is_none()
    }

    pub fn module(&self, id: &ModuleId) -> Option<&ModuleEditState> {
        self.modules.iter().find(|m| &m.id == id)
    }

    pub fn module_mut(&mut self, id: &ModuleId) -> Option<&mut ModuleEditState> {
        self.modules.iter_mut().find(|m| &m.id == id)
    }

    pub fn outcome(&self, key: OutcomeKey) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.key == key)
    }

    pub fn outcome_mut(&mut self, key: OutcomeKey) -> Option<&mut Outcome> {
        self.outcomes.iter_mut().find(|o| o.key == key)
    }

    /// 버퍼가 참조하는 모든 임시 자료 핸들
    pub fn draft_handles(&self) -> Vec<DraftHandle> {
        self.modules.iter().flat_map(|m| m.draft_handles()).collect()
    }
}
