//! # 가중치 기반 전체 완료율
//!
//! | 섹션 | 가중치 |
//! |------|--------|
//! | 기본 정보 | 5 |
//! | 개요 | 5 |
//! | 학습 목표 | 1 |
//! | 모듈 | 8 |
//! | 자료 | 4 |
//!
//! 섹션마다 `round(ratio × weight)`로 점수를 먼저 반올림한 뒤 더하고,
//! 전체 완료율은 `round(100 × 합계 / 23)`을 0~100으로 자릅니다.

use super::evaluators::{self, SectionScore};
use crate::models::EditableCourse;

pub const TOTAL_WEIGHT: u32 = 23;

/// 작성 단계 순서와 동일합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    BasicInfo,
    Overview,
    Outcomes,
    Modules,
    Materials,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::BasicInfo,
        Section::Overview,
        Section::Outcomes,
        Section::Modules,
        Section::Materials,
    ];

    pub fn weight(self) -> u32 {
        match self {
            Self::BasicInfo => 5,
            Self::Overview => 5,
            Self::Outcomes => 1,
            Self::Modules => 8,
            Self::Materials => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::BasicInfo => "basic",
            Self::Overview => "overview",
            Self::Outcomes => "outcomes",
            Self::Modules => "modules",
            Self::Materials => "materials",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionProgress {
    pub section: Section,
    pub score: SectionScore,
    pub points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Complete,
    /// 첫 번째 미완료 단계
    Current,
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub section: Section,
    pub state: StepState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    pub sections: Vec<SectionProgress>,
    pub points: u32,
    pub percent: u8,
}

impl CompletionReport {
    pub fn section(&self, section: Section) -> Option<&SectionProgress> {
        self.sections.iter().find(|s| s.section == section)
    }

    pub fn is_complete(&self) -> bool {
        self.sections.iter().all(|s| s.score.is_complete())
    }

    /// 단계 표시줄. 모든 섹션이 완료면 Current가 없습니다.
    pub fn steps(&self) -> Vec<Step> {
        let mut current_assigned = false;
        self.sections
            .iter()
            .map(|s| {
                let state = if s.score.is_complete() {
                    StepState::Complete
                } else if !current_assigned {
                    current_assigned = true;
                    StepState::Current
                } else {
                    StepState::Incomplete
                };
                Step {
                    section: s.section,
                    state,
                }
            })
            .collect()
    }
}

pub fn section_points(score: &SectionScore, weight: u32) -> u32 {
    (score.ratio.clamp(0.0, 1.0) * weight as f64).round() as u32
}

pub fn overall_percent(points: u32) -> u8 {
    let percent = (100.0 * points as f64 / TOTAL_WEIGHT as f64).round();
    percent.clamp(0.0, 100.0) as u8
}

/// 편집 버퍼 전체를 평가합니다.
pub fn evaluate(course: &EditableCourse, min_outcomes: usize) -> CompletionReport {
    let sections: Vec<SectionProgress> = Section::ALL
        .iter()
        .map(|&section| {
            let score = match section {
                Section::BasicInfo => evaluators::basic_info(&course.basic_info),
                Section::Overview => evaluators::overview(&course.overview),
                Section::Outcomes => evaluators::outcomes(course, min_outcomes),
                Section::Modules => evaluators::modules(course),
                Section::Materials => evaluators::materials(course),
            };
            SectionProgress {
                section,
                score,
                points: section_points(&score, section.weight()),
            }
        })
        .collect();

    let points: u32 = sections.iter().map(|s| s.points).sum();
    let percent = overall_percent(points);
    tracing::debug!(points, percent, "evaluated course completion");

    CompletionReport {
        sections,
        points,
        percent,
    }
}
