//! # 섹션별 완료도 평가
//!
//! 다섯 섹션 각각을 `SectionScore { completed, total, ratio }`로 평가합니다.
//! 모든 평가 함수는 부수 효과가 없는 순수 함수입니다.

use crate::models::{BasicInfo, EditableCourse, Overview};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionScore {
    pub completed: usize,
    pub total: usize,
    /// 0.0 ~ 1.0. total이 0이면 0.0 (0으로 나누지 않음)
    pub ratio: f64,
}

impl SectionScore {
    pub fn of(completed: usize, total: usize) -> Self {
        let ratio = if total == 0 {
            0.0
        } else {
            (completed.min(total) as f64) / (total as f64)
        };
        Self {
            completed,
            total,
            ratio,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.ratio >= 1.0
    }
}

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

fn selected(value: &Option<String>) -> bool {
    value.as_deref().map(filled).unwrap_or(false)
}

/// 기본 정보: 제목, 카테고리, 연령대, 가격 > 0, 썸네일
pub fn basic_info(info: &BasicInfo) -> SectionScore {
    let checks = [
        filled(&info.title),
        selected(&info.category),
        selected(&info.age_group),
        info.price > 0.0,
        info.thumbnail.as_ref().map(|t| t.is_present()).unwrap_or(false),
    ];
    SectionScore::of(checks.iter().filter(|c| **c).count(), checks.len())
}

/// 개요: 설명, 기간 > 0, 난이도, 선수 지식, 대상 수강생
pub fn overview(overview: &Overview) -> SectionScore {
    let checks = [
        filled(&overview.description),
        overview.duration > 0,
        selected(&overview.level),
        filled(&overview.prerequisites),
        filled(&overview.target_audience),
    ];
    SectionScore::of(checks.iter().filter(|c| **c).count(), checks.len())
}

/// 학습 목표: 비어 있지 않은 항목이 최소 개수 이상이면 완료 (0 또는 1)
pub fn outcomes(course: &EditableCourse, min_outcomes: usize) -> SectionScore {
    let valid = course.outcomes.iter().filter(|o| !o.is_blank()).count();
    SectionScore {
        completed: valid,
        total: min_outcomes,
        ratio: if valid >= min_outcomes { 1.0 } else { 0.0 },
    }
}

/// 모듈: 완성된 모듈 수 / 전체 모듈 수
pub fn modules(course: &EditableCourse) -> SectionScore {
    let complete = course.modules.iter().filter(|m| m.is_complete()).count();
    SectionScore::of(complete, course.modules.len())
}

/// 자료: 확정 자료가 하나 이상 있는 모듈 수 / 전체 모듈 수
pub fn materials(course: &EditableCourse) -> SectionScore {
    let with_materials = course
        .modules
        .iter()
        .filter(|m| m.has_committed_materials())
        .count();
    SectionScore::of(with_materials, course.modules.len())
}
