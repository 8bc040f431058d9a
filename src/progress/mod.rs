//! # 진행률 모듈
//!
//! - `evaluators`: 섹션별 완료도
//! - `calculator`: 가중치 합산과 단계 표시

pub mod calculator;
pub mod evaluators;

pub use calculator::{evaluate, CompletionReport, Section, SectionProgress, Step, StepState, TOTAL_WEIGHT};
pub use evaluators::SectionScore;
