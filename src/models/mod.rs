//! # 데이터 모델 모듈
//!
//! 편집 세션에서 사용하는 데이터 구조체들을 정의합니다.
//! - `course`: 편집 중인 코스(루트 집합체), 기본 정보, 개요, 학습 목표, 강사 명단
//! - `module`: 모듈 편집 상태와 모듈 ID
//! - `material`: 확정/임시 자료, 자료 분류, 사용자가 고른 파일
//! - `remote`: 원격 카탈로그 응답 봉투와 레코드
//!
//! `pub use X::*;`로 재공개하여 `crate::models::EditableCourse`처럼 짧게 접근합니다.

pub mod course;
pub mod material;
pub mod module;
pub mod remote;

pub use course::*;
pub use material::*;
pub use module::*;
pub use remote::*;
