//! # 임시 자료(Draft) 모듈
//!
//! - `registry`: 임시 파일 핸들 발급/회수
//! - `pipeline`: 모듈 단위의 파일 선택, 이름 변경, 삭제, 업로드 확정 처리

pub mod pipeline;
pub mod registry;

pub use pipeline::*;
pub use registry::{DraftHandle, HandleMark, HandleRegistry};
