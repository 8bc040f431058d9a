//! # 코스 저작 엔진 (course-authoring)
//!
//! 온라인 학습 플랫폼의 관리자가 코스를 만드는 편집 세션의 핵심 로직입니다.
//!
//! 이 크레이트가 하는 일:
//! 1. 다섯 섹션의 완료도를 가중 합산해 전체 완료율을 계속 계산
//! 2. 저장하지 않은 편집을 마지막 확정 상태로 되돌리기 (임시 파일 핸들 회수 포함)
//! 3. 강의 자료의 2단계 수명 관리 (임시 → 모듈 저장 시 확정)
//! 4. 일부 실패를 허용하는 다단계 저장 (코스 저장 → 학습 목표 맞추기)
//!
//! ## 모듈 구성
//! ```text
//! session ──▶ save, sync, snapshot, drafts, progress
//!    │
//!    └──▶ catalog (CatalogApi 트레이트 + reqwest 구현)
//! ```

// ── 모듈 선언 ──
pub mod catalog;
pub mod config;
pub mod drafts;
pub mod error;
pub mod logging;
pub mod models;
pub mod progress;
pub mod save;
pub mod session;
pub mod snapshot;
pub mod sync;

// ── 자주 쓰는 항목 재공개 ──
pub use catalog::{CatalogApi, HttpCatalog, ProgressSender, UploadProgress};
pub use config::{AuthoringSettings, Config};
pub use drafts::{DraftHandle, HandleRegistry, PickOutcome};
pub use error::{AuthoringError, PartialBatchFailure, RemoteCallError, ValidationError};
pub use progress::{CompletionReport, Section, StepState};
pub use save::SaveReport;
pub use session::{AuthoringSession, ModuleSaveReport};
pub use snapshot::CheckpointManager;
pub use sync::LoadReport;
