//! # 로깅(tracing) 초기화
//!
//! 라이브러리 코드는 `tracing` 매크로로만 로그를 남기고,
//! 출력 구현체(subscriber) 설치는 이 함수를 호출하는 쪽이 결정합니다.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 전역 로거를 설치합니다.
///
/// `RUST_LOG` 환경변수가 없으면 이 크레이트를 debug 레벨로 출력합니다.
/// 이미 로거가 설치되어 있으면 아무 일도 하지 않고 `false`를 반환하므로
/// 여러 테스트에서 반복 호출해도 안전합니다.
pub fn init() -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "course_authoring=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
