//! # 설정(Configuration) 모듈
//!
//! 환경변수에서 카탈로그 클라이언트와 저작 엔진의 설정값을 읽어옵니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `CATALOG_BASE_URL`: 원격 카탈로그 서비스 주소 (필수, 예: "https://api.example.com/api/v1")
//! - `CATALOG_TIMEOUT_SECS`: 요청 타임아웃(초), 기본값 30
//! - `MIN_OUTCOMES`: 학습 목표 섹션을 완료로 보기 위한 최소 개수, 기본값 3
//! - `UPLOAD_CHUNK_BYTES`: 업로드 진행률을 보고하는 청크 크기, 기본값 64KiB

use std::env;

/// 학습 목표 최소 개수 기본값
pub const DEFAULT_MIN_OUTCOMES: usize = 3;
/// 업로드 청크 크기 기본값
pub const DEFAULT_UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// 전체 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 카탈로그 서비스 기본 주소 (끝의 `/`는 제거해서 보관)
    pub catalog_base_url: String,
    /// HTTP 요청 타임아웃(초)
    pub timeout_secs: u64,
    /// 저작 엔진 설정
    pub authoring: AuthoringSettings,
}

/// 편집 세션이 사용하는 설정 (원격 연결 정보와 무관한 부분)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthoringSettings {
    pub min_outcomes: usize,
    pub upload_chunk_bytes: usize,
}

impl Default for AuthoringSettings {
    fn default() -> Self {
        Self {
            min_outcomes: DEFAULT_MIN_OUTCOMES,
            upload_chunk_bytes: DEFAULT_UPLOAD_CHUNK_BYTES,
        }
    }
}

impl Config {
    /// `.env`를 먼저 읽은 뒤 환경변수에서 설정을 만듭니다.
    /// `.env` 파일이 없어도 에러 없이 넘어갑니다.
    pub fn load() -> Result<Self, env::VarError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `CATALOG_BASE_URL`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지는 기본값이 있고, 숫자로 파싱할 수 없으면 기본값을 사용합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        let catalog_base_url = env::var("CATALOG_BASE_URL")?
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            catalog_base_url,
            timeout_secs: parse_or("CATALOG_TIMEOUT_SECS", 30),
            authoring: AuthoringSettings {
                min_outcomes: parse_or("MIN_OUTCOMES", DEFAULT_MIN_OUTCOMES),
                upload_chunk_bytes: parse_or("UPLOAD_CHUNK_BYTES", DEFAULT_UPLOAD_CHUNK_BYTES)
                    .max(1),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
