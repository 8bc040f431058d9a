//! # 강의 자료(Material) 모델
//!
//! 모듈에 붙는 자료는 두 단계를 거칩니다:
//! 1. **임시 자료(DraftMaterial)**: 사용자가 고른 파일. 아직 업로드 전이며
//!    `DraftHandle`을 통해 메모리의 파일 내용과 미리보기 주소를 참조합니다.
//! 2. **확정 자료(CommittedMaterial)**: 서버가 업로드를 확인한 자료.
//!    서버 ID와 원격 주소(locator)를 가집니다.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::drafts::DraftHandle;

/// 자료 분류. 사용자가 파일을 고르기 전에 선택합니다.
/// 분류에 따라 허용되는 확장자가 달라집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialCategory {
    /// 강의 영상
    #[default]
    Video,
    /// PDF, 슬라이드 등 문서
    Document,
}

impl MaterialCategory {
    pub const VIDEO_EXTENSIONS: &'static [&'static str] = &["mp4", "mov", "webm", "mkv", "avi", "m4v"];
    pub const DOCUMENT_EXTENSIONS: &'static [&'static str] = &["pdf", "doc", "docx", "ppt", "pptx", "txt"];

    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            Self::Video => Self::VIDEO_EXTENSIONS,
            Self::Document => Self::DOCUMENT_EXTENSIONS,
        }
    }

    /// 파일 이름의 확장자가 이 분류에서 허용되는지 확인합니다 (대소문자 무시).
    pub fn allows(self, file_name: &str) -> bool {
        extension_of(file_name)
            .map(|ext| self.allowed_extensions().contains(&ext.as_str()))
            .unwrap_or(false)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Document => "document",
        }
    }

    /// 서버가 보내는 분류 문자열을 해석합니다.
    /// 서버마다 "lecture", "pdf" 같은 표기를 섞어 쓰므로 넓게 받아들입니다.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "video" | "lecture" | "videos" => Self::Video,
            _ => Self::Document,
        }
    }

    /// MIME 타입으로 분류를 추정합니다.
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("video/") {
            Self::Video
        } else {
            Self::Document
        }
    }
}

impl fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 소문자로 정규화한 확장자. 확장자가 없으면 None.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn guess_mime(file_name: &str) -> &'static str {
    match extension_of(file_name).as_deref() {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("m4v") => "video/x-m4v",
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("ppt") => "application/vnd.ms-powerpoint",
        Some("pptx") => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// 사용자가 고른 파일. 업로드 전까지 내용 전체를 메모리에 둡니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PickedFile {
    /// MIME 타입은 확장자로 추정합니다.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = guess_mime(&name).to_string();
        Self {
            name,
            mime_type,
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// 같은 내용에 이름만 바꾼 새 파일
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: self.mime_type.clone(),
            bytes: self.bytes.clone(),
        }
    }
}

/// 서버가 발급한 자료 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialId(pub String);

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 서버가 확인한 자료
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedMaterial {
    pub id: MaterialId,
    pub display_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub category: MaterialCategory,
    pub created_at: DateTime<Utc>,
    /// 원격 주소 (스트리밍/다운로드 URL)
    pub locator: String,
}

/// 업로드 전의 임시 자료. 핸들 하나를 단독으로 소유합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftMaterial {
    pub handle: DraftHandle,
    pub display_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub category: MaterialCategory,
}

/// 삭제/이름 변경 대상 자료를 가리키는 키
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialKey {
    Committed(MaterialId),
    Draft(DraftHandle),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_filter_is_case_insensitive() {
        assert!(MaterialCategory::Video.allows("Intro.MP4"));
        assert!(MaterialCategory::Document.allows("notes.PdF"));
        assert!(!MaterialCategory::Video.allows("notes.pdf"));
        assert!(!MaterialCategory::Document.allows("README"));
    }

    #[test]
    fn mime_is_guessed_from_name() {
        assert_eq!(PickedFile::new("a.mov", vec![1]).mime_type, "video/quicktime");
        assert_eq!(PickedFile::new("a.bin", vec![1]).mime_type, "application/octet-stream");
    }
}
