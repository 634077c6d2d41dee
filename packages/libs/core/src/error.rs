//! 공통 에러 타입
//!
//! 타입 파싱, 스키마 변환, 변경 감지에서 발생하는 에러를 정의합니다.
//! 모든 에러는 결정적이므로 재시도하지 않습니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// dct 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Type Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("Type '{type_text}' not recognized{}", field_suffix(.field))]
    UnrecognizedType {
        field: Option<String>,
        type_text: String,
    },

    // ─────────────────────────────────────────────────────────────────────────────
    // Schema Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("unknown field kind: {kind}")]
    UnknownKind { kind: String },

    #[error("malformed schema: {message}")]
    MalformedSchema { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn field_suffix(field: &Option<String>) -> String {
    match field {
        Some(field) => format!(" (field '{}')", field),
        None => String::new(),
    }
}

impl Error {
    /// 타입 문자열 인식 실패
    pub fn unrecognized_type(type_text: impl Into<String>) -> Self {
        Error::UnrecognizedType {
            field: None,
            type_text: type_text.into(),
        }
    }

    /// 필드 이름이 포함된 타입 문자열 인식 실패
    pub fn unrecognized_field_type(field: impl Into<String>, type_text: impl Into<String>) -> Self {
        Error::UnrecognizedType {
            field: Some(field.into()),
            type_text: type_text.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedSchema {
            message: message.into(),
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnrecognizedType { .. } => "UNRECOGNIZED_TYPE",
            Error::UnknownKind { .. } => "UNKNOWN_FIELD_KIND",
            Error::MalformedSchema { .. } => "MALFORMED_SCHEMA",
            Error::Json(_) => "JSON_ERROR",
        }
    }
}
