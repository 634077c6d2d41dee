//! 클라이언트 에러 타입

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// 원격 호출 및 설정 로딩 에러
#[derive(Debug, Error)]
pub enum ApiError {
    // ─────────────────────────────────────────────────────────────────────────────
    // API Errors (HTTP 상태 코드 기반)
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("InvalidRequest: {reason}")]
    InvalidRequest { reason: String },

    #[error("ResourceNotFound: {reason}")]
    ResourceNotFound { reason: String },

    #[error("ResourceAlreadyExists: {reason}")]
    ResourceAlreadyExists { reason: String },

    #[error("ApiError: {reason} (status {status})")]
    Api { status: u16, reason: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Transport / Decoding
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("HttpError: {0}")]
    Http(#[from] reqwest::Error),

    #[error("InvalidResponse: {0}")]
    InvalidResponse(String),

    // ─────────────────────────────────────────────────────────────────────────────
    // Local
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("SchemaError: {0}")]
    Core(#[from] dct_core::Error),

    #[error("ProfileError: {message}")]
    Profile { message: String },

    #[error("ProfileError: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),

    #[error("SeedError: {0}")]
    Csv(#[from] csv::Error),

    #[error("SeedError: {message}")]
    Seed { message: String },
}

impl ApiError {
    /// HTTP 상태 코드로 에러 분류
    pub fn from_status(status: u16, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match status {
            400 => ApiError::InvalidRequest { reason },
            404 => ApiError::ResourceNotFound { reason },
            409 => ApiError::ResourceAlreadyExists { reason },
            _ => ApiError::Api { status, reason },
        }
    }

    pub fn profile(message: impl Into<String>) -> Self {
        ApiError::Profile {
            message: message.into(),
        }
    }

    pub fn seed(message: impl Into<String>) -> Self {
        ApiError::Seed {
            message: message.into(),
        }
    }

    /// 에러 분류 이름
    pub fn category(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest { .. } => "InvalidRequest",
            ApiError::ResourceNotFound { .. } => "ResourceNotFound",
            ApiError::ResourceAlreadyExists { .. } => "ResourceAlreadyExists",
            ApiError::Api { .. } => "ApiError",
            ApiError::Http(_) => "HttpError",
            ApiError::InvalidResponse(_) => "InvalidResponse",
            ApiError::Core(_) => "SchemaError",
            ApiError::Profile { .. } | ApiError::Yaml(_) => "ProfileError",
            ApiError::Io(_) => "IoError",
            ApiError::Csv(_) | ApiError::Seed { .. } => "SeedError",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::ResourceNotFound { .. })
    }
}
