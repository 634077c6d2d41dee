//! 클라이언트 설정
//!
//! # 프로필 파일
//!
//! `~/.dct/auth` (YAML):
//!
//! ```yaml
//! tokens:
//!   default:
//!     access_token: "..."
//!   staging:
//!     access_token: "..."
//! ```
//!
//! 프로필 이름은 명시값 > `DCT_PROFILE` 환경 변수 > `default` 순으로 결정합니다.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, Result};

/// 프로필 이름 환경 변수
pub const PROFILE_ENV_VAR: &str = "DCT_PROFILE";

pub const DEFAULT_PROFILE: &str = "default";

pub const DEFAULT_API_URL: &str = "api.decodable.co/v1alpha2";

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

// ─────────────────────────────────────────────────────────────────────────────
// Profiles
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawProfileFile {
    #[serde(default)]
    tokens: BTreeMap<String, RawProfile>,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    access_token: String,
}

/// 프로필별 액세스 토큰 저장소
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    tokens: BTreeMap<String, String>,
}

impl ProfileStore {
    /// 기본 경로 (`~/.dct/auth`)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| ApiError::profile("Cannot find home directory"))?;
        Ok(home.join(".dct").join("auth"))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: RawProfileFile = serde_yaml::from_str(yaml)?;
        Ok(Self {
            tokens: raw
                .tokens
                .into_iter()
                .map(|(name, profile)| (name, profile.access_token))
                .collect(),
        })
    }

    /// 파일에서 로드
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ApiError::profile(format!(
                "No profile file under path: {}. Log in first",
                path.display()
            )));
        }
        debug!(path = %path.display(), "loading profiles");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    /// 프로필 토큰 조회
    pub fn token(&self, profile: &str) -> Result<&str> {
        self.tokens
            .get(profile)
            .map(String::as_str)
            .ok_or_else(|| ApiError::profile(format!("Undefined profile '{}' in profile file", profile)))
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }
}

/// 프로필 이름 결정 (명시값 > 환경 변수 > 기본값)
pub fn resolve_profile_name(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(PROFILE_ENV_VAR).ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Client Config
// ─────────────────────────────────────────────────────────────────────────────

/// 변경 감지 방식을 결정하는 스키마 버전
///
/// - `v1`: 스트림/파이프라인을 직접 조회하여 비교
/// - `v2`: dry-run apply 결과로 판단
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    #[default]
    V1,
    V2,
}

impl SchemaVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V1 => "v1",
            SchemaVersion::V2 => "v2",
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "v1" => Ok(SchemaVersion::V1),
            "v2" => Ok(SchemaVersion::V2),
            other => Err(ApiError::profile(format!(
                "Unknown schema version '{}' (expected v1 or v2)",
                other
            ))),
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 미리보기 시작 위치
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartPosition {
    #[default]
    Earliest,
    Latest,
}

impl StartPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartPosition::Earliest => "earliest",
            StartPosition::Latest => "latest",
        }
    }
}

/// 클라이언트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub account_name: String,

    #[serde(skip_serializing)]
    pub access_token: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub schema_version: SchemaVersion,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub preview_start: StartPosition,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl ClientConfig {
    pub fn new(account_name: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            access_token: access_token.into(),
            api_url: default_api_url(),
            schema_version: SchemaVersion::default(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            preview_start: StartPosition::default(),
        }
    }

    /// 컨트롤 플레인 기본 URL (`https://{account}.{api_url}`)
    pub fn base_url(&self) -> String {
        format!("https://{}.{}", self.account_name, self.api_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Factory
// ─────────────────────────────────────────────────────────────────────────────

/// 클라이언트 생성 옵션
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub account_name: Option<String>,
    pub profile: Option<String>,
    pub api_url: Option<String>,
    pub schema_version: Option<SchemaVersion>,
    pub request_timeout_ms: Option<u64>,
    pub preview_start: Option<StartPosition>,
}

/// 프로필 저장소와 옵션으로 클라이언트 설정을 만듭니다.
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_config(profiles: &ProfileStore, options: ClientOptions) -> Result<ClientConfig> {
        let account_name = options
            .account_name
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::profile("Undefined account name. Use --account or 'dct context set'"))?;

        let profile = resolve_profile_name(options.profile.as_deref());
        let access_token = profiles.token(&profile)?.to_string();

        let mut config = ClientConfig::new(account_name, access_token);
        if let Some(api_url) = options.api_url {
            config.api_url = api_url;
        }
        if let Some(version) = options.schema_version {
            config.schema_version = version;
        }
        if let Some(timeout) = options.request_timeout_ms {
            config.request_timeout_ms = timeout;
        }
        if let Some(start) = options.preview_start {
            config.preview_start = start;
        }

        debug!(
            account = %config.account_name,
            profile = %profile,
            schema_version = %config.schema_version,
            "client config resolved"
        );
        Ok(config)
    }

    pub fn create_client(
        profiles: &ProfileStore,
        options: ClientOptions,
    ) -> Result<crate::api::ApiClient> {
        let config = Self::create_config(profiles, options)?;
        crate::api::ApiClient::new(config)
    }
}
