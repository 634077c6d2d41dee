//! Repo Context 관리
//!
//! `.dct/context.json` 파일을 통해 repo-local 컨텍스트를 관리합니다.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use dct_client::{ClientOptions, SchemaVersion};
use serde::{Deserialize, Serialize};

/// Repo Context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<SchemaVersion>,
}

/// Effective Context (최종 결정된 컨텍스트)
#[derive(Debug, Clone, Default)]
pub struct EffectiveContext {
    pub account: Option<String>,
    pub profile: Option<String>,
    pub api_url: Option<String>,
    pub schema_version: Option<SchemaVersion>,
}

impl EffectiveContext {
    /// 명령별 스키마 버전 override
    pub fn with_schema_version(mut self, version: Option<SchemaVersion>) -> Self {
        if version.is_some() {
            self.schema_version = version;
        }
        self
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            account_name: self.account.clone(),
            profile: self.profile.clone(),
            api_url: self.api_url.clone(),
            schema_version: self.schema_version,
            ..Default::default()
        }
    }
}

impl RepoContext {
    /// 컨텍스트 파일 경로
    pub fn context_path() -> PathBuf {
        PathBuf::from(".dct/context.json")
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::context_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let ctx = serde_json::from_str(&content)
            .with_context(|| format!("invalid context file {}", path.display()))?;
        Ok(ctx)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::context_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn clear() -> anyhow::Result<()> {
        let path = Self::context_path();
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// CLI 옵션 우선으로 병합
    pub fn resolve(
        self,
        account: Option<&str>,
        profile: Option<&str>,
        api_url: Option<&str>,
    ) -> EffectiveContext {
        EffectiveContext {
            account: account.map(str::to_string).or(self.account),
            profile: profile.map(str::to_string).or(self.profile),
            api_url: api_url.map(str::to_string).or(self.api_url),
            schema_version: self.schema_version,
        }
    }
}

/// 컨텍스트 결정 (CLI 옵션 > repo context)
pub fn resolve_context(
    account: Option<&str>,
    profile: Option<&str>,
    api_url: Option<&str>,
) -> EffectiveContext {
    RepoContext::load()
        .unwrap_or_default()
        .resolve(account, profile, api_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".dct").join("context.json");

        let ctx = RepoContext {
            account: Some("acme".to_string()),
            schema_version: Some(SchemaVersion::V2),
            ..Default::default()
        };
        ctx.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"schema_version\": \"v2\""));
        assert!(!content.contains("profile"));

        assert_eq!(RepoContext::load_from(&path).unwrap(), ctx);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RepoContext::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(ctx, RepoContext::default());
    }

    #[test]
    fn test_cli_options_override() {
        let ctx = RepoContext {
            account: Some("acme".to_string()),
            profile: Some("staging".to_string()),
            api_url: None,
            schema_version: Some(SchemaVersion::V1),
        };

        let effective = ctx.resolve(Some("other"), None, Some("api.example.test"));
        assert_eq!(effective.account.as_deref(), Some("other"));
        assert_eq!(effective.profile.as_deref(), Some("staging"));
        assert_eq!(effective.api_url.as_deref(), Some("api.example.test"));

        let effective = effective.with_schema_version(Some(SchemaVersion::V2));
        let options = effective.client_options();
        assert_eq!(options.schema_version, Some(SchemaVersion::V2));
        assert_eq!(options.account_name.as_deref(), Some("other"));
    }
}
