//! 모델 파일 로딩
//!
//! ```yaml
//! name: orders_enriched
//! sql: |
//!   SELECT id, amount FROM orders WHERE status != 'void'
//! watermark: "ts - INTERVAL '5' SECOND"
//! primary_key: [id]
//! columns:
//!   - name: id
//!     data_type: BIGINT
//! ```

use std::path::Path;

use anyhow::Context as _;
use dct_client::StreamModel;
use dct_core::pipeline::replace_disallowed_operations;

/// 모델 파일 파싱
///
/// `relation`이 있으면 모델 이름 대신 사용합니다.
pub fn parse_model(yaml: &str, relation: Option<&str>) -> anyhow::Result<StreamModel> {
    let mut model: StreamModel = serde_yaml::from_str(yaml).context("invalid model file")?;

    if let Some(relation) = relation {
        model.name = relation.to_string();
    }
    if model.name.trim().is_empty() {
        anyhow::bail!("model name is empty");
    }

    let sql = model.sql.trim().trim_end_matches(';').trim_end();
    model.sql = replace_disallowed_operations(sql);
    Ok(model)
}

pub fn load_model(path: &Path, relation: Option<&str>) -> anyhow::Result<StreamModel> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read model file {}", path.display()))?;
    parse_model(&content, relation).with_context(|| format!("in {}", path.display()))
}
