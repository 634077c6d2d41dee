//! 스키마 JSON 파서
//!
//! 원격 서비스가 반환하는 스키마 문서를 `Schema`로 변환합니다.
//! `fields`, `watermarks`, `constraints`는 없으면 빈 값으로 취급합니다.

use serde::Deserialize;
use serde_json::Value;

use super::field::SchemaField;
use super::ir::{Schema, Watermark};
use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Raw Types (JSON 역직렬화용)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(default)]
    fields: Vec<Value>,

    #[serde(default)]
    watermarks: Vec<Value>,

    #[serde(default)]
    constraints: Option<RawConstraints>,
}

#[derive(Debug, Deserialize)]
struct RawConstraints {
    #[serde(default)]
    primary_key: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawWatermark {
    name: String,
    expression: String,
}

impl Schema {
    /// 스키마 문서 파싱
    pub fn from_json(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::malformed(format!(
                "schema must be an object, got {}",
                value
            )));
        }

        let raw: RawSchema = serde_json::from_value(value.clone())
            .map_err(|e| Error::malformed(e.to_string()))?;
        let primary_key = raw.constraints.map(|c| c.primary_key).unwrap_or_default();

        Schema::from_json_components(&raw.fields, &raw.watermarks, primary_key)
    }

    /// JSON 문자열 파싱
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }
}

pub(super) fn field_from_value(value: &Value) -> Result<SchemaField> {
    match value.as_object() {
        Some(m) => SchemaField::from_mapping(m),
        None => Err(Error::malformed(format!(
            "field must be an object, got {}",
            value
        ))),
    }
}

pub(super) fn watermark_from_value(value: &Value) -> Result<Watermark> {
    let raw: RawWatermark = serde_json::from_value(value.clone())
        .map_err(|e| Error::malformed(format!("invalid watermark: {}", e)))?;
    Ok(Watermark {
        name: raw.name,
        expression: raw.expression,
    })
}
