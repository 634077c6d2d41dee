//! 스키마 필드 정의
//!
//! 필드는 세 종류입니다.
//!
//! - `physical`: 스트림에 실제로 저장되는 컬럼 (`name`, `type`)
//! - `metadata`: 커넥터 메타데이터에서 읽는 컬럼 (`name`, `key`, `type`)
//! - `computed`: 식으로 계산되는 컬럼 (`name`, `expression`)
//!
//! 원격 서비스와는 순서가 고정된 매핑으로 주고받습니다.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::types::TypeNode;

/// 필드 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Physical,
    Metadata,
    Computed,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Physical => "physical",
            FieldKind::Metadata => "metadata",
            FieldKind::Computed => "computed",
        }
    }
}

impl FromStr for FieldKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "physical" => Ok(FieldKind::Physical),
            "metadata" => Ok(FieldKind::Metadata),
            "computed" => Ok(FieldKind::Computed),
            other => Err(Error::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 스키마 필드
#[derive(Debug, Clone)]
pub enum SchemaField {
    Physical {
        name: String,
        field_type: TypeNode,
    },
    Metadata {
        name: String,
        key: String,
        field_type: TypeNode,
    },
    Computed {
        name: String,
        expression: String,
    },
}

impl SchemaField {
    /// Physical 필드 (타입 문자열 파싱)
    pub fn physical(name: impl Into<String>, type_text: &str) -> Result<Self> {
        let name = name.into();
        let field_type = TypeNode::parse_for_field(&name, type_text)?;
        Ok(SchemaField::Physical { name, field_type })
    }

    /// Metadata 필드 (타입 문자열 파싱)
    pub fn metadata(
        name: impl Into<String>,
        key: impl Into<String>,
        type_text: &str,
    ) -> Result<Self> {
        let name = name.into();
        let field_type = TypeNode::parse_for_field(&name, type_text)?;
        Ok(SchemaField::Metadata {
            name,
            key: key.into(),
            field_type,
        })
    }

    pub fn computed(name: impl Into<String>, expression: impl Into<String>) -> Self {
        SchemaField::Computed {
            name: name.into(),
            expression: expression.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SchemaField::Physical { name, .. }
            | SchemaField::Metadata { name, .. }
            | SchemaField::Computed { name, .. } => name,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            SchemaField::Physical { .. } => FieldKind::Physical,
            SchemaField::Metadata { .. } => FieldKind::Metadata,
            SchemaField::Computed { .. } => FieldKind::Computed,
        }
    }

    /// 타입 (computed 필드는 없음)
    pub fn field_type(&self) -> Option<&TypeNode> {
        match self {
            SchemaField::Physical { field_type, .. } | SchemaField::Metadata { field_type, .. } => {
                Some(field_type)
            }
            SchemaField::Computed { .. } => None,
        }
    }

    /// 타입을 변환한 새 필드 (computed 필드는 그대로)
    pub fn map_type(self, f: impl FnOnce(TypeNode) -> TypeNode) -> Self {
        match self {
            SchemaField::Physical { name, field_type } => SchemaField::Physical {
                name,
                field_type: f(field_type),
            },
            SchemaField::Metadata {
                name,
                key,
                field_type,
            } => SchemaField::Metadata {
                name,
                key,
                field_type: f(field_type),
            },
            computed @ SchemaField::Computed { .. } => computed,
        }
    }

    /// 직렬화 매핑
    ///
    /// 키 순서: `name`, `kind`, 이후 종류별 키 (`key`, `type` / `expression`)
    pub fn to_mapping(&self) -> Map<String, Value> {
        self.mapping_with(|t| t.to_string())
    }

    /// 타입을 정규화 키로 치환한 매핑 (동등성/해시 기준)
    pub fn canonical_mapping(&self) -> Map<String, Value> {
        self.mapping_with(TypeNode::canonical_key)
    }

    fn mapping_with(&self, render: impl Fn(&TypeNode) -> String) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("name".to_string(), Value::from(self.name()));
        m.insert("kind".to_string(), Value::from(self.kind().as_str()));
        match self {
            SchemaField::Physical { field_type, .. } => {
                m.insert("type".to_string(), Value::from(render(field_type)));
            }
            SchemaField::Metadata {
                key, field_type, ..
            } => {
                m.insert("key".to_string(), Value::from(key.as_str()));
                m.insert("type".to_string(), Value::from(render(field_type)));
            }
            SchemaField::Computed { expression, .. } => {
                m.insert("expression".to_string(), Value::from(expression.as_str()));
            }
        }
        m
    }

    /// 매핑에서 필드 생성
    ///
    /// `kind`로 분기하며, 종류별 필수 키가 없으면 `MalformedSchema`입니다.
    pub fn from_mapping(m: &Map<String, Value>) -> Result<Self> {
        let kind: FieldKind = required_str(m, "kind", "field")?.parse()?;
        let name = required_str(m, "name", kind.as_str())?;

        match kind {
            FieldKind::Physical => SchemaField::physical(name, required_str(m, "type", name)?),
            FieldKind::Metadata => SchemaField::metadata(
                name,
                required_str(m, "key", name)?,
                required_str(m, "type", name)?,
            ),
            FieldKind::Computed => Ok(SchemaField::computed(
                name,
                required_str(m, "expression", name)?,
            )),
        }
    }
}

fn required_str<'a>(m: &'a Map<String, Value>, key: &str, context: &str) -> Result<&'a str> {
    match m.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(Error::malformed(format!(
            "'{}' of {} must be a string, got {}",
            key, context, other
        ))),
        None => Err(Error::malformed(format!("missing '{}' in {}", key, context))),
    }
}

impl PartialEq for SchemaField {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_mapping() == other.canonical_mapping()
    }
}

impl Eq for SchemaField {}

impl Hash for SchemaField {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (key, value) in self.canonical_mapping() {
            key.hash(state);
            value.as_str().unwrap_or_default().hash(state);
        }
    }
}

impl fmt::Display for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .to_mapping()
            .iter()
            .map(|(key, value)| format!("{}: '{}'", key, value.as_str().unwrap_or_default()))
            .collect();
        f.write_str(&parts.join(" | "))
    }
}
