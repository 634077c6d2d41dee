//! 스트림 스키마
//!
//! 필드, 워터마크, 제약 조건의 묶음입니다. 원격 스트림과 로컬 모델에서
//! 계산한 스키마를 비교할 때 사용합니다.
//!
//! 동등성은 직렬화 결과(정규화 타입)를 기준으로 하며, 필드와 워터마크의
//! 순서가 다르면 다른 스키마입니다.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::field::SchemaField;
use crate::error::Result;

/// 워터마크 정의
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Watermark {
    pub name: String,
    pub expression: String,
}

/// 제약 조건
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub primary_key: Vec<String>,
}

/// 스트림 스키마
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub fields: Vec<SchemaField>,
    pub watermarks: Vec<Watermark>,
    pub constraints: Constraints,
}

impl Schema {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// 이미 분리된 구성 요소로부터 생성
    pub fn from_json_components(
        fields: &[Value],
        watermarks: &[Value],
        primary_key: Vec<String>,
    ) -> Result<Self> {
        let fields = fields
            .iter()
            .map(super::parser::field_from_value)
            .collect::<Result<Vec<_>>>()?;
        let watermarks = watermarks
            .iter()
            .map(super::parser::watermark_from_value)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            fields,
            watermarks,
            constraints: Constraints { primary_key },
        })
    }

    /// 이름으로 필드 조회
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// 모든 필드 타입에서 `PRIMARY KEY` 표시 제거
    pub fn without_primary_key_markers(self) -> Self {
        Self {
            fields: self
                .fields
                .into_iter()
                .map(|f| f.map_type(|t| t.without_primary_key()))
                .collect(),
            ..self
        }
    }

    /// 직렬화
    ///
    /// `{fields: [...], watermarks: [...], constraints: {primary_key: [...]}}`
    pub fn to_dict(&self) -> Value {
        json!({
            "fields": self.fields.iter().map(SchemaField::to_mapping).collect::<Vec<_>>(),
            "watermarks": self.watermarks,
            "constraints": self.constraints,
        })
    }

    /// 동등성/해시 기준 문자열
    pub fn canonical_string(&self) -> String {
        let canonical = json!({
            "fields": self.fields.iter().map(SchemaField::canonical_mapping).collect::<Vec<_>>(),
            "watermarks": self.watermarks,
            "constraints": self.constraints,
        });
        canonical.to_string()
    }

    /// 경고 메시지용 필드 목록 (이름 순, 탭 들여쓰기)
    pub fn pretty(&self, indent: usize, name: Option<&str>) -> String {
        pretty_fields(&self.fields, indent, name)
    }
}

/// 필드 목록을 사람이 읽기 쉬운 형태로 출력
///
/// ```text
/// <indent>name = {
/// <indent+1>a: INT,
/// <indent>}
/// ```
pub fn pretty_fields(fields: &[SchemaField], indent: usize, name: Option<&str>) -> String {
    let mut sorted: Vec<&SchemaField> = fields.iter().collect();
    sorted.sort_by(|a, b| a.name().cmp(b.name()));

    let inner = "\t".repeat(indent + 1);
    let body: String = sorted
        .iter()
        .map(|f| {
            let rendered = match f {
                SchemaField::Computed { expression, .. } => format!("AS {}", expression),
                _ => f.field_type().map(|t| t.to_string()).unwrap_or_default(),
            };
            format!("{}{}: {},\n", inner, f.name(), rendered)
        })
        .collect();

    let outer = "\t".repeat(indent);
    let prefix = match name {
        Some(name) => format!("{}{} = {{", outer, name),
        None => format!("{}{{", outer),
    };
    let suffix = if body.is_empty() {
        "}".to_string()
    } else {
        format!("{}}}", outer)
    };

    format!("{}\n{}{}", prefix, body, suffix)
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_string() == other.canonical_string()
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_string().hash(state);
    }
}
