//! 시드(CSV) 컬럼 타입 추론

use serde::{Deserialize, Serialize};

use super::node::TypeNode;

/// 시드 컬럼의 값 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedColumn {
    Text,
    Number,
    Boolean,
    DateTime,
    Date,
    Time,
}

impl SeedColumn {
    /// 값 종류에 대응하는 기본 타입
    pub fn inferred_type(self) -> TypeNode {
        match self {
            SeedColumn::Text => TypeNode::String,
            SeedColumn::Number => TypeNode::decimal(),
            SeedColumn::Boolean => TypeNode::Boolean,
            SeedColumn::DateTime => TypeNode::TimestampLtz { precision: 3 },
            SeedColumn::Date => TypeNode::Date,
            SeedColumn::Time => TypeNode::Time { precision: 3 },
        }
    }
}

/// 시드 컬럼 타입 결정 결과
#[derive(Debug, Clone)]
pub struct SeedColumnType {
    pub field_type: TypeNode,

    /// 인식하지 못해 무시된 override 문자열
    pub rejected_override: Option<String>,
}

/// override가 있으면 우선 적용하고, 인식할 수 없으면 추론된 타입을 유지합니다.
pub fn seed_column_type(column: SeedColumn, column_override: Option<&str>) -> SeedColumnType {
    let inferred = column.inferred_type();
    match column_override.filter(|text| !text.is_empty()) {
        None => SeedColumnType {
            field_type: inferred,
            rejected_override: None,
        },
        Some(text) => match TypeNode::parse(text) {
            Some(field_type) => SeedColumnType {
                field_type,
                rejected_override: None,
            },
            None => SeedColumnType {
                field_type: inferred,
                rejected_override: Some(text.to_string()),
            },
        },
    }
}
