//! 타입 동등성 및 해시
//!
//! 렌더링 결과가 같거나, 등록된 동의어 관계이면 같은 타입입니다.
//!
//! | 계열 | 동의어 |
//! |---|---|
//! | 고정 소수점 | `DECIMAL(p, s)` ≡ `DEC(p, s)` ≡ `NUMERIC(p, s)` |
//! | 문자열 | `VARCHAR(2147483647)` ≡ `STRING` |
//! | 바이너리 | `VARBINARY(2147483647)` ≡ `BYTES` |
//! | 부동 소수점 | `FLOAT` ≡ `DOUBLE` (파라미터와 무관) |
//!
//! 컨테이너 타입은 표기법과 무관하게 내부 타입을 재귀적으로 비교합니다
//! (`ARRAY<DECIMAL>` ≡ `DECIMAL ARRAY` ≡ `ARRAY<NUMERIC>`).
//!
//! 해시는 계열의 첫 번째 멤버(대표형)로 정규화한 문자열에서 계산하므로
//! 서로 같은 타입은 항상 같은 해시를 가집니다.

use std::hash::{Hash, Hasher};

use super::node::{TypeNode, MAX_LENGTH};

/// 동의어 목록
///
/// 같은 유효 파라미터를 가진, 다른 variant의 타입들입니다.
/// 컨테이너/래퍼 타입은 구조적으로 비교하므로 빈 목록입니다.
///
/// `TIMESTAMP(p) WITH TIME ZONE`과 `TIMESTAMP_LTZ(p)`는 의도적으로 동의어가 아닙니다.
/// 두 타입은 렌더링이 다르고 원격 스키마에서도 구분되므로 다른 타입으로 비교합니다.
pub fn synonyms_of(node: &TypeNode) -> Vec<TypeNode> {
    match node {
        TypeNode::Varchar { length: MAX_LENGTH } => vec![TypeNode::String],
        TypeNode::String => vec![TypeNode::Varchar { length: MAX_LENGTH }],

        TypeNode::Varbinary { length: MAX_LENGTH } => vec![TypeNode::Bytes],
        TypeNode::Bytes => vec![TypeNode::Varbinary { length: MAX_LENGTH }],

        &TypeNode::Decimal { precision, scale } => vec![
            TypeNode::Dec { precision, scale },
            TypeNode::Numeric { precision, scale },
        ],
        &TypeNode::Dec { precision, scale } => vec![
            TypeNode::Decimal { precision, scale },
            TypeNode::Numeric { precision, scale },
        ],
        &TypeNode::Numeric { precision, scale } => vec![
            TypeNode::Dec { precision, scale },
            TypeNode::Decimal { precision, scale },
        ],

        TypeNode::Float => vec![TypeNode::Double],
        TypeNode::Double => vec![TypeNode::Float],

        _ => Vec::new(),
    }
}

/// 계열 대표형 (단일 타입)
///
/// 계열 우선순위상 첫 번째 멤버입니다.
fn representative(node: &TypeNode) -> TypeNode {
    match node {
        TypeNode::String => TypeNode::Varchar { length: MAX_LENGTH },
        TypeNode::Bytes => TypeNode::Varbinary { length: MAX_LENGTH },
        &TypeNode::Dec { precision, scale } | &TypeNode::Numeric { precision, scale } => {
            TypeNode::Decimal { precision, scale }
        }
        TypeNode::Double => TypeNode::Float,
        other => other.clone(),
    }
}

/// 정규화 키
///
/// 동의어는 대표형으로, 배열은 `ARRAY<..>` 표기로 통일한 렌더링입니다.
/// 두 타입이 같으면 키도 같습니다.
pub fn canonical_key(node: &TypeNode) -> String {
    match node {
        TypeNode::NotNull(inner) => format!("{} NOT NULL", canonical_key(inner)),
        TypeNode::PrimaryKey(inner) => format!("{} PRIMARY KEY", canonical_key(inner)),
        TypeNode::Array { element, .. } => format!("ARRAY<{}>", canonical_key(element)),
        TypeNode::Map { key, value } => {
            format!("MAP<{}, {}>", canonical_key(key), canonical_key(value))
        }
        leaf => representative(leaf).to_string(),
    }
}

/// 대표형으로 정규화한 타입
pub fn canonicalize(node: &TypeNode) -> TypeNode {
    match node {
        TypeNode::NotNull(inner) => TypeNode::not_null(canonicalize(inner)),
        TypeNode::PrimaryKey(inner) => TypeNode::primary_key(canonicalize(inner)),
        TypeNode::Array { element, .. } => TypeNode::array(canonicalize(element)),
        TypeNode::Map { key, value } => TypeNode::map(canonicalize(key), canonicalize(value)),
        leaf => representative(leaf),
    }
}

fn is_synonym(node: &TypeNode, rendered_other: &str) -> bool {
    synonyms_of(node)
        .iter()
        .any(|synonym| synonym.to_string() == rendered_other)
}

impl PartialEq for TypeNode {
    fn eq(&self, other: &Self) -> bool {
        let rendered_self = self.to_string();
        let rendered_other = other.to_string();
        if rendered_self == rendered_other {
            return true;
        }

        match (self, other) {
            (TypeNode::NotNull(a), TypeNode::NotNull(b)) => a == b,
            (TypeNode::PrimaryKey(a), TypeNode::PrimaryKey(b)) => a == b,
            (TypeNode::Array { .. }, TypeNode::Array { .. })
            | (TypeNode::Map { .. }, TypeNode::Map { .. }) => self
                .internal_types()
                .iter()
                .zip(other.internal_types())
                .all(|(a, b)| *a == b),
            _ => is_synonym(self, &rendered_other) || is_synonym(other, &rendered_self),
        }
    }
}

impl Eq for TypeNode {}

impl Hash for TypeNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        canonical_key(self).hash(state);
    }
}
