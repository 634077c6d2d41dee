//! 타입 노드 정의
//!
//! Flink SQL 타입 문자열 하나를 파싱한 결과입니다.
//! 렌더링 결과(`Display`)가 원격 서비스와 주고받는 유일한 타입 표현입니다.

use std::fmt;

/// `STRING`, `BYTES`의 고정 길이
pub const MAX_LENGTH: u32 = 2_147_483_647;

/// `DECIMAL`/`DEC`/`NUMERIC` 기본 정밀도
pub const DEFAULT_PRECISION: u32 = 10;

/// `DECIMAL`/`DEC`/`NUMERIC` 기본 스케일
pub const DEFAULT_SCALE: u32 = 0;

/// 파싱된 타입
///
/// 모든 variant는 생성 후 변경되지 않는 값 객체입니다.
/// 동등성 규칙은 `synonyms` 모듈을 참고하세요.
#[derive(Debug, Clone)]
pub enum TypeNode {
    /// `<inner> NOT NULL`
    NotNull(Box<TypeNode>),

    /// `CHAR(n)`
    Char { length: u32 },

    /// `VARCHAR(n)`
    Varchar { length: u32 },

    /// `STRING` (= `VARCHAR(2147483647)`)
    String,

    /// `BINARY(n)`
    Binary { length: u32 },

    /// `VARBINARY(n)`
    Varbinary { length: u32 },

    /// `BYTES` (= `VARBINARY(2147483647)`)
    Bytes,

    TinyInt,
    SmallInt,
    Int,
    BigInt,

    /// `DECIMAL(p, s)`
    Decimal { precision: u32, scale: u32 },

    /// `DEC(p, s)`
    Dec { precision: u32, scale: u32 },

    /// `NUMERIC(p, s)`
    Numeric { precision: u32, scale: u32 },

    Float,
    Double,

    Date,

    /// `TIME(p)`
    Time { precision: u32 },

    /// `TIMESTAMP(p) WITH[OUT] TIME ZONE`
    Timestamp { precision: u32, with_time_zone: bool },

    /// `TIMESTAMP_LTZ(p)`
    TimestampLtz { precision: u32 },

    /// `ARRAY<T>` 또는 `T ARRAY`
    Array {
        element: Box<TypeNode>,
        syntax: ArraySyntax,
    },

    /// `MAP<K, V>`
    Map {
        key: Box<TypeNode>,
        value: Box<TypeNode>,
    },

    /// `<inner> PRIMARY KEY`
    PrimaryKey(Box<TypeNode>),

    Boolean,
    Interval,
    Multiset,
}

/// 배열 타입 표기법
///
/// 의미는 같고 렌더링만 다릅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArraySyntax {
    /// `ARRAY<T>`
    Angle,

    /// `T ARRAY`
    Postfix,
}

/// 컨테이너 타입 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Array,
    Map,
}

impl TypeNode {
    pub fn not_null(inner: TypeNode) -> Self {
        TypeNode::NotNull(Box::new(inner))
    }

    pub fn primary_key(inner: TypeNode) -> Self {
        TypeNode::PrimaryKey(Box::new(inner))
    }

    /// 기본 정밀도/스케일의 `DECIMAL`
    pub fn decimal() -> Self {
        TypeNode::Decimal {
            precision: DEFAULT_PRECISION,
            scale: DEFAULT_SCALE,
        }
    }

    /// `ARRAY<T>`
    pub fn array(element: TypeNode) -> Self {
        TypeNode::Array {
            element: Box::new(element),
            syntax: ArraySyntax::Angle,
        }
    }

    /// `T ARRAY`
    pub fn postfix_array(element: TypeNode) -> Self {
        TypeNode::Array {
            element: Box::new(element),
            syntax: ArraySyntax::Postfix,
        }
    }

    pub fn map(key: TypeNode, value: TypeNode) -> Self {
        TypeNode::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// 문자열/바이너리 계열의 길이
    pub fn length(&self) -> Option<u32> {
        match self {
            TypeNode::Char { length }
            | TypeNode::Varchar { length }
            | TypeNode::Binary { length }
            | TypeNode::Varbinary { length } => Some(*length),
            TypeNode::String | TypeNode::Bytes => Some(MAX_LENGTH),
            _ => None,
        }
    }

    /// 컨테이너 타입이면 그 종류
    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            TypeNode::Array { .. } => Some(ContainerKind::Array),
            TypeNode::Map { .. } => Some(ContainerKind::Map),
            _ => None,
        }
    }

    /// 컨테이너 내부 타입 (Map은 key, value 순)
    pub fn internal_types(&self) -> Vec<&TypeNode> {
        match self {
            TypeNode::Array { element, .. } => vec![element.as_ref()],
            TypeNode::Map { key, value } => vec![key.as_ref(), value.as_ref()],
            _ => Vec::new(),
        }
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self, TypeNode::PrimaryKey(_))
    }

    /// `PRIMARY KEY` 표시 제거
    ///
    /// 중첩된 표시도 모두 벗겨냅니다.
    pub fn without_primary_key(self) -> TypeNode {
        match self {
            TypeNode::PrimaryKey(inner) => inner.without_primary_key(),
            other => other,
        }
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNode::NotNull(inner) => write!(f, "{} NOT NULL", inner),
            TypeNode::Char { length } => write!(f, "CHAR({})", length),
            TypeNode::Varchar { length } => write!(f, "VARCHAR({})", length),
            TypeNode::String => f.write_str("STRING"),
            TypeNode::Binary { length } => write!(f, "BINARY({})", length),
            TypeNode::Varbinary { length } => write!(f, "VARBINARY({})", length),
            TypeNode::Bytes => f.write_str("BYTES"),
            TypeNode::TinyInt => f.write_str("TINYINT"),
            TypeNode::SmallInt => f.write_str("SMALLINT"),
            TypeNode::Int => f.write_str("INT"),
            TypeNode::BigInt => f.write_str("BIGINT"),
            TypeNode::Decimal { precision, scale } => {
                write!(f, "DECIMAL({}, {})", precision, scale)
            }
            TypeNode::Dec { precision, scale } => write!(f, "DEC({}, {})", precision, scale),
            TypeNode::Numeric { precision, scale } => {
                write!(f, "NUMERIC({}, {})", precision, scale)
            }
            TypeNode::Float => f.write_str("FLOAT"),
            TypeNode::Double => f.write_str("DOUBLE"),
            TypeNode::Date => f.write_str("DATE"),
            TypeNode::Time { precision } => write!(f, "TIME({})", precision),
            TypeNode::Timestamp {
                precision,
                with_time_zone,
            } => {
                let clause = if *with_time_zone { "WITH" } else { "WITHOUT" };
                write!(f, "TIMESTAMP({}) {} TIME ZONE", precision, clause)
            }
            TypeNode::TimestampLtz { precision } => write!(f, "TIMESTAMP_LTZ({})", precision),
            TypeNode::Array {
                element,
                syntax: ArraySyntax::Angle,
            } => write!(f, "ARRAY<{}>", element),
            TypeNode::Array {
                element,
                syntax: ArraySyntax::Postfix,
            } => write!(f, "{} ARRAY", element),
            TypeNode::Map { key, value } => write!(f, "MAP<{}, {}>", key, value),
            TypeNode::PrimaryKey(inner) => write!(f, "{} PRIMARY KEY", inner),
            TypeNode::Boolean => f.write_str("BOOLEAN"),
            TypeNode::Interval => f.write_str("INTERVAL"),
            TypeNode::Multiset => f.write_str("MULTISET"),
        }
    }
}
