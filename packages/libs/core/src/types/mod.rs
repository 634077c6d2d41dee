//! Flink SQL 타입 문자열 파싱 및 동등성
//!
//! # 모듈 구조
//!
//! - `node`: 타입 AST (`TypeNode`) 와 정규 렌더링
//! - `parser`: 우선순위 규칙 테이블 기반 파서
//! - `synonyms`: 동의어 기반 동등성/해시
//! - `seed`: 시드 컬럼 타입 추론
//!
//! # 예시
//!
//! ```
//! use dct_core::types::TypeNode;
//!
//! let a: TypeNode = "NUMERIC ARRAY".parse().unwrap();
//! let b: TypeNode = "ARRAY<DECIMAL(10, 0)>".parse().unwrap();
//! assert_eq!(a, b);
//! ```

mod node;
pub mod parser;
mod seed;
pub mod synonyms;

use std::str::FromStr;

use crate::error::{Error, Result};

pub use node::{ArraySyntax, ContainerKind, TypeNode, DEFAULT_PRECISION, DEFAULT_SCALE, MAX_LENGTH};
pub use parser::TypeTag;
pub use seed::{seed_column_type, SeedColumn, SeedColumnType};

impl TypeNode {
    /// 타입 문자열 파싱 (인식 실패 시 `None`)
    pub fn parse(text: &str) -> Option<TypeNode> {
        parser::parse(text)
    }

    /// 필드 이름을 포함한 에러로 파싱
    pub fn parse_for_field(field: &str, text: &str) -> Result<TypeNode> {
        parser::parse(text).ok_or_else(|| Error::unrecognized_field_type(field, text))
    }

    /// 동의어/표기법을 정규화한 키 (`Hash`의 기준)
    pub fn canonical_key(&self) -> String {
        synonyms::canonical_key(self)
    }

    pub fn synonyms(&self) -> Vec<TypeNode> {
        synonyms::synonyms_of(self)
    }
}

impl FromStr for TypeNode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parser::parse(s).ok_or_else(|| Error::unrecognized_type(s))
    }
}
