//! 스트림 스키마 모델
//!
//! # 모듈 구조
//!
//! - `field`: 필드 정의 (physical / metadata / computed)
//! - `ir`: 스키마 (필드 + 워터마크 + 제약 조건)
//! - `parser`: 원격 스키마 문서(JSON) 파싱

mod field;
mod ir;
mod parser;

pub use field::{FieldKind, SchemaField};
pub use ir::{pretty_fields, Constraints, Schema, Watermark};
