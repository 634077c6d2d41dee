//! dct-core: Flink SQL 타입 파서 및 스키마 변경 감지 라이브러리
//!
//! 이 크레이트는 클라이언트와 CLI가 공유하는 순수 로직을 제공합니다.
//! I/O와 로깅을 하지 않습니다.
//!
//! # 모듈 구조
//!
//! - `types`: 타입 문자열 파싱, 동의어 기반 동등성
//! - `schema`: 스키마 필드/스키마 모델 및 JSON 변환
//! - `reconcile`: 로컬/원격 스트림 비교
//! - `pipeline`: 파이프라인 SQL 보조 함수
//! - `error`: 공통 에러 타입

pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod schema;
pub mod types;

pub use error::{Error, Result};
pub use schema::{FieldKind, Schema, SchemaField};
pub use types::TypeNode;
