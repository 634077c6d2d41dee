//! 스트리밍 플랫폼 클라이언트
//!
//! - `api`: 컨트롤 플레인 (스트림, 파이프라인, 미리보기 토큰, apply)
//! - `data_plane`: 미리보기 실행, 스트림 비우기
//! - `preview`: 미리보기 폴링과 결과 수집
//! - `detect`: 모델 변경 감지 전략
//! - `seed`: CSV 시드 연결 생성과 이벤트 전송
//! - `rename`: 스트림/파이프라인 이름 변경
//! - `config`: 프로필 파일과 클라이언트 설정

pub mod api;
pub mod config;
pub mod data_plane;
pub mod detect;
pub mod error;
pub mod preview;
pub mod rename;
pub mod responses;
pub mod seed;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ControlPlane};
pub use config::{ClientConfig, ClientFactory, ClientOptions, ProfileStore, SchemaVersion, StartPosition};
pub use data_plane::DataPlaneClient;
pub use detect::{ChangeDetector, Detection, DetectionStrategy, StreamModel};
pub use error::{ApiError, Result};
pub use rename::{rename_relation, RenameReport};
pub use seed::{create_seed_table, send_seed_as_events, SeedReport, SeedTable};
