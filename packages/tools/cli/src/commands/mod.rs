//! CLI 명령어 구현

pub mod context;
pub mod diff;
pub mod http;
pub mod preview;
pub mod rename;
pub mod seed;
pub mod streams;
pub mod types;

use serde::Serialize;

/// 출력 형식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
