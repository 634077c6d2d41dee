//! 스트리밍 파이프라인 모델 CLI (`dct`)
//!
//! 타입 문자열 확인, 모델 변경 감지, 스트림 조회, SQL 미리보기,
//! 시드 적재와 이름 변경을 제공합니다.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dct_client::SchemaVersion;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod context;
mod model;

use commands::OutputFormat;

#[derive(Parser)]
#[command(name = "dct")]
#[command(author, version, about = "dct - streaming pipeline model tool", long_about = None)]
struct Cli {
    /// Account name (overrides context)
    #[arg(long, global = true)]
    account: Option<String>,

    /// Profile in ~/.dct/auth (overrides context and DCT_PROFILE)
    #[arg(long, global = true)]
    profile: Option<String>,

    /// API host and path (overrides context)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    // ─────────────────────────────────────────────────────────────────────────
    // Context
    // ─────────────────────────────────────────────────────────────────────────
    /// Manage repo context
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Local
    // ─────────────────────────────────────────────────────────────────────────
    /// Inspect type strings
    Types {
        #[command(subcommand)]
        action: TypesAction,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Remote
    // ─────────────────────────────────────────────────────────────────────────
    /// Check whether a model differs from its deployed stream and pipeline
    Diff {
        /// Model file (YAML)
        #[arg(long)]
        model: PathBuf,

        /// Stream/pipeline name (defaults to the model name)
        #[arg(long)]
        relation: Option<String>,

        /// v1: compare resources, v2: dry-run apply (overrides context)
        #[arg(long)]
        schema_version: Option<SchemaVersion>,
    },

    /// Inspect streams
    Streams {
        #[command(subcommand)]
        action: StreamsAction,
    },

    /// Run a SQL preview
    Preview {
        #[arg(long)]
        sql: String,

        /// Time budget for collecting results
        #[arg(long, default_value = "60")]
        timeout_secs: u64,

        /// Start from the latest offsets instead of the configured position
        #[arg(long)]
        latest: bool,
    },

    /// Load a CSV file into a new connection and stream
    Seed {
        #[arg(long)]
        file: PathBuf,

        /// Connection/stream name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,

        /// Column type override, repeatable (column=TYPE)
        #[arg(long = "column-type")]
        column_types: Vec<String>,
    },

    /// Rename a stream and its pipeline, updating downstream pipelines
    Rename { from: String, to: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Subcommand enums
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ContextAction {
    /// Set repo context
    Set {
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long)]
        schema_version: Option<SchemaVersion>,
    },
    /// Show current context
    Show,
    /// Clear context
    Clear,
}

#[derive(Subcommand)]
enum TypesAction {
    /// Parse type strings and print their canonical form
    Parse {
        #[arg(required = true)]
        types: Vec<String>,
    },
    /// Check whether two types are equal
    Eq { left: String, right: String },
}

#[derive(Subcommand)]
enum StreamsAction {
    /// List streams
    List,
    /// Show stream details
    Show { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dct=info,dct_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    // 컨텍스트 결정 (CLI 옵션 > repo context)
    let effective_context = context::resolve_context(
        cli.account.as_deref(),
        cli.profile.as_deref(),
        cli.api_url.as_deref(),
    );

    match cli.command {
        Commands::Context { action } => match action {
            ContextAction::Set {
                account,
                profile,
                api_url,
                schema_version,
            } => commands::context::set(account, profile, api_url, schema_version),
            ContextAction::Show => commands::context::show(),
            ContextAction::Clear => commands::context::clear(),
        },

        Commands::Types { action } => match action {
            TypesAction::Parse { types } => commands::types::parse(&types, format),
            TypesAction::Eq { left, right } => commands::types::eq(&left, &right, format),
        },

        Commands::Diff {
            model,
            relation,
            schema_version,
        } => {
            let ctx = effective_context.with_schema_version(schema_version);
            commands::diff::diff(&ctx, format, &model, relation.as_deref()).await
        }

        Commands::Streams { action } => match action {
            StreamsAction::List => commands::streams::list(&effective_context, format).await,
            StreamsAction::Show { name } => {
                commands::streams::show(&effective_context, format, &name).await
            }
        },

        Commands::Preview {
            sql,
            timeout_secs,
            latest,
        } => commands::preview::preview(&effective_context, format, &sql, timeout_secs, latest).await,

        Commands::Seed {
            file,
            name,
            column_types,
        } => {
            commands::seed::seed(&effective_context, format, &file, name.as_deref(), &column_types)
                .await
        }

        Commands::Rename { from, to } => {
            commands::rename::rename(&effective_context, format, &from, &to).await
        }
    }
}
