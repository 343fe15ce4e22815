//! subset CLI (`subset`)
//!
//! 시드 행에서 출발해 외래키로 이어진 행 전체를 추출하는 Operator 도구입니다.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod context;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "subset")]
#[command(author, version, about = "subset CLI - extract referentially complete row subsets", long_about = None)]
struct Cli {
    /// Database URL (overrides config and SUBSET_DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    // ─────────────────────────────────────────────────────────────────────────
    // Schema
    // ─────────────────────────────────────────────────────────────────────────
    /// List tables with their identity keys and foreign keys
    Tables,

    /// Dump triggers wrapped in delimiter statements
    Triggers,

    // ─────────────────────────────────────────────────────────────────────────
    // Traversal
    // ─────────────────────────────────────────────────────────────────────────
    /// Extract the dependency closure of the selected seed rows
    Closure {
        #[command(flatten)]
        seed: SeedArgs,

        /// Also follow rows that reference the visited rows
        #[arg(long)]
        down: bool,

        /// Maximum number of concurrent lookups
        #[arg(long)]
        max_lookups: Option<usize>,
    },

    /// Show the links of the selected seed rows without following them
    Links {
        #[command(flatten)]
        seed: SeedArgs,

        /// Include links to referencing rows
        #[arg(long)]
        down: bool,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Config
    // ─────────────────────────────────────────────────────────────────────────
    /// Manage CLI configuration (~/.subset/config.json)
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
struct SeedArgs {
    /// Seed table
    #[arg(long)]
    table: String,

    /// Seed condition, repeatable (COLUMN=VALUE, `null` matches IS NULL)
    #[arg(long = "where", value_name = "COLUMN=VALUE")]
    conditions: Vec<String>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Update stored settings
    Set {
        #[arg(long)]
        database_url: Option<String>,
        #[arg(long)]
        max_lookups: Option<usize>,
        #[arg(long)]
        max_connections: Option<u32>,
    },
    /// Show stored and effective settings
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 로그는 stderr로 (stdout은 결과 출력용)
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subset=info,subset_core=info,subset_sql=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // 설정 로드
    let config = CliConfig::load()?;

    // 실행 설정 결정 (CLI 옵션 > 환경 변수 > 설정 파일)
    let effective_context = context::resolve_context(&config, cli.database_url.as_deref(), None);

    // 명령 실행
    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Set {
                database_url,
                max_lookups,
                max_connections,
            } => commands::config::set(config, database_url, max_lookups, max_connections),
            ConfigAction::Show => commands::config::show(&config, &effective_context),
        },

        Commands::Tables => {
            let db = commands::open_database(&effective_context).await?;
            let result = commands::tables::list(&db, cli.format);
            db.disconnect().await;
            result
        }

        Commands::Triggers => {
            let db = commands::open_database(&effective_context).await?;
            let result = commands::triggers::dump(&db, cli.format);
            db.disconnect().await;
            result
        }

        Commands::Closure {
            seed,
            down,
            max_lookups,
        } => {
            let effective_context =
                context::resolve_context(&config, cli.database_url.as_deref(), max_lookups);
            let db = commands::open_database(&effective_context).await?;
            let result =
                commands::closure::extract(&db, &seed.table, &seed.conditions, down, cli.format)
                    .await;
            db.disconnect().await;
            result
        }

        Commands::Links { seed, down } => {
            let db = commands::open_database(&effective_context).await?;
            let result =
                commands::links::show(&db, &seed.table, &seed.conditions, down, cli.format).await;
            db.disconnect().await;
            result
        }
    }
}
