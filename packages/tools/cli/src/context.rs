//! 실행 설정 결정
//!
//! CLI 옵션 > 환경 변수(`SUBSET_*`, `.env` 포함) > `~/.subset/config.json` 순으로 적용합니다.

use subset_sql::ConnectOptions;

use crate::config::CliConfig;

pub const DATABASE_URL_ENV: &str = "SUBSET_DATABASE_URL";
pub const MAX_LOOKUPS_ENV: &str = "SUBSET_MAX_LOOKUPS";

/// 값이 어디서 왔는지
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Flag,
    Env,
    Config,
}

impl Origin {
    pub fn label(&self) -> &'static str {
        match self {
            Origin::Flag => "flag",
            Origin::Env => "env",
            Origin::Config => "config",
        }
    }
}

/// Effective Context (최종 결정된 실행 설정)
#[derive(Debug, Clone)]
pub struct EffectiveContext {
    pub database_url: Option<(String, Origin)>,
    pub max_concurrent_lookups: Option<usize>,
    pub max_connections: Option<u32>,
}

impl EffectiveContext {
    /// database URL 필수 검증
    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_ref()
            .map(|(url, _)| url.as_str())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Database URL not configured. Use --database-url, set {} or 'subset config set --database-url <url>'",
                    DATABASE_URL_ENV
                )
            })
    }

    pub fn connect_options(&self) -> ConnectOptions {
        let defaults = ConnectOptions::default();
        ConnectOptions {
            max_connections: self.max_connections.unwrap_or(defaults.max_connections),
            max_concurrent_lookups: self.max_concurrent_lookups,
        }
    }
}

/// 프로세스 환경 변수로 실행 설정 결정
pub fn resolve_context(
    config: &CliConfig,
    database_url: Option<&str>,
    max_lookups: Option<usize>,
) -> EffectiveContext {
    resolve_with(config, database_url, max_lookups, |key| std::env::var(key).ok())
}

fn resolve_with(
    config: &CliConfig,
    database_url: Option<&str>,
    max_lookups: Option<usize>,
    env: impl Fn(&str) -> Option<String>,
) -> EffectiveContext {
    let database_url = database_url
        .map(|url| (url.to_string(), Origin::Flag))
        .or_else(|| env(DATABASE_URL_ENV).map(|url| (url, Origin::Env)))
        .or_else(|| config.database_url.clone().map(|url| (url, Origin::Config)));

    let max_concurrent_lookups = max_lookups
        .or_else(|| env(MAX_LOOKUPS_ENV).and_then(|v| v.trim().parse().ok()))
        .or(config.max_concurrent_lookups);

    EffectiveContext {
        database_url,
        max_concurrent_lookups,
        max_connections: config.max_connections,
    }
}
