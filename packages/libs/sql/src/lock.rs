//! MySQL 이름 잠금
//!
//! `GET_LOCK`은 세션 단위이므로 잠금마다 전용 연결을 풀에서 빼 두고,
//! 해제할 때 같은 연결에서 `RELEASE_LOCK`을 호출한 뒤 풀로 돌려보냅니다.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use sqlx::mysql::MySqlPool;
use sqlx::pool::PoolConnection;
use sqlx::MySql;
use tracing::{debug, info};

use crate::error::{Result, SqlError};

/// 기본 잠금 이름
pub const DEFAULT_LOCK_NAME: &str = "subset-lock";

/// 보유 중인 이름 잠금 (이름 → 잠금을 잡은 연결)
#[derive(Debug, Default)]
pub struct NamedLocks {
    held: Mutex<HashMap<String, PoolConnection<MySql>>>,
}

impl NamedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 잠금 획득
    ///
    /// 같은 이름을 이미 보유 중이면 먼저 해제합니다.
    /// `timeout`이 `None`이면 무기한 대기합니다.
    pub async fn acquire(&self, pool: &MySqlPool, name: &str, timeout: Option<Duration>) -> Result<()> {
        self.release(name).await?;

        let mut conn = pool.acquire().await?;
        let seconds = timeout_seconds(timeout);
        let acquired: Option<i64> = sqlx::query_scalar("SELECT GET_LOCK(?, ?)")
            .bind(name)
            .bind(seconds)
            .fetch_one(&mut *conn)
            .await?;

        if acquired != Some(1) {
            return Err(SqlError::LockNotAcquired {
                name: name.to_string(),
            });
        }

        info!(lock = name, "named lock acquired");
        self.held.lock().insert(name.to_string(), conn);
        Ok(())
    }

    /// 잠금 해제 (보유 중이 아니면 `false`)
    pub async fn release(&self, name: &str) -> Result<bool> {
        let conn = self.held.lock().remove(name);
        let Some(mut conn) = conn else {
            return Ok(false);
        };

        sqlx::query("SELECT RELEASE_LOCK(?)")
            .bind(name)
            .execute(&mut *conn)
            .await?;
        debug!(lock = name, "named lock released");
        Ok(true)
    }

    /// 보유 중인 잠금 수
    pub fn held_count(&self) -> usize {
        self.held.lock().len()
    }

    /// 보유 중인 모든 잠금 해제
    pub async fn release_all(&self) -> Result<()> {
        let names: Vec<String> = self.held.lock().keys().cloned().collect();
        for name in names {
            self.release(&name).await?;
        }
        Ok(())
    }
}

/// `GET_LOCK` 대기 시간 (초 단위 올림, 음수는 무기한)
fn timeout_seconds(timeout: Option<Duration>) -> i64 {
    match timeout {
        Some(t) => {
            let seconds = t.as_secs().saturating_add(u64::from(t.subsec_nanos() > 0));
            i64::try_from(seconds).unwrap_or(i64::MAX)
        }
        None => -1,
    }
}
