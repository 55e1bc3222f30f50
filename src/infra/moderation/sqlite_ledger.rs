// SQLite-backed offender ledger.
//
// Tables:
// - offender_ledger: one row per user with their cumulative violation count

use crate::core::moderation::{ModerationError, OffenderLedger};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteOffenderLedger {
    pool: Pool<Sqlite>,
}

impl SqliteOffenderLedger {
    /// Open (creating if needed) the database at `database_url` and migrate it.
    pub async fn new(database_url: &str) -> Result<Self, ModerationError> {
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ModerationError::Storage(e.to_string()))?;
            }
            std::fs::File::create(path_str).map_err(|e| ModerationError::Storage(e.to_string()))?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new()
            .connect(&conn_str)
            .await
            .map_err(|e| ModerationError::Storage(e.to_string()))?;

        let ledger = Self { pool };
        ledger.migrate().await?;
        Ok(ledger)
    }

    async fn migrate(&self) -> Result<(), ModerationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS offender_ledger (
                user_id INTEGER PRIMARY KEY,
                violation_count INTEGER NOT NULL DEFAULT 0,
                last_violation TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::Storage(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl OffenderLedger for SqliteOffenderLedger {
    async fn increment(&self, user_id: u64) -> Result<u32, ModerationError> {
        // Upsert and read back in one statement so concurrent violations
        // from the same user can't both see the old count.
        let row = sqlx::query(
            r#"
            INSERT INTO offender_ledger (user_id, violation_count, last_violation)
            VALUES (?, 1, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                violation_count = MIN(violation_count + 1, 4294967295),
                last_violation = excluded.last_violation
            RETURNING violation_count
            "#,
        )
        .bind(user_id as i64)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ModerationError::Storage(e.to_string()))?;

        Ok(to_count(row.get("violation_count")))
    }

    async fn current_count(&self, user_id: u64) -> Result<u32, ModerationError> {
        let row = sqlx::query("SELECT violation_count FROM offender_ledger WHERE user_id = ?")
            .bind(user_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ModerationError::Storage(e.to_string()))?;

        Ok(row
            .map(|r| to_count(r.get("violation_count")))
            .unwrap_or(0))
    }
}

/// Clamp a stored count into `u32`, saturating like the in-memory ledger.
fn to_count(raw: i64) -> u32 {
    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sqlite_ledger_counts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let ledger = SqliteOffenderLedger::new(path.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(ledger.current_count(5).await.unwrap(), 0);
        assert_eq!(ledger.increment(5).await.unwrap(), 1);
        assert_eq!(ledger.increment(5).await.unwrap(), 2);
        assert_eq!(ledger.increment(6).await.unwrap(), 1);
        assert_eq!(ledger.current_count(5).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_count_saturates_at_u32_max() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let ledger = SqliteOffenderLedger::new(path.to_str().unwrap())
            .await
            .unwrap();

        sqlx::query(
            "INSERT INTO offender_ledger (user_id, violation_count, last_violation) VALUES (?, ?, ?)",
        )
        .bind(7_i64)
        .bind(u32::MAX as i64 + 5)
        .bind(Utc::now().to_rfc3339())
        .execute(&ledger.pool)
        .await
        .unwrap();

        assert_eq!(ledger.current_count(7).await.unwrap(), u32::MAX);
        assert_eq!(ledger.increment(7).await.unwrap(), u32::MAX);
        assert_eq!(ledger.current_count(7).await.unwrap(), u32::MAX);

        assert_eq!(to_count(-1), 0);
        assert_eq!(to_count(41), 41);
    }

    #[tokio::test]
    async fn test_counts_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.db");
        let path = path.to_str().unwrap().to_string();

        {
            let ledger = SqliteOffenderLedger::new(&path).await.unwrap();
            for _ in 0..3 {
                ledger.increment(99).await.unwrap();
            }
            ledger.pool.close().await;
        }

        let reopened = SqliteOffenderLedger::new(&path).await.unwrap();
        assert_eq!(reopened.current_count(99).await.unwrap(), 3);
        assert_eq!(reopened.increment(99).await.unwrap(), 4);
    }
}
