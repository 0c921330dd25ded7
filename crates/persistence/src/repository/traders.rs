//! Trader repository — persistence for trader documents and credentials

use crate::DbResult;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{FromRow, SqlitePool};
use tracing::info;
use uuid::Uuid;

/// A persisted trader document. The JSON columns hold the uploaded trade
/// history, survey answers, and the two pipeline outputs verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TraderRecord {
    pub id: Option<i64>,
    pub trader_id: String,
    pub username: String,
    pub trade_history: String,
    pub survey_responses: String,
    pub derived_metrics: Option<String>,
    pub behavioral_profile: Option<String>,
    pub created_at: Option<i64>,
}

/// A login credential row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: Option<i64>,
    pub username: String,
    pub password_hash: String,
    pub trader_id: String,
    pub created_at: Option<i64>,
}

/// Aggregate win/loss stats over a stored trade history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderStats {
    pub total_trades: i64,
    pub win_rate: f64,
    pub profitable_trades: i64,
    pub loss_trades: i64,
}

fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Repository for trader documents and credentials
pub struct TraderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TraderRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a trader: stores credentials and the trader document, and
    /// returns the generated trader id. Fails if the username is taken.
    pub async fn create_trader(
        &self,
        username: &str,
        password: &str,
        trade_history_json: &str,
        survey_json: &str,
    ) -> DbResult<String> {
        let trader_id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO users (username, password_hash, trader_id) VALUES (?1, ?2, ?3)",
        )
        .bind(username)
        .bind(hash_password(password))
        .bind(&trader_id)
        .execute(self.pool)
        .await?;

        sqlx::query(
            r#"INSERT INTO traders (trader_id, username, trade_history, survey_responses)
               VALUES (?1, ?2, ?3, ?4)"#,
        )
        .bind(&trader_id)
        .bind(username)
        .bind(trade_history_json)
        .bind(survey_json)
        .execute(self.pool)
        .await?;

        info!(username, trader_id = %trader_id, "Trader registered");
        Ok(trader_id)
    }

    /// Check credentials, returning the user row on success
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> DbResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT * FROM users WHERE username = ?1 AND password_hash = ?2",
        )
        .bind(username)
        .bind(hash_password(password))
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Store the derived metrics JSON (`None` keeps the column NULL, the
    /// empty-history case)
    pub async fn save_metrics(&self, trader_id: &str, metrics_json: Option<&str>) -> DbResult<()> {
        sqlx::query("UPDATE traders SET derived_metrics = ?2 WHERE trader_id = ?1")
            .bind(trader_id)
            .bind(metrics_json)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Store the behavioral profile JSON
    pub async fn save_profile(&self, trader_id: &str, profile_json: &str) -> DbResult<()> {
        sqlx::query("UPDATE traders SET behavioral_profile = ?2 WHERE trader_id = ?1")
            .bind(trader_id)
            .bind(profile_json)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Retrieve the complete trader document
    pub async fn get_trader(&self, trader_id: &str) -> DbResult<Option<TraderRecord>> {
        let record = sqlx::query_as::<_, TraderRecord>(
            "SELECT * FROM traders WHERE trader_id = ?1",
        )
        .bind(trader_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Stored trade history JSON, without the rest of the document
    pub async fn get_trade_history(&self, trader_id: &str) -> DbResult<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT trade_history FROM traders WHERE trader_id = ?1")
                .bind(trader_id)
                .fetch_optional(self.pool)
                .await?;
        Ok(row.map(|(history,)| history))
    }

    /// Aggregate win/loss counts over the stored trade history, or `None`
    /// when the trader is unknown or has no trades
    pub async fn get_trader_stats(&self, trader_id: &str) -> DbResult<Option<TraderStats>> {
        let Some(record) = self.get_trader(trader_id).await? else {
            return Ok(None);
        };

        let trades: Vec<serde_json::Value> =
            serde_json::from_str(&record.trade_history).unwrap_or_default();
        if trades.is_empty() {
            return Ok(None);
        }

        let total_trades = trades.len() as i64;
        let profitable_trades = trades
            .iter()
            .filter(|t| t.get("outcome").and_then(|o| o.as_str()) == Some("Profit"))
            .count() as i64;

        Ok(Some(TraderStats {
            total_trades,
            win_rate: profitable_trades as f64 / total_trades as f64,
            profitable_trades,
            loss_trades: total_trades - profitable_trades,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    const HISTORY: &str = r#"[
        {"asset": "BTC", "outcome": "Profit"},
        {"asset": "ETH", "outcome": "Loss"},
        {"asset": "BTC", "outcome": "Profit"}
    ]"#;

    const SURVEY: &str = r#"{"primary_strategy": "Technical", "loss_reaction": "cut", "risk_tolerance": "Medium"}"#;

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let db = Database::in_memory().await.unwrap();
        let repo = TraderRepository::new(db.pool());

        let trader_id = repo
            .create_trader("alice", "hunter2", HISTORY, SURVEY)
            .await
            .unwrap();

        let user = repo.authenticate("alice", "hunter2").await.unwrap();
        assert_eq!(user.unwrap().trader_id, trader_id);

        assert!(repo.authenticate("alice", "wrong").await.unwrap().is_none());
        assert!(repo.authenticate("bob", "hunter2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = Database::in_memory().await.unwrap();
        let repo = TraderRepository::new(db.pool());

        repo.create_trader("alice", "pw", "[]", "{}").await.unwrap();
        assert!(repo.create_trader("alice", "pw2", "[]", "{}").await.is_err());
    }

    #[tokio::test]
    async fn test_profile_round_trip() {
        let db = Database::in_memory().await.unwrap();
        let repo = TraderRepository::new(db.pool());

        let trader_id = repo
            .create_trader("alice", "pw", HISTORY, SURVEY)
            .await
            .unwrap();

        repo.save_metrics(&trader_id, Some(r#"{"win_rate": 0.667}"#))
            .await
            .unwrap();
        repo.save_profile(&trader_id, r#"{"derived_features": {}}"#)
            .await
            .unwrap();

        let record = repo.get_trader(&trader_id).await.unwrap().unwrap();
        assert_eq!(record.username, "alice");
        assert!(record.derived_metrics.unwrap().contains("0.667"));
        assert!(record.behavioral_profile.is_some());

        let history = repo.get_trade_history(&trader_id).await.unwrap().unwrap();
        assert!(history.contains("BTC"));

        assert!(repo.get_trader("no-such-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_metrics_stored_as_null() {
        let db = Database::in_memory().await.unwrap();
        let repo = TraderRepository::new(db.pool());

        let trader_id = repo.create_trader("alice", "pw", "[]", "{}").await.unwrap();
        repo.save_metrics(&trader_id, None).await.unwrap();

        let record = repo.get_trader(&trader_id).await.unwrap().unwrap();
        assert!(record.derived_metrics.is_none());
    }

    #[tokio::test]
    async fn test_trader_stats() {
        let db = Database::in_memory().await.unwrap();
        let repo = TraderRepository::new(db.pool());

        let trader_id = repo
            .create_trader("alice", "pw", HISTORY, SURVEY)
            .await
            .unwrap();

        let stats = repo.get_trader_stats(&trader_id).await.unwrap().unwrap();
        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.profitable_trades, 2);
        assert_eq!(stats.loss_trades, 1);
        assert!((stats.win_rate - 2.0 / 3.0).abs() < 1e-9);

        let empty_id = repo.create_trader("bob", "pw", "[]", "{}").await.unwrap();
        assert!(repo.get_trader_stats(&empty_id).await.unwrap().is_none());
    }
}
