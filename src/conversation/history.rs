//! Conversation line persistence (SQLite).

use crate::error::Result;

use sqlx::{Row as _, SqlitePool};

/// Maximum number of lines fed back into a prompt.
pub const RECENT_LIMIT: i64 = 10;

/// Persists exchange lines ("User: ..." / "Bot: ...") keyed by channel and user.
///
/// Writes and reads are best-effort: failures are logged and turn into a
/// no-op or an empty history, never into an error for the caller.
///
/// Reads and writes for the same key from concurrent turns are not ordered
/// against each other, so a read may or may not include lines appended by a
/// turn that is still in flight.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    pool: SqlitePool,
}

impl ConversationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record one line for `(channel_id, user_id)`.
    pub async fn append(&self, channel_id: &str, user_id: &str, message: &str) {
        let timestamp = chrono::Utc::now().timestamp_millis();

        if let Err(error) = sqlx::query(
            "INSERT INTO memory (channel_id, user_id, message, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(channel_id)
        .bind(user_id)
        .bind(message)
        .bind(timestamp)
        .execute(&self.pool)
        .await
        {
            tracing::warn!(%error, %channel_id, %user_id, "failed to persist conversation line");
        }
    }

    /// Up to [`RECENT_LIMIT`] most recent lines for exactly this
    /// `(channel_id, user_id)`, oldest first. Empty on any read failure.
    pub async fn recent(&self, channel_id: &str, user_id: &str) -> Vec<String> {
        match self.load_recent(channel_id, user_id).await {
            Ok(lines) => lines,
            Err(error) => {
                tracing::warn!(%error, %channel_id, %user_id, "failed to load conversation history");
                Vec::new()
            }
        }
    }

    async fn load_recent(&self, channel_id: &str, user_id: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT message FROM memory \
             WHERE channel_id = ? AND user_id = ? \
             ORDER BY timestamp DESC, id DESC \
             LIMIT ?",
        )
        .bind(channel_id)
        .bind(user_id)
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let mut lines = rows
            .into_iter()
            .map(|row| row.try_get::<String, _>("message"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Reverse to chronological order
        lines.reverse();
        Ok(lines)
    }

    /// Total number of stored lines for a key.
    #[cfg(test)]
    pub async fn count(&self, channel_id: &str, user_id: &str) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM memory WHERE channel_id = ? AND user_id = ?",
        )
        .bind(channel_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("total")?)
    }
}
