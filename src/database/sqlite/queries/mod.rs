
use super::models::*;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

pub struct ConversationQueries;

impl ConversationQueries {
    #[inline]
    pub async fn create(
        pool: &SqlitePool,
        new_conversation: NewConversation,
    ) -> Result<Conversation> {
        let id = sqlx::query(
            "INSERT INTO conversations (date, tags, title, vector_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&new_conversation.date)
        .bind(&new_conversation.tags)
        .bind(&new_conversation.title)
        .bind(&new_conversation.vector_id)
        .execute(pool)
        .await
        .context("Failed to insert conversation")?
        .last_insert_rowid();

        debug!("Inserted conversation row {}", id);

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created conversation"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Conversation>> {
        let result = sqlx::query_as::<_, Conversation>(
            "SELECT id, date, tags, title, vector_id FROM conversations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get conversation by id")?;

        Ok(result)
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Conversation>> {
        let conversations = sqlx::query_as::<_, Conversation>(
            "SELECT id, date, tags, title, vector_id FROM conversations ORDER BY id ASC",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list conversations")?;

        Ok(conversations)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
            .fetch_one(pool)
            .await
            .context("Failed to count conversations")?;

        Ok(count)
    }
}
