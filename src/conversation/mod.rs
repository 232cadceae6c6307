//! Append-only log of chat exchanges.


use anyhow::{Context, Result};
use chrono::Local;
use tracing::debug;

use crate::config::HistoryConfig;
use crate::database::sqlite::{Database, NewConversation};

/// Timestamp layout stored in the `date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in [`DATE_FORMAT`]
#[inline]
pub fn timestamp() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone)]
pub struct ConversationLog {
    database: Database,
    tags: String,
    title: String,
}

impl ConversationLog {
    #[inline]
    pub fn new(database: Database, history: &HistoryConfig) -> Self {
        Self {
            database,
            tags: history.tags.clone(),
            title: history.title.clone(),
        }
    }

    #[inline]
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Record a query and its response as two rows sharing one timestamp
    pub async fn log_exchange(&self, query: &str, response: &str) -> Result<()> {
        self.log_exchange_at(&timestamp(), query, response).await
    }

    pub async fn log_exchange_at(&self, date: &str, query: &str, response: &str) -> Result<()> {
        for text in [query, response] {
            let row = NewConversation {
                date: date.to_string(),
                tags: self.tags.clone(),
                title: self.title.clone(),
                vector_id: text.to_string(),
            };
            self.database
                .insert_conversation(&row)
                .await
                .context("Failed to log conversation")?;
        }

        debug!("Logged exchange at {}", date);
        Ok(())
    }
}
