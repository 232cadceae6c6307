use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;

use super::{Document, DocumentLoader, SOURCE_KEY, TAGS_KEY};
use crate::database::sqlite::Database;

/// Source value recorded on every conversation document
pub const CONVERSATION_SOURCE: &str = "conversations";

/// Turns every logged query and response into a document
#[derive(Debug, Clone)]
pub struct ConversationLoader {
    database: Database,
}

impl ConversationLoader {
    #[inline]
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl DocumentLoader for ConversationLoader {
    async fn load(&self) -> Result<Vec<Document>> {
        let rows = self
            .database
            .list_conversations()
            .await
            .context("Failed to read conversation history")?;

        let documents = rows
            .into_iter()
            .map(|row| {
                let mut metadata = BTreeMap::new();
                metadata.insert(TAGS_KEY.to_string(), row.tags.clone().unwrap_or_default());
                metadata.insert(SOURCE_KEY.to_string(), CONVERSATION_SOURCE.to_string());
                Document::new(row.text().to_string(), metadata)
            })
            .collect();

        Ok(documents)
    }

    fn describe(&self) -> String {
        CONVERSATION_SOURCE.to_string()
    }
}
