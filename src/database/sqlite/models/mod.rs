
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the `conversations` table.
///
/// `vector_id` carries the raw text of a query or a response. Columns are
/// nullable in the schema, so rows written by other tools may lack fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    pub id: i64,
    pub date: Option<String>,
    pub tags: Option<String>,
    pub title: Option<String>,
    pub vector_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConversation {
    pub date: String,
    pub tags: String,
    pub title: String,
    pub vector_id: String,
}

impl Conversation {
    /// The stored query or response text
    #[inline]
    pub fn text(&self) -> &str {
        self.vector_id.as_deref().unwrap_or_default()
    }
}
