// Database module
// SQLite holds the conversation log, LanceDB holds the vector index

pub mod lancedb;
pub mod sqlite;

pub use sqlite::*;
