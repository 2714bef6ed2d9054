mod error;
pub mod sqlite;

pub use error::{StorageError, StorageResult};
pub use sqlite::{Session, SqliteStorage};
