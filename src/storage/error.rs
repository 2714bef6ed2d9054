use thiserror::Error;
use uuid::Uuid;

use crate::models::Entity;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{entity} with ID {id} wasn't found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error(
        "database schema version mismatch (found {found}, expected {expected}); please run with --reset option"
    )]
    SchemaMismatch { found: i64, expected: i64 },
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn not_found<E: Entity>(id: Uuid) -> Self {
        StorageError::NotFound {
            entity: E::NAME,
            id,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
