//! Data access for one entity type per repository.
//!
//! Each repository is bound to a single table and to the [`Session`] it was
//! built with. A lookup that matches no row surfaces as
//! [`StorageError::NotFound`]; no other error is used for that case.
//!
//! [`Session`]: crate::storage::Session
//! [`StorageError::NotFound`]: crate::storage::StorageError::NotFound

mod entitlement;
mod organization;

pub use entitlement::EntitlementRepository;
pub use organization::OrganizationRepository;

use chrono::{DateTime, Utc};
use rusqlite::{types::Type, Connection, Row};
use serde::Serialize;
use uuid::Uuid;

use crate::{models::timestamp, models::Entity, storage::StorageResult};

pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Limit/offset window over a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

/// One page of rows plus the size of the whole table at query time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

pub trait Repository {
    type Entity: Entity;
    type Create;
    type Patch;

    /// Insert a new row. Identity and timestamps are assigned here.
    fn create(&self, input: Self::Create) -> StorageResult<Self::Entity>;

    fn get(&self, id: Uuid) -> StorageResult<Self::Entity>;

    /// Merge `patch` into `existing` and persist the result.
    ///
    /// `existing` must come from [`Repository::get`].
    fn update(&self, existing: Self::Entity, patch: Self::Patch) -> StorageResult<Self::Entity>;

    /// Rows in insertion order.
    fn fetch_page(&self, pagination: Pagination) -> StorageResult<Page<Self::Entity>>;
}

fn conversion_error(
    idx: usize,
    ty: Type,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn read_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|err| conversion_error(idx, Type::Text, err))
}

fn read_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    timestamp::decode(&raw).map_err(|err| conversion_error(idx, Type::Text, err))
}

fn read_optional_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| timestamp::decode(&raw).map_err(|err| conversion_error(idx, Type::Text, err)))
        .transpose()
}

fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<u64> {
    let total: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(total.max(0) as u64)
}

fn sql_offset(offset: u64) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}
