use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{
    count_rows, read_optional_timestamp, read_timestamp, read_uuid, sql_offset, Page, Pagination,
    Repository,
};
use crate::{
    models::{timestamp, Entitlement, EntitlementCreate, EntitlementPatch},
    storage::{Session, StorageError, StorageResult},
};

const TABLE: &str = "entitlements";

fn map_entitlement_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entitlement> {
    Ok(Entitlement {
        id: read_uuid(row, 0)?,
        sponsor_name: row.get(1)?,
        sponsor_external_id: row.get(2)?,
        sponsor_container_id: row.get(3)?,
        activated_at: read_optional_timestamp(row, 4)?,
        created_at: read_timestamp(row, 5)?,
        updated_at: read_timestamp(row, 6)?,
    })
}

fn db_load_entitlement(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Entitlement>> {
    conn.query_row(
        r#"
        SELECT id, sponsor_name, sponsor_external_id, sponsor_container_id,
               activated_at, created_at, updated_at
        FROM entitlements
        WHERE id = ?1
        "#,
        params![id.to_string()],
        map_entitlement_row,
    )
    .optional()
}

fn db_list_entitlements(
    conn: &Connection,
    limit: u32,
    offset: u64,
) -> rusqlite::Result<Vec<Entitlement>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, sponsor_name, sponsor_external_id, sponsor_container_id,
               activated_at, created_at, updated_at
        FROM entitlements
        ORDER BY rowid
        LIMIT ?1 OFFSET ?2
        "#,
    )?;
    let rows = stmt
        .query_map(params![limit, sql_offset(offset)], map_entitlement_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_entitlement(conn: &Connection, entitlement: &Entitlement) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO entitlements (
            id, sponsor_name, sponsor_external_id, sponsor_container_id,
            activated_at, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            entitlement.id.to_string(),
            entitlement.sponsor_name,
            entitlement.sponsor_external_id,
            entitlement.sponsor_container_id,
            entitlement.activated_at.as_ref().map(timestamp::encode),
            timestamp::encode(&entitlement.created_at),
            timestamp::encode(&entitlement.updated_at),
        ],
    )?;
    Ok(())
}

fn db_save_entitlement(conn: &Connection, entitlement: &Entitlement) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        UPDATE entitlements
        SET sponsor_name = ?2,
            sponsor_external_id = ?3,
            sponsor_container_id = ?4,
            activated_at = ?5,
            updated_at = ?6
        WHERE id = ?1
        "#,
        params![
            entitlement.id.to_string(),
            entitlement.sponsor_name,
            entitlement.sponsor_external_id,
            entitlement.sponsor_container_id,
            entitlement.activated_at.as_ref().map(timestamp::encode),
            timestamp::encode(&entitlement.updated_at),
        ],
    )
}

fn load_or_not_found(conn: &Connection, id: Uuid) -> StorageResult<Entitlement> {
    db_load_entitlement(conn, id)?.ok_or_else(|| StorageError::not_found::<Entitlement>(id))
}

pub struct EntitlementRepository<'s> {
    session: &'s Session,
}

impl<'s> EntitlementRepository<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }
}

impl Repository for EntitlementRepository<'_> {
    type Entity = Entitlement;
    type Create = EntitlementCreate;
    type Patch = EntitlementPatch;

    fn create(&self, input: EntitlementCreate) -> StorageResult<Entitlement> {
        let now = timestamp::now();
        let entitlement = Entitlement {
            id: Uuid::new_v4(),
            sponsor_name: input.sponsor_name,
            sponsor_external_id: input.sponsor_external_id,
            sponsor_container_id: input.sponsor_container_id,
            activated_at: None,
            created_at: now,
            updated_at: now,
        };

        self.session.write(|conn| {
            db_insert_entitlement(conn, &entitlement)?;
            load_or_not_found(conn, entitlement.id)
        })
    }

    fn get(&self, id: Uuid) -> StorageResult<Entitlement> {
        self.session.read(|conn| load_or_not_found(conn, id))
    }

    fn update(
        &self,
        mut existing: Entitlement,
        patch: EntitlementPatch,
    ) -> StorageResult<Entitlement> {
        if patch.is_empty() {
            return Ok(existing);
        }

        patch.apply_to(&mut existing);

        self.session.write(move |conn| {
            // `existing` may predate a concurrent update; step past what is stored now.
            let stored = load_or_not_found(conn, existing.id)?;
            existing.updated_at =
                timestamp::next_after(stored.updated_at.max(existing.updated_at));
            if db_save_entitlement(conn, &existing)? == 0 {
                return Err(StorageError::not_found::<Entitlement>(existing.id));
            }
            load_or_not_found(conn, existing.id)
        })
    }

    fn fetch_page(&self, pagination: Pagination) -> StorageResult<Page<Entitlement>> {
        self.session.read(|conn| {
            let total = count_rows(conn, TABLE)?;
            let items = db_list_entitlements(conn, pagination.limit, pagination.offset)?;
            Ok(Page {
                items,
                total,
                limit: pagination.limit,
                offset: pagination.offset,
            })
        })
    }
}
