use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{count_rows, read_timestamp, read_uuid, sql_offset, Page, Pagination, Repository};
use crate::{
    models::{timestamp, Organization, OrganizationCreate, OrganizationPatch},
    storage::{Session, StorageError, StorageResult},
};

const TABLE: &str = "organizations";

fn map_organization_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Organization> {
    Ok(Organization {
        id: read_uuid(row, 0)?,
        name: row.get(1)?,
        external_id: row.get(2)?,
        currency: row.get(3)?,
        created_at: read_timestamp(row, 4)?,
        updated_at: read_timestamp(row, 5)?,
    })
}

fn db_load_organization(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Organization>> {
    conn.query_row(
        "SELECT id, name, external_id, currency, created_at, updated_at
         FROM organizations WHERE id = ?1",
        params![id.to_string()],
        map_organization_row,
    )
    .optional()
}

fn db_list_organizations(
    conn: &Connection,
    limit: u32,
    offset: u64,
) -> rusqlite::Result<Vec<Organization>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, external_id, currency, created_at, updated_at
         FROM organizations ORDER BY rowid LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt
        .query_map(params![limit, sql_offset(offset)], map_organization_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_organization(conn: &Connection, organization: &Organization) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO organizations (id, name, external_id, currency, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            organization.id.to_string(),
            organization.name,
            organization.external_id,
            organization.currency,
            timestamp::encode(&organization.created_at),
            timestamp::encode(&organization.updated_at),
        ],
    )?;
    Ok(())
}

fn db_save_organization(conn: &Connection, organization: &Organization) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE organizations
         SET name = ?2, external_id = ?3, currency = ?4, updated_at = ?5
         WHERE id = ?1",
        params![
            organization.id.to_string(),
            organization.name,
            organization.external_id,
            organization.currency,
            timestamp::encode(&organization.updated_at),
        ],
    )
}

fn load_or_not_found(conn: &Connection, id: Uuid) -> StorageResult<Organization> {
    db_load_organization(conn, id)?.ok_or_else(|| StorageError::not_found::<Organization>(id))
}

pub struct OrganizationRepository<'s> {
    session: &'s Session,
}

impl<'s> OrganizationRepository<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }
}

impl Repository for OrganizationRepository<'_> {
    type Entity = Organization;
    type Create = OrganizationCreate;
    type Patch = OrganizationPatch;

    fn create(&self, input: OrganizationCreate) -> StorageResult<Organization> {
        let now = timestamp::now();
        let organization = Organization {
            id: Uuid::new_v4(),
            name: input.name,
            external_id: input.external_id,
            currency: input.currency,
            created_at: now,
            updated_at: now,
        };

        self.session.write(|conn| {
            db_insert_organization(conn, &organization)?;
            load_or_not_found(conn, organization.id)
        })
    }

    fn get(&self, id: Uuid) -> StorageResult<Organization> {
        self.session.read(|conn| load_or_not_found(conn, id))
    }

    fn update(
        &self,
        mut existing: Organization,
        patch: OrganizationPatch,
    ) -> StorageResult<Organization> {
        if patch.is_empty() {
            return Ok(existing);
        }

        patch.apply_to(&mut existing);

        self.session.write(move |conn| {
            // `existing` may predate a concurrent update; step past what is stored now.
            let stored = load_or_not_found(conn, existing.id)?;
            existing.updated_at =
                timestamp::next_after(stored.updated_at.max(existing.updated_at));
            if db_save_organization(conn, &existing)? == 0 {
                return Err(StorageError::not_found::<Organization>(existing.id));
            }
            load_or_not_found(conn, existing.id)
        })
    }

    fn fetch_page(&self, pagination: Pagination) -> StorageResult<Page<Organization>> {
        self.session.read(|conn| {
            Ok(Page {
                total: count_rows(conn, TABLE)?,
                items: db_list_organizations(conn, pagination.limit, pagination.offset)?,
                limit: pagination.limit,
                offset: pagination.offset,
            })
        })
    }
}
