use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use super::{StorageError, StorageResult};

const DB_SCHEMA_VERSION: i64 = 1;
const DB_FILE_NAME: &str = "ops.sqlite";

const SCHEMA_V1: &str = r#"
    CREATE TABLE entitlements (
        id TEXT PRIMARY KEY NOT NULL,
        sponsor_name TEXT NOT NULL CHECK (length(sponsor_name) <= 255),
        sponsor_external_id TEXT NOT NULL CHECK (length(sponsor_external_id) <= 255),
        sponsor_container_id TEXT NOT NULL CHECK (length(sponsor_container_id) <= 255),
        activated_at TEXT,
        soft_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX entitlements_soft_deleted_idx ON entitlements(soft_deleted);

    CREATE TABLE organizations (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL CHECK (length(name) <= 255),
        external_id TEXT NOT NULL CHECK (length(external_id) <= 255),
        currency TEXT CHECK (currency IS NULL OR length(currency) = 3),
        soft_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX organizations_soft_deleted_idx ON organizations(soft_deleted);
"#;

/// Location of the SQLite database and the entry point for opening sessions.
#[derive(Clone, Debug)]
pub struct SqliteStorage {
    path: PathBuf,
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Storage backed by the default database file inside `data_dir`.
    pub fn in_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::new(data_dir.as_ref().join(DB_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the database file and its WAL side files.
    pub fn reset_all(&self) -> StorageResult<()> {
        for path in [
            self.path.clone(),
            side_file(&self.path, "-wal"),
            side_file(&self.path, "-shm"),
        ] {
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Create the database if needed and bring its schema up to date.
    pub fn init(&self) -> StorageResult<()> {
        let conn = self.open()?;
        migrate(&conn)
    }

    /// Open a session for one unit of work.
    pub fn session(&self) -> StorageResult<Session> {
        Ok(Session { conn: self.open()? })
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(Duration::from_millis(500))?;
        Ok(conn)
    }
}

fn side_file(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn migrate(conn: &Connection) -> StorageResult<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version == DB_SCHEMA_VERSION {
        return Ok(());
    }

    if version == 0 {
        log::info!(
            "SQLite schema migration: {} -> {}",
            version,
            DB_SCHEMA_VERSION
        );
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
        return Ok(());
    }

    Err(StorageError::SchemaMismatch {
        found: version,
        expected: DB_SCHEMA_VERSION,
    })
}

/// A database connection owned by a single request.
///
/// Every unit of work runs inside its own transaction. Returning an error
/// from the closure drops the transaction, which rolls it back.
pub struct Session {
    conn: Connection,
}

impl Session {
    pub fn read<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        self.in_transaction(TransactionBehavior::Deferred, f)
    }

    pub fn write<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        self.in_transaction(TransactionBehavior::Immediate, f)
    }

    fn in_transaction<T, F>(&self, behavior: TransactionBehavior, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        let tx = Transaction::new_unchecked(&self.conn, behavior)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::OptionalExtension;
    use tempfile::TempDir;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
            [name],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .unwrap()
        .is_some()
    }

    #[test]
    fn sqlite_init_initializes_schema() {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::in_dir(dir.path());
        storage.init().unwrap();

        assert!(storage.path().exists());

        let conn = Connection::open(storage.path()).unwrap();
        assert!(table_exists(&conn, "entitlements"));
        assert!(table_exists(&conn, "organizations"));

        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, DB_SCHEMA_VERSION);
    }

    #[test]
    fn sqlite_init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::in_dir(dir.path());
        storage.init().unwrap();
        storage.init().unwrap();
    }

    #[test]
    fn sqlite_fails_on_mismatched_schema_version() {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::in_dir(dir.path());

        let conn = Connection::open(storage.path()).unwrap();
        conn.execute_batch("PRAGMA user_version = 999;").unwrap();

        let err = storage
            .init()
            .expect_err("init should fail on version mismatch");
        let msg = format!("{err}");
        assert!(msg.contains("database schema version mismatch"));
        assert!(msg.contains("--reset"));
    }

    #[test]
    fn sqlite_reset_all_ok_when_missing() {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::in_dir(dir.path());
        storage.reset_all().unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn sqlite_reset_all_removes_existing_database() {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::in_dir(dir.path());
        storage.init().unwrap();
        assert!(storage.path().exists());

        storage.reset_all().unwrap();
        assert!(!storage.path().exists());
        assert!(!side_file(storage.path(), "-wal").exists());
    }

    #[test]
    fn session_write_rolls_back_on_error() {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::in_dir(dir.path());
        storage.init().unwrap();
        let session = storage.session().unwrap();

        let res: StorageResult<()> = session.write(|conn| {
            conn.execute(
                "INSERT INTO organizations (id, name, external_id, created_at, updated_at)
                 VALUES ('x', 'n', 'e', 't', 't')",
                [],
            )?;
            Err(StorageError::SchemaMismatch {
                found: 0,
                expected: 0,
            })
        });
        assert!(res.is_err());

        let count: i64 = session
            .read(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM organizations", [], |row| {
                    row.get(0)
                })?)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn session_write_commits_on_success() {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::in_dir(dir.path());
        storage.init().unwrap();

        storage
            .session()
            .unwrap()
            .write(|conn| {
                conn.execute(
                    "INSERT INTO organizations (id, name, external_id, created_at, updated_at)
                     VALUES ('x', 'n', 'e', 't', 't')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        let conn = Connection::open(storage.path()).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM organizations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
