//! SQLite-backed key-value slots.
//!
//! # Invariants
//! - One row per key in `local_storage`.
//! - Writes are single upsert statements, so a value is never half-written.

use super::{KeyValueStorage, StorageError, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Key-value storage over a migrated SQLite connection.
pub struct SqliteKeyValueStorage<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKeyValueStorage<'conn> {
    /// Constructs storage from a migrated/ready connection.
    ///
    /// # Errors
    /// - Returns schema errors when `local_storage` or its columns are absent.
    pub fn try_new(conn: &'conn Connection) -> StorageResult<Self> {
        ensure_storage_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl KeyValueStorage for SqliteKeyValueStorage<'_> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO local_storage (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1;", [key])?;
        Ok(())
    }
}

fn ensure_storage_connection_ready(conn: &Connection) -> StorageResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'local_storage'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(StorageError::MissingRequiredTable("local_storage"));
    }

    let mut stmt = conn.prepare("PRAGMA table_info(local_storage);")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    for column in ["key", "value"] {
        if !columns.iter().any(|current| current == column) {
            return Err(StorageError::MissingRequiredColumn {
                table: "local_storage",
                column,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SqliteKeyValueStorage;
    use crate::db::open_db_in_memory;
    use crate::storage::{KeyValueStorage, StorageError};
    use rusqlite::Connection;

    #[test]
    fn set_get_and_remove_round_trip() {
        let conn = open_db_in_memory().unwrap();
        let storage = SqliteKeyValueStorage::try_new(&conn).unwrap();

        assert_eq!(storage.get_item("notes").unwrap(), None);
        storage.set_item("notes", "[]").unwrap();
        storage.set_item("notes", "[1]").unwrap();
        assert_eq!(storage.get_item("notes").unwrap().as_deref(), Some("[1]"));

        storage.remove_item("notes").unwrap();
        storage.remove_item("notes").unwrap();
        assert_eq!(storage.get_item("notes").unwrap(), None);
    }

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteKeyValueStorage::try_new(&conn).err().unwrap();
        assert!(matches!(err, StorageError::MissingRequiredTable("local_storage")));
        assert_eq!(err.code(), "storage_schema_invalid");
    }

    #[test]
    fn sqlite_failures_carry_db_code() {
        let conn = open_db_in_memory().unwrap();
        let storage = SqliteKeyValueStorage::try_new(&conn).unwrap();
        conn.execute_batch("DROP TABLE local_storage;").unwrap();

        let err = storage.set_item("notes", "[]").unwrap_err();
        assert!(matches!(err, StorageError::Db(_)));
        assert_eq!(err.code(), "storage_db_failed");
        assert!(err.to_string().starts_with("local storage database error"));
    }
}
