use crate::{RecordbookError, Result};
use rusqlite::Connection;
use std::path::Path;

const REQUIRED_TABLES: [&str; 2] = ["records", "notified_records"];

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Validate database structure
        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type='table'
             AND name IN (?1, ?2)",
            rusqlite::params![REQUIRED_TABLES[0], REQUIRED_TABLES[1]],
            |row| row.get(0),
        )?;

        if table_count != REQUIRED_TABLES.len() as i64 {
            return Err(RecordbookError::InvalidDatabase(
                "Not a valid Recordbook database".to_string(),
            ));
        }

        Ok(Self { conn })
    }

    /// Throwaway database, used by hosts that only need a session-scoped store.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn table_names(storage: &Storage) -> Vec<String> {
        storage
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_create_storage() {
        let temp = NamedTempFile::new().unwrap();
        let storage = Storage::create(temp.path()).unwrap();

        let tables = table_names(&storage);
        assert!(tables.contains(&"records".to_string()));
        assert!(tables.contains(&"notified_records".to_string()));
    }

    #[test]
    fn test_open_existing_storage() {
        let temp = NamedTempFile::new().unwrap();
        Storage::create(temp.path()).unwrap();

        let storage = Storage::open(temp.path()).unwrap();
        assert!(table_names(&storage).contains(&"records".to_string()));
    }

    #[test]
    fn test_open_invalid_database() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "not a database").unwrap();

        assert!(Storage::open(temp.path()).is_err());
    }

    #[test]
    fn test_open_foreign_sqlite_file() {
        let temp = NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(temp.path()).unwrap();
            conn.execute("CREATE TABLE notes (id TEXT PRIMARY KEY)", []).unwrap();
        }

        let result = Storage::open(temp.path());
        assert!(matches!(result, Err(RecordbookError::InvalidDatabase(_))));
    }

    #[test]
    fn test_in_memory_has_schema() {
        let storage = Storage::in_memory().unwrap();
        assert_eq!(table_names(&storage).len(), 2);
    }
}
