use crate::errors::{AppError, AppResult};
use crate::storage::KeyValueStorage;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("schema.sql");

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

impl KeyValueStorage for Database {
    fn read(&self, key: &str) -> AppResult<Option<String>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let raw = conn
            .query_row(
                "SELECT value_json FROM settings WHERE key = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(raw)
    }

    fn write(&self, key: &str, value: &str) -> AppResult<()> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO settings (key, value_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Database;
    use crate::storage::KeyValueStorage;

    #[test]
    fn database_can_write_and_read_value() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("test.db");
        let db = Database::new(&db_path).expect("db");

        assert_eq!(db.read("kpis").expect("read"), None);
        db.write("kpis", "{\"teamSize\":3}").expect("write");
        db.write("kpis", "{\"teamSize\":4}").expect("upsert");
        assert_eq!(db.read("kpis").expect("read").as_deref(), Some("{\"teamSize\":4}"));
    }

    #[test]
    fn values_survive_reopening_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("nested").join("test.db");
        {
            let db = Database::new(&db_path).expect("db");
            db.write("kpis", "{}").expect("write");
        }

        let reopened = Database::new(&db_path).expect("reopen");
        assert_eq!(reopened.read("kpis").expect("read").as_deref(), Some("{}"));
        assert_eq!(reopened.path(), db_path.as_path());
    }

    #[test]
    fn remove_deletes_only_the_given_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");
        db.write("a", "1").expect("write a");
        db.write("b", "2").expect("write b");

        db.remove("a").expect("remove");
        assert_eq!(db.read("a").expect("read a"), None);
        assert_eq!(db.read("b").expect("read b").as_deref(), Some("2"));
    }
}
