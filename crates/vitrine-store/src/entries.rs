use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Insert or overwrite a key/value entry.
    pub fn put_entry(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_entry(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Remove an entry. Returns `true` if a row was deleted.
    pub fn delete_entry(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    /// All stored keys, sorted.
    pub fn list_keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT key FROM kv_entries ORDER BY key ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    fn open() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("kv.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn put_overwrites_existing_value() {
        let (_dir, db) = open();
        db.put_entry("authToken", "a").unwrap();
        db.put_entry("authToken", "b").unwrap();

        assert_eq!(db.get_entry("authToken").unwrap().as_deref(), Some("b"));
        assert_eq!(db.list_keys().unwrap(), vec!["authToken".to_string()]);
    }

    #[test]
    fn missing_entry_is_none() {
        let (_dir, db) = open();
        assert_eq!(db.get_entry("nope").unwrap(), None);
        assert!(!db.delete_entry("nope").unwrap());
    }
}
