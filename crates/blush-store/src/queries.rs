use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::{AUTH_TOKEN_KEY, Store};

impl Store {
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let value = conn
                .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
                .optional()?;
            Ok(value)
        })
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
                (key, value),
            )?;
            Ok(())
        })
    }

    /// Returns whether a row was removed.
    pub fn delete(&self, key: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
            Ok(n > 0)
        })
    }

    // -- Session token --

    pub fn load_token(&self) -> Result<Option<String>> {
        self.get(AUTH_TOKEN_KEY)
    }

    pub fn save_token(&self, token: &str) -> Result<()> {
        self.set(AUTH_TOKEN_KEY, token)
    }

    pub fn clear_token(&self) -> Result<()> {
        self.delete(AUTH_TOKEN_KEY).map(|_| ())
    }
}
