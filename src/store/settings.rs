use rusqlite::params;

use super::Store;

impl Store {
    /// Upsert of a single global key/value string setting, matching
    /// `original_source/app/db/repository.py::set_setting`.
    pub fn set_setting(&self, key: &str, value: &str) {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
             updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )
        .ok();
    }

    pub fn get_setting(&self, key: &str) -> Option<String> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |r| r.get(0),
        )
        .ok()
    }
}
