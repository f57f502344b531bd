use rusqlite::params;

use super::Store;

impl Store {
    pub fn add_admin(&self, chat_id: &str, user_id: &str) {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO admins (chat_id, user_id) VALUES (?1, ?2)",
            params![chat_id, user_id],
        )
        .ok();
    }

    pub fn remove_admin(&self, chat_id: &str, user_id: &str) {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM admins WHERE chat_id = ?1 AND user_id = ?2",
            params![chat_id, user_id],
        )
        .ok();
    }

    pub fn is_admin(&self, chat_id: &str, user_id: &str) -> bool {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT 1 FROM admins WHERE chat_id = ?1 AND user_id = ?2",
            params![chat_id, user_id],
            |_| Ok(()),
        )
        .is_ok()
    }

    pub fn list_admins(&self, chat_id: &str) -> Vec<String> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT user_id FROM admins WHERE chat_id = ?1 ORDER BY user_id")
            .expect("valid query");
        stmt.query_map(params![chat_id], |r| r.get(0))
            .expect("valid query")
            .filter_map(Result::ok)
            .collect()
    }

    pub fn count_admins(&self, chat_id: &str) -> i64 {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM admins WHERE chat_id = ?1",
            params![chat_id],
            |r| r.get(0),
        )
        .unwrap_or(0)
    }

    pub fn has_any_admin(&self, chat_id: &str) -> bool {
        self.count_admins(chat_id) > 0
    }
}
