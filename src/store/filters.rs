use rusqlite::params;

use crate::models::Filter;

use super::Store;

impl Store {
    pub fn add_filter(&self, chat_id: &str, word: &str, is_whitelist: bool, regex_enabled: bool) {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO filters (chat_id, word, is_whitelist, regex_enabled) \
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(chat_id, word) DO UPDATE SET
                is_whitelist = excluded.is_whitelist,
                regex_enabled = excluded.regex_enabled",
            params![chat_id, word, is_whitelist as i64, regex_enabled as i64],
        )
        .ok();
    }

    pub fn remove_filter(&self, chat_id: &str, word: &str) {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM filters WHERE chat_id = ?1 AND word = ?2",
            params![chat_id, word],
        )
        .ok();
    }

    /// Ordered by word, matching
    /// `original_source/app/db/repository.py::list_filters`.
    pub fn list_filters(&self, chat_id: &str) -> Vec<Filter> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT word, is_whitelist, regex_enabled FROM filters \
                 WHERE chat_id = ?1 ORDER BY word",
            )
            .expect("valid query");
        stmt.query_map(params![chat_id], |r| {
            Ok(Filter {
                word: r.get(0)?,
                is_whitelist: r.get::<_, i64>(1)? != 0,
                regex_enabled: r.get::<_, i64>(2)? != 0,
            })
        })
        .expect("valid query")
        .filter_map(Result::ok)
        .collect()
    }
}
