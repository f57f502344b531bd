use rusqlite::params;

use super::Store;

impl Store {
    pub fn save_message(
        &self,
        chat_id: &str,
        message_id: &str,
        sender_id: Option<&str>,
        text: Option<&str>,
    ) {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO messages (chat_id, message_id, sender_id, text) \
             VALUES (?1, ?2, ?3, ?4)",
            params![chat_id, message_id, sender_id, text],
        )
        .ok();
    }

    /// Batched insert used by the commands plugin's `/del` handler and any
    /// bulk import path; mirrors
    /// `original_source/app/db/repository.py::bulk_insert_messages`.
    pub fn bulk_insert_messages(
        &self,
        chat_id: &str,
        messages: &[(String, Option<String>, Option<String>)],
    ) {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().expect("transaction start");
        for (message_id, sender_id, text) in messages {
            tx.execute(
                "INSERT INTO messages (chat_id, message_id, sender_id, text) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![chat_id, message_id, sender_id, text],
            )
            .ok();
        }
        tx.commit().ok();
    }

    /// Most recent `limit` message ids for a chat, newest first, matching
    /// `original_source/app/db/repository.py::fetch_recent_message_ids`.
    pub fn fetch_recent_message_ids(&self, chat_id: &str, limit: i64) -> Vec<String> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT message_id FROM messages WHERE chat_id = ?1 \
                 ORDER BY id DESC LIMIT ?2",
            )
            .expect("valid query");
        stmt.query_map(params![chat_id, limit], |r| r.get(0))
            .expect("valid query")
            .filter_map(Result::ok)
            .collect()
    }

    /// Keeps only the newest `keep` rows for one chat, returning the number
    /// of rows removed.
    fn trim_messages_for_chat(&self, chat_id: &str, keep: i64) -> usize {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM messages WHERE chat_id = ?1 AND id NOT IN (
                SELECT id FROM messages WHERE chat_id = ?1 ORDER BY id DESC LIMIT ?2
             )",
            params![chat_id, keep],
        )
        .unwrap_or(0)
    }

    /// Trims every chat's message history down to `limit_per_chat` newest
    /// rows, returning the total number of rows removed. Ported from
    /// `original_source/app/db/repository.py::trim_messages_per_chat`,
    /// which iterates `SELECT DISTINCT chat_id` and trims each in turn;
    /// driven by the janitor on its retention tick (§4.12).
    pub fn trim_messages_per_chat(&self, limit_per_chat: i64) -> usize {
        let chat_ids: Vec<String> = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn
                .prepare("SELECT DISTINCT chat_id FROM messages")
                .expect("valid query");
            stmt.query_map([], |r| r.get(0))
                .expect("valid query")
                .filter_map(Result::ok)
                .collect()
        };
        chat_ids
            .iter()
            .map(|chat_id| self.trim_messages_for_chat(chat_id, limit_per_chat))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_recent_message_ids_is_newest_first() {
        let store = Store::in_memory();
        store.save_message("chat-1", "m1", Some("u1"), Some("hi"));
        store.save_message("chat-1", "m2", Some("u1"), Some("there"));
        let ids = store.fetch_recent_message_ids("chat-1", 10);
        assert_eq!(ids, vec!["m2", "m1"]);
    }

    #[test]
    fn trim_keeps_only_newest_rows_per_chat() {
        let store = Store::in_memory();
        for i in 0..5 {
            store.save_message("chat-1", &format!("m{i}"), None, None);
        }
        let removed = store.trim_messages_per_chat(2);
        assert_eq!(removed, 3);
        let ids = store.fetch_recent_message_ids("chat-1", 10);
        assert_eq!(ids, vec!["m4", "m3"]);
    }

    #[test]
    fn trim_sweeps_every_chat_independently() {
        let store = Store::in_memory();
        for i in 0..3 {
            store.save_message("chat-1", &format!("a{i}"), None, None);
        }
        for i in 0..3 {
            store.save_message("chat-2", &format!("b{i}"), None, None);
        }
        let removed = store.trim_messages_per_chat(1);
        assert_eq!(removed, 4);
        assert_eq!(store.fetch_recent_message_ids("chat-1", 10), vec!["a2"]);
        assert_eq!(store.fetch_recent_message_ids("chat-2", 10), vec!["b2"]);
    }

    #[test]
    fn bulk_insert_inserts_all_rows() {
        let store = Store::in_memory();
        let batch = vec![
            ("a".to_string(), Some("u1".to_string()), None),
            ("b".to_string(), Some("u2".to_string()), None),
        ];
        store.bulk_insert_messages("chat-1", &batch);
        assert_eq!(store.fetch_recent_message_ids("chat-1", 10).len(), 2);
    }
}
