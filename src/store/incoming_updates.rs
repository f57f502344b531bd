use rusqlite::params;

use crate::models::IncomingUpdate;

use super::Store;

impl Store {
    /// Persists a raw update snapshot (§3, incoming-snapshot plugin).
    /// Exceptions here are swallowed by the caller, not this method, per
    /// `original_source/app/webhook/router.py`'s "best effort" handling.
    pub fn save_incoming_update(&self, update: &IncomingUpdate) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO incoming_updates \
             (job_id, received_at, chat_id, message_id, sender_id, update_type, text, raw_payload) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                update.job_id,
                update.received_at,
                update.chat_id,
                update.message_id,
                update.sender_id,
                update.update_type,
                update.text,
                update.raw_payload,
            ],
        )?;
        Ok(())
    }

    /// Deletes snapshots older than `max_age_seconds`, matching
    /// `original_source/app/db/repository.py::cleanup_incoming_updates`.
    /// `now` is passed in rather than read from the clock, keeping this
    /// function pure and testable.
    pub fn cleanup_incoming_updates(&self, now: f64, max_age_seconds: f64) -> usize {
        let cutoff = now - max_age_seconds;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM incoming_updates WHERE received_at < ?1",
            params![cutoff],
        )
        .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(job_id: &str, received_at: f64) -> IncomingUpdate {
        IncomingUpdate {
            job_id: job_id.to_string(),
            received_at,
            chat_id: Some("chat-1".to_string()),
            message_id: Some("m1".to_string()),
            sender_id: Some("u1".to_string()),
            update_type: Some("message".to_string()),
            text: Some("hello".to_string()),
            raw_payload: None,
        }
    }

    #[test]
    fn cleanup_removes_only_stale_rows() {
        let store = Store::in_memory();
        store.save_incoming_update(&sample("old", 100.0)).unwrap();
        store.save_incoming_update(&sample("new", 1000.0)).unwrap();
        let removed = store.cleanup_incoming_updates(1000.0, 500.0);
        assert_eq!(removed, 1);
    }
}
