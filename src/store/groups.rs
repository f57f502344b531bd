use rusqlite::params;

use crate::models::GroupSettings;

use super::Store;

impl Store {
    /// Read-through fetch: checks the settings cache first, then SQLite,
    /// synthesizing (but not persisting) `GroupSettings::default_for` when
    /// the chat has never been seen, matching
    /// `original_source/app/db/repository.py::get_group`.
    pub fn get_group(&self, chat_id: &str) -> GroupSettings {
        if let Some(cached) = self.group_cache.lock().unwrap().get(chat_id) {
            return cached;
        }
        let conn = self.conn.lock().unwrap();
        let row = conn.query_row(
            "SELECT chat_id, title, anti_link, anti_flood, anti_spam, anti_badwords, \
             anti_forward, flood_limit FROM groups WHERE chat_id = ?1",
            params![chat_id],
            |r| {
                Ok(GroupSettings {
                    chat_id: r.get(0)?,
                    title: r.get(1)?,
                    anti_link: r.get::<_, i64>(2)? != 0,
                    anti_flood: r.get::<_, i64>(3)? != 0,
                    anti_spam: r.get::<_, i64>(4)? != 0,
                    anti_badwords: r.get::<_, i64>(5)? != 0,
                    anti_forward: r.get::<_, i64>(6)? != 0,
                    flood_limit: r.get(7)?,
                })
            },
        );
        drop(conn);
        let settings = row.unwrap_or_else(|_| GroupSettings::default_for(chat_id));
        self.group_cache.lock().unwrap().set(chat_id, settings.clone());
        settings
    }

    /// Inserts the group if absent, or updates `title` when given and
    /// changed; invalidates the cached entry either way so the next read
    /// reflects the write.
    pub fn upsert_group(&self, chat_id: &str, title: Option<&str>) {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO groups (chat_id, title) VALUES (?1, ?2)
             ON CONFLICT(chat_id) DO UPDATE SET
                title = COALESCE(excluded.title, groups.title),
                updated_at = CURRENT_TIMESTAMP",
            params![chat_id, title],
        )
        .ok();
        drop(conn);
        self.group_cache.lock().unwrap().invalidate(chat_id);
    }

    /// Toggles a single boolean moderation flag by name. The column name is
    /// matched against a closed set rather than interpolated into SQL, so a
    /// bad `field` is simply ignored instead of ever reaching the query
    /// string (unlike `original_source/app/db/repository.py::set_group_flag`,
    /// which f-string-interpolates the column name).
    pub fn set_group_flag(&self, chat_id: &str, field: &str, value: bool) {
        let column = match field {
            "anti_link" => "anti_link",
            "anti_flood" => "anti_flood",
            "anti_spam" => "anti_spam",
            "anti_badwords" => "anti_badwords",
            "anti_forward" => "anti_forward",
            _ => return,
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO groups (chat_id, {column}) VALUES (?1, ?2)
                 ON CONFLICT(chat_id) DO UPDATE SET {column} = excluded.{column}, \
                 updated_at = CURRENT_TIMESTAMP"
            ),
            params![chat_id, value as i64],
        )
        .ok();
        drop(conn);
        self.group_cache.lock().unwrap().invalidate(chat_id);
    }

    pub fn set_flood_limit(&self, chat_id: &str, limit: i64) {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO groups (chat_id, flood_limit) VALUES (?1, ?2)
             ON CONFLICT(chat_id) DO UPDATE SET flood_limit = excluded.flood_limit, \
             updated_at = CURRENT_TIMESTAMP",
            params![chat_id, limit],
        )
        .ok();
        drop(conn);
        self.group_cache.lock().unwrap().invalidate(chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_chat_gets_defaults_without_persisting() {
        let store = Store::in_memory();
        let settings = store.get_group("chat-1");
        assert!(settings.anti_link);
        assert!(!settings.anti_flood);
        assert_eq!(settings.flood_limit, 6);
    }

    #[test]
    fn set_group_flag_round_trips_and_invalidates_cache() {
        let store = Store::in_memory();
        store.get_group("chat-1"); // warms cache with defaults
        store.set_group_flag("chat-1", "anti_flood", true);
        let settings = store.get_group("chat-1");
        assert!(settings.anti_flood);
    }

    #[test]
    fn unknown_field_is_ignored() {
        let store = Store::in_memory();
        store.set_group_flag("chat-1", "not_a_real_field", true);
        let settings = store.get_group("chat-1");
        assert!(!settings.anti_flood);
    }

    #[test]
    fn upsert_group_sets_title() {
        let store = Store::in_memory();
        store.upsert_group("chat-1", Some("My Group"));
        let settings = store.get_group("chat-1");
        assert_eq!(settings.title.as_deref(), Some("My Group"));
    }
}
