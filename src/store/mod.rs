//! Persistent store — schema, migrations, and repository operations (§4.4).
//!
//! Module decomposition mirrors the teacher crate's `src/routes/` split:
//! shared state (`Store`, migrations, pragmas) lives here; operations for
//! each entity live in their own submodule, all as inherent `impl Store`
//! blocks over the one type defined in this file.

mod admins;
mod filters;
mod groups;
mod incoming_updates;
mod messages;
mod settings;

use std::sync::Mutex;

use rusqlite::Connection;

use crate::cache::LruTtlCache;
use crate::models::GroupSettings;

const SCHEMA_VERSION: i64 = 1;

pub struct Store {
    conn: Mutex<Connection>,
    group_cache: Mutex<LruTtlCache<GroupSettings>>,
}

impl Store {
    /// Opens (or creates) the database at `path`, applies session pragmas,
    /// runs migrations idempotently, and wires up the read-through settings
    /// cache (§4.3/§4.4).
    pub fn new(path: &str, cache_size: usize, cache_ttl_seconds: u64) -> Self {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path).expect("failed to open database");
        apply_pragmas(&conn);
        migrate(&conn);
        Store {
            conn: Mutex::new(conn),
            group_cache: Mutex::new(LruTtlCache::new(cache_size, cache_ttl_seconds)),
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        let conn = Connection::open_in_memory().expect("failed to open in-memory database");
        apply_pragmas(&conn);
        migrate(&conn);
        Store {
            conn: Mutex::new(conn),
            group_cache: Mutex::new(LruTtlCache::new(1024, 90)),
        }
    }
}

/// Session pragmas applied once at connection open, per §4.4: WAL journal
/// mode, NORMAL synchronous, in-memory temp store, ~20MB page cache, 3000ms
/// busy timeout, foreign keys on.
fn apply_pragmas(conn: &Connection) {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         PRAGMA temp_store=MEMORY;
         PRAGMA cache_size=-20000;
         PRAGMA busy_timeout=3000;
         PRAGMA foreign_keys=ON;",
    )
    .expect("failed to apply session pragmas");
}

/// Idempotent schema migration from the recorded `schema_version` to
/// `SCHEMA_VERSION`, creating missing tables/indexes with `IF NOT EXISTS`
/// (§4.4, §6, §8 scenario 6). Ported from
/// `original_source/app/db/migrations.py::ensure_schema`.
fn migrate(conn: &Connection) {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);

         CREATE TABLE IF NOT EXISTS groups (
             chat_id TEXT PRIMARY KEY,
             title TEXT,
             anti_link INTEGER NOT NULL DEFAULT 1,
             anti_flood INTEGER NOT NULL DEFAULT 0,
             anti_spam INTEGER NOT NULL DEFAULT 0,
             anti_badwords INTEGER NOT NULL DEFAULT 0,
             anti_forward INTEGER NOT NULL DEFAULT 0,
             flood_limit INTEGER NOT NULL DEFAULT 6,
             created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
             updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
         );

         CREATE TABLE IF NOT EXISTS admins (
             chat_id TEXT NOT NULL,
             user_id TEXT NOT NULL,
             role TEXT NOT NULL DEFAULT 'admin',
             PRIMARY KEY (chat_id, user_id)
         );

         CREATE TABLE IF NOT EXISTS filters (
             chat_id TEXT NOT NULL,
             word TEXT NOT NULL,
             is_whitelist INTEGER NOT NULL DEFAULT 0,
             regex_enabled INTEGER NOT NULL DEFAULT 0,
             created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
             PRIMARY KEY (chat_id, word)
         );

         CREATE TABLE IF NOT EXISTS messages (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             chat_id TEXT NOT NULL,
             message_id TEXT NOT NULL,
             sender_id TEXT,
             text TEXT,
             created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
         );
         CREATE INDEX IF NOT EXISTS idx_messages_chat_created ON messages (chat_id, id DESC);

         CREATE TABLE IF NOT EXISTS anti_state (
             chat_id TEXT NOT NULL,
             key TEXT NOT NULL,
             value TEXT NOT NULL,
             updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
             PRIMARY KEY (chat_id, key)
         );

         CREATE TABLE IF NOT EXISTS settings (
             key TEXT PRIMARY KEY,
             value TEXT NOT NULL,
             updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
         );

         CREATE TABLE IF NOT EXISTS incoming_updates (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             job_id TEXT NOT NULL,
             received_at REAL NOT NULL,
             chat_id TEXT,
             message_id TEXT,
             sender_id TEXT,
             update_type TEXT,
             text TEXT,
             raw_payload TEXT,
             created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
         );
         CREATE INDEX IF NOT EXISTS idx_incoming_updates_job ON incoming_updates (job_id);",
    )
    .expect("failed to run schema migrations");

    let current: Option<i64> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |r| {
            r.get(0)
        })
        .ok();
    match current {
        None => {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .ok();
        }
        Some(v) if v < SCHEMA_VERSION => {
            // No forward migrations beyond the initial schema yet; bump the
            // recorded version so future additions have somewhere to start.
            conn.execute("UPDATE schema_version SET version = ?1", [SCHEMA_VERSION])
                .ok();
        }
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_is_idempotent_and_sets_target_version() {
        let store = Store::in_memory();
        let conn = store.conn.lock().unwrap();
        let version: i64 = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
        // Running migrate() again must not error or duplicate the row.
        drop(conn);
        let conn = store.conn.lock().unwrap();
        migrate(&conn);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
