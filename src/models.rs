use serde::{Deserialize, Serialize};

/// A queued unit of work, immutable after construction (§3). Priority and
/// dedup key are assigned once, at ingress, by `router::classify`.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub job_id: String,
    pub received_at: f64,
    pub chat_id: Option<String>,
    pub message_id: Option<String>,
    pub sender_id: Option<String>,
    pub update_type: Option<String>,
    pub text: Option<String>,
    pub button_id: Option<String>,
    pub raw_payload: serde_json::Value,
    pub dedup_key: Option<String>,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Normal,
}

/// Per-chat moderation settings (§3). Defaults on first read: `anti_link`
/// on, everything else off, `flood_limit = 6` — matching
/// `original_source/app/db/repository.py::get_group`.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSettings {
    pub chat_id: String,
    pub title: Option<String>,
    pub anti_link: bool,
    pub anti_flood: bool,
    pub anti_spam: bool,
    pub anti_badwords: bool,
    pub anti_forward: bool,
    pub flood_limit: i64,
}

impl GroupSettings {
    pub fn default_for(chat_id: &str) -> Self {
        GroupSettings {
            chat_id: chat_id.to_string(),
            title: None,
            anti_link: true,
            anti_flood: false,
            anti_spam: false,
            anti_badwords: false,
            anti_forward: false,
            flood_limit: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Filter {
    pub word: String,
    pub is_whitelist: bool,
    pub regex_enabled: bool,
}

/// Per-job snapshot persisted by the incoming-snapshot plugin (§3).
#[derive(Debug, Clone)]
pub struct IncomingUpdate {
    pub job_id: String,
    pub received_at: f64,
    pub chat_id: Option<String>,
    pub message_id: Option<String>,
    pub sender_id: Option<String>,
    pub update_type: Option<String>,
    pub text: Option<String>,
    pub raw_payload: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueueDecision {
    Enqueued,
    Duplicate,
    Dropped,
}
