use std::env;

/// Process-wide configuration, read once at startup from `RUBIKA_*` environment
/// variables. Mirrors the teacher crate's env-driven config structs
/// (`rate_limit.rs::RateLimitConfig::from_env`) but collects every knob the
/// core needs in one place, the way `original_source/app/config.py` does.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub owner_id: Option<String>,
    pub webhook_secret: Option<String>,
    pub db_url: String,
    pub api_base_url: String,
    pub api_timeout_seconds: u64,
    pub api_retry_attempts: u32,
    pub api_retry_backoff_seconds: f64,
    pub api_rate_limit_per_second: f64,
    pub webhook_base_url: Option<String>,
    pub worker_concurrency: usize,
    pub queue_max_size: usize,
    pub queue_full_policy: QueueFullPolicy,
    pub rate_limit_per_minute: usize,
    pub dedup_ttl_seconds: u64,
    pub settings_cache_ttl_seconds: u64,
    pub settings_cache_size: usize,
    pub incoming_updates_enabled: bool,
    pub incoming_updates_store_raw: bool,
    pub incoming_updates_retention_hours: u64,
    pub messages_keep_per_chat: i64,
    pub register_webhook: bool,
    pub report_anti_actions: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueFullPolicy {
    Reject,
    DropOldest,
}

impl QueueFullPolicy {
    fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "drop_oldest" => QueueFullPolicy::DropOldest,
            _ => QueueFullPolicy::Reject,
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"),
        Err(_) => default,
    }
}

impl Config {
    /// Build configuration from the environment. Panics if `RUBIKA_BOT_TOKEN`
    /// is missing — a required config value missing is a startup failure
    /// per the error handling design (§7 "Config missing required value").
    pub fn from_env() -> Self {
        let bot_token = env::var("RUBIKA_BOT_TOKEN")
            .expect("RUBIKA_BOT_TOKEN is required to start the bot core");

        Config {
            bot_token,
            owner_id: env_opt_string("RUBIKA_OWNER_ID"),
            webhook_secret: env_opt_string("RUBIKA_WEBHOOK_SECRET"),
            db_url: env_string("RUBIKA_DB_URL", "sqlite:///data/bot.db"),
            api_base_url: env_string("RUBIKA_API_BASE_URL", "https://botapi.rubika.ir/v3"),
            api_timeout_seconds: env_parsed("RUBIKA_API_TIMEOUT_SECONDS", 10),
            api_retry_attempts: env_parsed("RUBIKA_API_RETRY_ATTEMPTS", 3),
            api_retry_backoff_seconds: env_parsed("RUBIKA_API_RETRY_BACKOFF", 0.5),
            api_rate_limit_per_second: env_parsed("RUBIKA_API_RATE_LIMIT_PER_SECOND", 20.0),
            webhook_base_url: env_opt_string("RUBIKA_WEBHOOK_BASE_URL"),
            worker_concurrency: env_parsed("RUBIKA_WORKER_CONCURRENCY", 4),
            queue_max_size: env_parsed("RUBIKA_QUEUE_MAX_SIZE", 1000),
            queue_full_policy: QueueFullPolicy::parse(&env_string(
                "RUBIKA_QUEUE_FULL_POLICY",
                "reject",
            )),
            rate_limit_per_minute: env_parsed("RUBIKA_RATE_LIMIT_PER_MINUTE", 120),
            dedup_ttl_seconds: env_parsed("RUBIKA_DEDUP_TTL_SECONDS", 120),
            settings_cache_ttl_seconds: env_parsed("RUBIKA_SETTINGS_CACHE_TTL_SECONDS", 90),
            settings_cache_size: env_parsed("RUBIKA_SETTINGS_CACHE_SIZE", 1024),
            incoming_updates_enabled: env_bool("RUBIKA_INCOMING_UPDATES_ENABLED", true),
            incoming_updates_store_raw: env_bool("RUBIKA_INCOMING_UPDATES_STORE_RAW", false),
            incoming_updates_retention_hours: env_parsed(
                "RUBIKA_INCOMING_UPDATES_RETENTION_HOURS",
                48,
            ),
            messages_keep_per_chat: env_parsed("RUBIKA_MESSAGES_KEEP_PER_CHAT", 10_000),
            register_webhook: env_bool("RUBIKA_REGISTER_WEBHOOK", true),
            report_anti_actions: env_bool("RUBIKA_REPORT_ANTI_ACTIONS", true),
        }
    }

    /// Strip a `sqlite:///` prefix if present, matching
    /// `original_source/app/main.py::_resolve_db_path`.
    pub fn resolve_db_path(&self) -> String {
        self.db_url
            .strip_prefix("sqlite:///")
            .map(str::to_string)
            .unwrap_or_else(|| self.db_url.clone())
    }
}
