use std::sync::Arc;

use hmac::{Hmac, Mac};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use crate::commands::parse_command;
use crate::message_extract::{
    extract_message, get_button_id, get_chat_id, get_message_id, get_sender_id, get_text,
    get_update_type, value_as_id_string,
};
use crate::models::{Job, Priority, QueueDecision};
use crate::queue::SharedJobQueue;
use crate::rate_limit::IngressRateLimiter;
use crate::stats::Stats;
use crate::time::wall_now;
use crate::worker::WorkerPool;

type HmacSha256 = Hmac<Sha256>;

/// Command tokens that jump the `normal` sub-queue, per §4.11 step 7.
const HIGH_PRIORITY_COMMANDS: &[&str] = &[
    "ban", "unban", "del", "antilink", "filter", "settings", "admins", "setcmd", "panel",
];

/// Substrings that mark a message as link-bearing for priority purposes —
/// a coarser, cheaper check than the anti-link plugin's full regex, since
/// the router only needs to decide queue precedence here, not whether to
/// act on the link.
const LINK_HINTS: &[&str] = &["http", "t.me", "rubika.ir"];

/// Shared wiring every ingress route needs, managed as Rocket state by the
/// lifecycle orchestrator (§4.13).
pub struct RouterState {
    pub queue: SharedJobQueue,
    pub ingress_limiter: IngressRateLimiter,
    pub webhook_secret: Option<String>,
    pub stats: Arc<Stats>,
    pub workers: Arc<WorkerPool>,
}

/// Verifies `X-Rubika-Signature` against `HMAC-SHA256(body, secret)` in
/// constant time via `Mac::verify_slice`, matching the signing idiom the
/// teacher crate uses for outgoing webhook deliveries
/// (`webhooks.rs::deliver_webhooks`) run in reverse.
fn signature_matches(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature_bytes).is_ok()
}

/// Builds a `Job` from a parsed update body, per §3/§4.11 steps 5-7. Ported
/// from `original_source/app/webhook/router.py::_build_job`.
fn build_job(payload: &Value) -> Job {
    let message = extract_message(payload);
    let text = message.and_then(get_text);
    let chat_id = message.and_then(get_chat_id);
    let message_id = message.and_then(get_message_id);
    let sender_id = message.and_then(get_sender_id);
    let update_type = message.and_then(|m| get_update_type(payload, m));
    let button_id = message.and_then(|m| get_button_id(payload, m));

    let job_id = payload
        .get("update_id")
        .and_then(value_as_id_string)
        .or_else(|| payload.get("message_id").and_then(value_as_id_string))
        .or_else(|| message_id.clone())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let dedup_key = match (&chat_id, &message_id) {
        (Some(chat_id), Some(message_id)) => {
            let mut key = format!(
                "{chat_id}:{message_id}:{}",
                update_type.as_deref().unwrap_or("")
            );
            if let Some(button_id) = &button_id {
                key.push(':');
                key.push_str(button_id);
            }
            Some(key)
        }
        _ => Some(job_id.clone()),
    };

    let priority = classify_priority(text.as_deref());

    Job {
        job_id,
        received_at: wall_now(),
        chat_id,
        message_id,
        sender_id,
        update_type,
        text,
        button_id,
        raw_payload: payload.clone(),
        dedup_key,
        priority,
    }
}

/// §4.11 step 7: a leading admin-style command token, or a link hint
/// anywhere in the text, bumps a job to `high` priority.
fn classify_priority(text: Option<&str>) -> Priority {
    let Some(text) = text else {
        return Priority::Normal;
    };
    if let Some((name, _)) = parse_command(text) {
        if HIGH_PRIORITY_COMMANDS.contains(&name.as_str()) {
            return Priority::High;
        }
    }
    let lower = text.to_lowercase();
    if LINK_HINTS.iter().any(|hint| lower.contains(hint)) {
        return Priority::High;
    }
    Priority::Normal
}

fn decision_status(decision: QueueDecision) -> Status {
    match decision {
        QueueDecision::Enqueued | QueueDecision::Duplicate => Status::Ok,
        QueueDecision::Dropped => Status::ServiceUnavailable,
    }
}

/// Shared pipeline for both ingress endpoints (§4.11): signature check,
/// ingress rate limit, JSON parse, classify, enqueue.
async fn ingest(
    state: &RouterState,
    body: &str,
    signature: Option<&str>,
) -> (Status, Json<Value>) {
    if let Some(secret) = &state.webhook_secret {
        let ok = signature
            .map(|sig| signature_matches(secret, body.as_bytes(), sig))
            .unwrap_or(false);
        if !ok {
            return (Status::Unauthorized, Json(json!({"error": "invalid_signature"})));
        }
    }

    if !state.ingress_limiter.allow() {
        return (Status::TooManyRequests, Json(json!({"error": "rate_limited"})));
    }

    let payload: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return (Status::BadRequest, Json(json!({"error": "invalid_json"}))),
    };

    let job = build_job(&payload);
    let decision = state.queue.enqueue(job).await;
    let status = decision_status(decision);
    (status, Json(json!({"status": format!("{decision:?}").to_lowercase()})))
}

#[post("/receiveUpdate", data = "<body>")]
pub async fn receive_update(
    state: &State<RouterState>,
    body: String,
    signature: Option<SignatureHeader>,
) -> (Status, Json<Value>) {
    ingest(state, &body, signature.map(|s| s.0).as_deref()).await
}

#[post("/receiveInlineMessage", data = "<body>")]
pub async fn receive_inline_message(
    state: &State<RouterState>,
    body: String,
    signature: Option<SignatureHeader>,
) -> (Status, Json<Value>) {
    ingest(state, &body, signature.map(|s| s.0).as_deref()).await
}

/// Request guard pulling `X-Rubika-Signature` out of the headers, matching
/// the teacher crate's header-extraction guards in `routes/mod.rs`.
pub struct SignatureHeader(pub String);

#[rocket::async_trait]
impl<'r> rocket::request::FromRequest<'r> for SignatureHeader {
    type Error = ();

    async fn from_request(
        req: &'r rocket::request::Request<'_>,
    ) -> rocket::request::Outcome<Self, Self::Error> {
        match req.headers().get_one("X-Rubika-Signature") {
            Some(sig) => rocket::request::Outcome::Success(SignatureHeader(sig.to_string())),
            None => rocket::request::Outcome::Forward(Status::Unauthorized),
        }
    }
}

#[get("/health")]
pub fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<Value> {
    Json(json!({ "error": "not_found" }))
}

#[rocket::catch(429)]
pub fn too_many_requests() -> Json<Value> {
    Json(json!({ "error": "rate_limited" }))
}

/// Queue, worker, and stats snapshot for operators (§6, §4.13).
#[get("/health/queue")]
pub async fn health_queue(state: &State<RouterState>) -> Json<Value> {
    let (high_size, normal_size) = state.queue.sizes().await;
    let snapshot = state.stats.snapshot();
    Json(json!({
        "queue": {
            "size": high_size + normal_size,
            "high_size": high_size,
            "normal_size": normal_size,
            "max_size": state.queue.max_size(),
            "total_enqueued": snapshot.total_enqueued,
            "total_dropped": snapshot.total_dropped,
            "total_deduped": snapshot.total_deduped,
        },
        "workers": state.workers.statuses(),
        "stats": {
            "total_updates": snapshot.total_updates,
            "total_errors": snapshot.total_errors,
            "avg_dispatch_ms": snapshot.avg_dispatch_ms,
            "last_dispatch_ms": snapshot.last_dispatch_ms,
            "uptime_seconds": snapshot.uptime_seconds,
        },
    }))
}

/// Empties both sub-queues without dispatching the dropped jobs (§4.7, §6).
#[post("/health/queue/drain")]
pub async fn drain_queue(state: &State<RouterState>) -> Json<Value> {
    let (high_before, normal_before) = state.queue.sizes().await;
    state.queue.drain().await;
    Json(json!({ "drained": { "high": high_before, "normal": normal_before } }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_priority_flags_admin_commands_as_high() {
        assert_eq!(classify_priority(Some("/ban u1")), Priority::High);
        assert_eq!(classify_priority(Some("/ping")), Priority::Normal);
    }

    #[test]
    fn classify_priority_flags_link_hints_as_high() {
        assert_eq!(classify_priority(Some("check https://example.com")), Priority::High);
        assert_eq!(classify_priority(Some("join t.me/chan")), Priority::High);
        assert_eq!(classify_priority(Some("hello there")), Priority::Normal);
    }

    #[test]
    fn classify_priority_defaults_normal_with_no_text() {
        assert_eq!(classify_priority(None), Priority::Normal);
    }

    #[test]
    fn dedup_key_combines_chat_message_and_type() {
        let payload = json!({
            "message": {
                "message_id": "m1",
                "chat": { "id": "c1", "type": "group" },
                "text": "hi"
            }
        });
        let job = build_job(&payload);
        assert_eq!(job.dedup_key.as_deref(), Some("c1:m1:group"));
    }

    #[test]
    fn dedup_key_falls_back_to_job_id_without_chat_or_message() {
        let payload = json!({ "update_id": "u1" });
        let job = build_job(&payload);
        assert_eq!(job.job_id, "u1");
        assert_eq!(job.dedup_key.as_deref(), Some("u1"));
    }

    #[test]
    fn numeric_update_id_is_stringified_not_dropped() {
        let payload = json!({ "update_id": 42 });
        let first = build_job(&payload);
        let second = build_job(&payload);
        assert_eq!(first.job_id, "42");
        assert_eq!(first.dedup_key, second.dedup_key);
    }

    #[test]
    fn signature_matches_round_trips_with_hmac_crate() {
        let secret = "s3cret";
        let body = b"{\"a\":1}";
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let digest = hex::encode(mac.finalize().into_bytes());
        assert!(signature_matches(secret, body, &digest));
        assert!(!signature_matches(secret, body, "00"));
    }
}
