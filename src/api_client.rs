use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};

use crate::token_bucket::TokenBucketLimiter;

/// Outbound call result. Network failures, non-2xx responses, and an `ok:
/// false` payload body are all folded into this instead of propagating as
/// an error to plugin code, matching
/// `original_source/app/services/api_client.py::RubikaClient`'s contract:
/// callers branch on `.ok`, they never catch an exception.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResult {
    pub ok: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl ApiResult {
    fn failure(error: impl Into<String>) -> Self {
        ApiResult {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Retryable outbound HTTP statuses per §4.6/§7: request timeouts, rate
/// limiting, and server errors. Everything else is terminal.
fn is_retryable_status(status: u16) -> bool {
    status == 408 || status == 429 || status >= 500
}

/// Thin wrapper over the outbound messenger HTTP API (§4.6): per-method
/// token-bucket shaping, timeout, and retry with exponential backoff and
/// jitter. The request path (`{base_url}/{token}/{method}`) and the
/// `ok`-field check are ported from
/// `original_source/app/services/api_client.py::RubikaClient`; the HTTP
/// client construction and timeout idiom follow the teacher crate's
/// `webhooks.rs::spawn_dispatcher`.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    limiter: TokenBucketLimiter,
    retry_attempts: u32,
    retry_backoff_seconds: f64,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        token: &str,
        timeout_seconds: u64,
        rate_limit_per_second: f64,
        retry_attempts: u32,
        retry_backoff_seconds: f64,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .expect("failed to build HTTP client");
        ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            limiter: TokenBucketLimiter::new(rate_limit_per_second, rate_limit_per_second),
            retry_attempts,
            retry_backoff_seconds,
        }
    }

    /// Generic passthrough for any method name and payload shape, including
    /// the media/contact/poll/location send variants this crate doesn't
    /// define typed wrappers for.
    ///
    /// Retries (§4.6/§7) apply only to transport failures and the
    /// retryable status set {408, 429, >=500}; any other non-2xx status is
    /// terminal and its body is returned as-is without retrying. An
    /// invalid JSON body is never retried either — it's synthesized into
    /// `{ok:false, error:"invalid_json"}` on whichever attempt produced it
    /// (a successful-status response with a malformed body, or the final
    /// exhausted retry).
    pub async fn call(&self, method: &str, payload: Value) -> ApiResult {
        self.limiter.acquire(method).await;
        let url = format!("{}/{}/{}", self.base_url, self.token, method);

        let mut last_error = String::from("no attempts made");
        for attempt in 0..=self.retry_attempts {
            if attempt > 0 {
                let backoff = self.retry_backoff_seconds * 2f64.powi(attempt as i32 - 1);
                let jitter = rand::rng().random_range(0.0..self.retry_backoff_seconds.max(0.01));
                tokio::time::sleep(Duration::from_secs_f64(backoff + jitter)).await;
            }

            let response = match self.http.post(&url).json(&payload).send().await {
                Ok(resp) => resp,
                Err(err) => {
                    last_error = err.to_string();
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                if is_retryable_status(status.as_u16()) && attempt < self.retry_attempts {
                    last_error = format!("http status {status}");
                    continue;
                }
                // Terminal non-retryable status (or retries exhausted): the
                // body is returned as-is, parsed best-effort.
                return match response.json::<Value>().await {
                    Ok(body) => ApiResult {
                        ok: body.get("ok").and_then(Value::as_bool).unwrap_or(false),
                        data: Some(body),
                        error: Some(format!("http status {status}")),
                    },
                    Err(_) => ApiResult::failure("invalid_json"),
                };
            }

            let body: Value = match response.json().await {
                Ok(body) => body,
                Err(_) => return ApiResult::failure("invalid_json"),
            };

            let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(true);
            if !ok {
                let error = body
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("remote reported ok: false")
                    .to_string();
                return ApiResult {
                    ok: false,
                    data: Some(body),
                    error: Some(error),
                };
            }

            return ApiResult {
                ok: true,
                data: Some(body),
                error: None,
            };
        }

        ApiResult::failure(last_error)
    }

    pub async fn get_me(&self) -> ApiResult {
        self.call("getMe", json!({})).await
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> ApiResult {
        self.call(
            "sendMessage",
            json!({ "chat_id": chat_id, "text": text }),
        )
        .await
    }

    /// Sends a message with an inline keypad attached, used by the panel
    /// plugin's `/panel` reply (§4.10).
    pub async fn send_message_with_inline_keypad(
        &self,
        chat_id: &str,
        text: &str,
        keypad: Value,
    ) -> ApiResult {
        self.call(
            "sendMessage",
            json!({ "chat_id": chat_id, "text": text, "inline_keypad": keypad }),
        )
        .await
    }

    pub async fn delete_message(&self, chat_id: &str, message_id: &str) -> ApiResult {
        self.call(
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: &str,
        message_id: &str,
        text: &str,
    ) -> ApiResult {
        self.call(
            "editMessageText",
            json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
        )
        .await
    }

    pub async fn edit_inline_keypad(
        &self,
        chat_id: &str,
        message_id: &str,
        keypad: Value,
    ) -> ApiResult {
        self.call(
            "editInlineKeypad",
            json!({ "chat_id": chat_id, "message_id": message_id, "inline_keypad": keypad }),
        )
        .await
    }

    pub async fn edit_chat_keypad(&self, chat_id: &str, keypad: Value) -> ApiResult {
        self.call(
            "editChatKeypad",
            json!({ "chat_id": chat_id, "chat_keypad": keypad }),
        )
        .await
    }

    pub async fn ban_chat_member(&self, chat_id: &str, user_id: &str) -> ApiResult {
        self.call(
            "banChatMember",
            json!({ "chat_id": chat_id, "user_id": user_id }),
        )
        .await
    }

    pub async fn unban_chat_member(&self, chat_id: &str, user_id: &str) -> ApiResult {
        self.call(
            "unbanChatMember",
            json!({ "chat_id": chat_id, "user_id": user_id }),
        )
        .await
    }

    pub async fn set_commands(&self, commands: Value) -> ApiResult {
        self.call("setCommands", json!({ "bot_commands": commands }))
            .await
    }

    pub async fn update_bot_endpoints(&self, url: &str, endpoint_type: &str) -> ApiResult {
        self.call(
            "updateBotEndpoints",
            json!({ "url": url, "type": endpoint_type }),
        )
        .await
    }
}
