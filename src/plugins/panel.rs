use serde_json::json;

use crate::models::Job;

use super::{Plugin, PluginContext, PluginFuture};

/// Renders an inline moderation keypad on `/panel` and handles its
/// `panel:<flag>` callback-query taps by toggling the corresponding group
/// setting and refreshing the keypad in place. A callback's tapped-button
/// payload arrives as `job.button_id` (the router extracts `callback_query.data`
/// there, not into `job.text` — §4.11 step 5), so the callback branch reads
/// `button_id` and only the `/panel` command branch reads `job.text`. Ported
/// from `original_source/app/services/plugins/panel.py::PanelPlugin`. Runs
/// last in the chain since it only reacts to traffic the commands plugin
/// doesn't already own.
pub struct PanelPlugin;

const TOGGLEABLE_FLAGS: &[&str] = &[
    "anti_link",
    "anti_flood",
    "anti_spam",
    "anti_badwords",
    "anti_forward",
];

impl Plugin for PanelPlugin {
    fn name(&self) -> &'static str {
        "panel"
    }

    fn handle<'a>(&'a self, ctx: &'a PluginContext, job: &'a Job) -> PluginFuture<'a> {
        Box::pin(async move {
            let Some(chat_id) = job.chat_id.as_deref() else {
                return Ok(false);
            };

            let is_callback = job.update_type.as_deref() == Some("callback_query");

            if is_callback {
                let Some(data) = job.button_id.as_deref() else {
                    return Ok(false);
                };
                let Some(flag) = data.strip_prefix("panel:") else {
                    return Ok(false);
                };
                if flag == "filter" || flag == "delete" {
                    if let Some(message_id) = job.message_id.as_deref() {
                        let help = if flag == "filter" {
                            "Use /filter add|del|list <word>"
                        } else {
                            "Use /del <count>"
                        };
                        ctx.api.edit_message_text(chat_id, message_id, help).await;
                    }
                    return Ok(true);
                }
                if TOGGLEABLE_FLAGS.contains(&flag) {
                    let settings = ctx.store.get_group(chat_id);
                    let current = flag_value(&settings, flag);
                    ctx.store.set_group_flag(chat_id, flag, !current);
                    if let Some(message_id) = job.message_id.as_deref() {
                        let refreshed = ctx.store.get_group(chat_id);
                        ctx.api
                            .edit_inline_keypad(chat_id, message_id, keypad(&refreshed))
                            .await;
                    }
                    return Ok(true);
                }
                return Ok(false);
            }

            let Some(text) = job.text.as_deref() else {
                return Ok(false);
            };
            if text.trim() != "/panel" {
                return Ok(false);
            }
            let settings = ctx.store.get_group(chat_id);
            ctx.api
                .send_message_with_inline_keypad(chat_id, "Moderation panel", keypad(&settings))
                .await;
            Ok(true)
        })
    }
}

fn flag_value(settings: &crate::models::GroupSettings, flag: &str) -> bool {
    match flag {
        "anti_link" => settings.anti_link,
        "anti_flood" => settings.anti_flood,
        "anti_spam" => settings.anti_spam,
        "anti_badwords" => settings.anti_badwords,
        "anti_forward" => settings.anti_forward,
        _ => false,
    }
}

fn keypad(settings: &crate::models::GroupSettings) -> serde_json::Value {
    let row = |flag: &str, value: bool| {
        json!({
            "text": format!("{flag}: {}", if value { "on" } else { "off" }),
            "callback_data": format!("panel:{flag}"),
        })
    };
    json!({
        "rows": [
            [row("anti_link", settings.anti_link), row("anti_flood", settings.anti_flood)],
            [row("anti_spam", settings.anti_spam), row("anti_badwords", settings.anti_badwords)],
            [row("anti_forward", settings.anti_forward)],
            [
                { "text": "Filters", "callback_data": "panel:filter" },
                { "text": "Delete", "callback_data": "panel:delete" },
            ],
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupSettings;

    #[test]
    fn keypad_reflects_current_flag_state() {
        let mut settings = GroupSettings::default_for("chat-1");
        settings.anti_flood = true;
        let keys = keypad(&settings);
        let first_row = &keys["rows"][0];
        assert!(first_row[0]["text"].as_str().unwrap().contains("on"));
        assert!(first_row[1]["text"].as_str().unwrap().contains("on"));
    }
}
