use regex::Regex;

use crate::models::Job;

use super::{Plugin, PluginContext, PluginFuture};

/// Word/phrase filtering with a whitelist short-circuit, gated on the
/// chat's `anti_badwords` flag (§4.10). Ported from
/// `original_source/app/services/plugins/filters.py::FilterWordsPlugin`: a
/// whitelist match on *any* configured filter immediately lets the message
/// through, but a blacklist match doesn't act until every filter has been
/// scanned (so a later whitelist entry can still save the message).
pub struct FilterWordsPlugin;

fn matches(filter_word: &str, regex_enabled: bool, text: &str) -> bool {
    if regex_enabled {
        Regex::new(filter_word)
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    } else {
        text.to_lowercase().contains(&filter_word.to_lowercase())
    }
}

impl Plugin for FilterWordsPlugin {
    fn name(&self) -> &'static str {
        "filters"
    }

    fn handle<'a>(&'a self, ctx: &'a PluginContext, job: &'a Job) -> PluginFuture<'a> {
        Box::pin(async move {
            let Some(chat_id) = job.chat_id.as_deref() else {
                return Ok(false);
            };
            let Some(text) = job.text.as_deref() else {
                return Ok(false);
            };

            let settings = ctx.store.get_group(chat_id);
            if !settings.anti_badwords {
                return Ok(false);
            }

            let filters = ctx.store.list_filters(chat_id);
            if filters.is_empty() {
                return Ok(false);
            }

            let mut blacklist_hit = false;
            for filter in &filters {
                if !matches(&filter.word, filter.regex_enabled, text) {
                    continue;
                }
                if filter.is_whitelist {
                    return Ok(false);
                }
                blacklist_hit = true;
            }

            if !blacklist_hit {
                return Ok(false);
            }

            if let Some(message_id) = job.message_id.as_deref() {
                ctx.api.delete_message(chat_id, message_id).await;
            }
            Ok(true)
        })
    }
}
