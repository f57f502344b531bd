use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rand::Rng;

use crate::api_client::ApiClient;
use crate::models::Job;
use crate::store::Store;

/// Outcome of a thin command handler: the text (if any) to send back to the
/// chat the command was issued in.
pub struct CommandReply {
    pub text: Option<String>,
}

impl CommandReply {
    fn text(text: impl Into<String>) -> Self {
        CommandReply {
            text: Some(text.into()),
        }
    }

    fn none() -> Self {
        CommandReply { text: None }
    }
}

pub type CommandFuture = Pin<Box<dyn Future<Output = CommandReply> + Send>>;
pub type CommandFn = Arc<
    dyn Fn(Arc<Store>, Arc<ApiClient>, Job, Vec<String>) -> CommandFuture + Send + Sync,
>;

pub struct Command {
    pub name: &'static str,
    pub admin_only: bool,
    pub handler: CommandFn,
}

/// Maps `/name` prefixes to thin handlers (§4.7). Ported from
/// `original_source/app/services/handlers.py` plus the registry lookup in
/// `original_source/app/services/plugins/commands.py::CommandsPlugin`.
pub struct CommandRegistry {
    commands: HashMap<&'static str, Command>,
}

impl CommandRegistry {
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    fn insert(&mut self, command: Command) {
        self.commands.insert(command.name, command);
    }

    pub fn with_default_commands() -> Self {
        let mut registry = CommandRegistry {
            commands: HashMap::new(),
        };

        registry.insert(Command {
            name: "help",
            admin_only: false,
            handler: Arc::new(|_store, _api, _job, _args| {
                Box::pin(async move {
                    CommandReply::text(
                        "Commands: /help /ping /coin /roll /joke /setcmd /antilink \
                         /filter /del /ban /unban",
                    )
                })
            }),
        });

        registry.insert(Command {
            name: "ping",
            admin_only: false,
            handler: Arc::new(|_store, _api, _job, _args| {
                Box::pin(async move { CommandReply::text("pong") })
            }),
        });

        registry.insert(Command {
            name: "coin",
            admin_only: false,
            handler: Arc::new(|_store, _api, _job, _args| {
                Box::pin(async move {
                    let heads = rand::rng().random_bool(0.5);
                    CommandReply::text(if heads { "Heads" } else { "Tails" })
                })
            }),
        });

        registry.insert(Command {
            name: "roll",
            admin_only: false,
            handler: Arc::new(|_store, _api, _job, _args| {
                Box::pin(async move {
                    let value = rand::rng().random_range(1..=6);
                    CommandReply::text(format!("{value}"))
                })
            }),
        });

        registry.insert(Command {
            name: "joke",
            admin_only: false,
            handler: Arc::new(|_store, _api, _job, _args| {
                Box::pin(async move { CommandReply::text(random_joke()) })
            }),
        });

        registry.insert(Command {
            name: "setcmd",
            admin_only: true,
            handler: Arc::new(|_store, api, _job, args| {
                Box::pin(async move {
                    let value = serde_json::json!(args
                        .iter()
                        .map(|c| serde_json::json!({ "command": c }))
                        .collect::<Vec<_>>());
                    let result = api.set_commands(value).await;
                    if result.ok {
                        CommandReply::text("Commands updated.")
                    } else {
                        CommandReply::text("Failed to update commands.")
                    }
                })
            }),
        });

        registry.insert(Command {
            name: "antilink",
            admin_only: true,
            handler: Arc::new(|store, _api, job, args| {
                Box::pin(async move {
                    let Some(chat_id) = job.chat_id.clone() else {
                        return CommandReply::none();
                    };
                    let enable = !matches!(args.first().map(String::as_str), Some("off"));
                    store.set_group_flag(&chat_id, "anti_link", enable);
                    CommandReply::text(if enable {
                        "Anti-link enabled."
                    } else {
                        "Anti-link disabled."
                    })
                })
            }),
        });

        registry.insert(Command {
            name: "filter",
            admin_only: true,
            handler: Arc::new(|store, _api, job, args| {
                Box::pin(async move {
                    let Some(chat_id) = job.chat_id.clone() else {
                        return CommandReply::none();
                    };
                    match args.first().map(String::as_str) {
                        Some("add") => {
                            let Some(word) = args.get(1) else {
                                return CommandReply::text("Usage: /filter add <word>");
                            };
                            store.add_filter(&chat_id, word, false, false);
                            CommandReply::text(format!("Added filter: {word}"))
                        }
                        Some("del") => {
                            let Some(word) = args.get(1) else {
                                return CommandReply::text("Usage: /filter del <word>");
                            };
                            store.remove_filter(&chat_id, word);
                            CommandReply::text(format!("Removed filter: {word}"))
                        }
                        Some("list") => {
                            let filters = store.list_filters(&chat_id);
                            if filters.is_empty() {
                                CommandReply::text("No filters set.")
                            } else {
                                let listing = filters
                                    .iter()
                                    .map(|f| f.word.clone())
                                    .collect::<Vec<_>>()
                                    .join(", ");
                                CommandReply::text(listing)
                            }
                        }
                        _ => CommandReply::text("Usage: /filter add|del|list [word]"),
                    }
                })
            }),
        });

        registry.insert(Command {
            name: "del",
            admin_only: true,
            handler: Arc::new(|store, api, job, args| {
                Box::pin(async move {
                    let Some(chat_id) = job.chat_id.clone() else {
                        return CommandReply::none();
                    };
                    let count: i64 = args
                        .first()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(1)
                        .max(1);
                    let ids = store.fetch_recent_message_ids(&chat_id, count);
                    for (idx, message_id) in ids.iter().enumerate() {
                        api.delete_message(&chat_id, message_id).await;
                        if idx % 20 == 0 && idx > 0 {
                            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                        }
                    }
                    CommandReply::text(format!("Deleted {} messages.", ids.len()))
                })
            }),
        });

        registry.insert(Command {
            name: "ban",
            admin_only: true,
            handler: Arc::new(|_store, api, job, args| {
                Box::pin(async move {
                    let Some(chat_id) = job.chat_id.clone() else {
                        return CommandReply::none();
                    };
                    let target = args.first().cloned().or_else(|| job.sender_id.clone());
                    let Some(target) = target else {
                        return CommandReply::text("Usage: /ban <user_id> (or reply)");
                    };
                    let result = api.ban_chat_member(&chat_id, &target).await;
                    if result.ok {
                        CommandReply::text(format!("Banned {target}."))
                    } else {
                        CommandReply::text("Failed to ban.")
                    }
                })
            }),
        });

        registry.insert(Command {
            name: "unban",
            admin_only: true,
            handler: Arc::new(|_store, api, job, args| {
                Box::pin(async move {
                    let Some(chat_id) = job.chat_id.clone() else {
                        return CommandReply::none();
                    };
                    let Some(target) = args.first().cloned() else {
                        return CommandReply::text("Usage: /unban <user_id>");
                    };
                    let result = api.unban_chat_member(&chat_id, &target).await;
                    if result.ok {
                        CommandReply::text(format!("Unbanned {target}."))
                    } else {
                        CommandReply::text("Failed to unban.")
                    }
                })
            }),
        });

        registry
    }
}

/// Persian-language jokes, matching the tone of
/// `original_source/app/services/handlers.py::joke_handler`.
fn random_joke() -> &'static str {
    const JOKES: &[&str] = &[
        "چرا کامپیوتر سردش شد؟ چون پنجره‌هاش رو باز گذاشته بود.",
        "یه بار یه بیت به یه بایت گفت چرا این‌قدر بزرگی؟",
        "برنامه‌نویس‌ها هیچ‌وقت تنها نیستن، همیشه یه باگ همراهشونه.",
    ];
    let idx = rand::rng().random_range(0..JOKES.len());
    JOKES[idx]
}

/// Splits `"/command arg1 arg2"` into `("command", ["arg1", "arg2"])`.
/// Returns `None` if `text` doesn't start with `/`.
pub fn parse_command(text: &str) -> Option<(String, Vec<String>)> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }
    let mut parts = text[1..].split_whitespace();
    let name = parts.next()?.to_lowercase();
    let args = parts.map(str::to_string).collect();
    Some((name, args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_splits_name_and_args() {
        let (name, args) = parse_command("/filter add spam").unwrap();
        assert_eq!(name, "filter");
        assert_eq!(args, vec!["add", "spam"]);
    }

    #[test]
    fn parse_command_rejects_non_command_text() {
        assert!(parse_command("hello world").is_none());
    }

    #[test]
    fn parse_command_lowercases_name() {
        let (name, _) = parse_command("/PING").unwrap();
        assert_eq!(name, "ping");
    }

    #[test]
    fn registry_contains_all_default_commands() {
        let registry = CommandRegistry::with_default_commands();
        for name in [
            "help", "ping", "coin", "roll", "joke", "setcmd", "antilink", "filter", "del", "ban",
            "unban",
        ] {
            assert!(registry.get(name).is_some(), "missing command {name}");
        }
    }

    #[test]
    fn admin_only_flags_match_handlers_py() {
        let registry = CommandRegistry::with_default_commands();
        assert!(!registry.get("ping").unwrap().admin_only);
        assert!(registry.get("ban").unwrap().admin_only);
    }
}
