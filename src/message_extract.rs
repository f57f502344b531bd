use serde_json::Value;

/// Pulls the actual message-shaped object out of a raw update body. A
/// webhook update carries its payload under one of three keys depending on
/// the event type. Ported from
/// `original_source/app/utils/message.py::extract_message`.
pub fn extract_message(update: &Value) -> Option<&Value> {
    update
        .get("message")
        .or_else(|| update.get("data"))
        .or_else(|| update.get("inline_message"))
}

pub fn get_text(message: &Value) -> Option<String> {
    message
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Prefers `chat.id`, falling back to a flat `chat_id` field.
pub fn get_chat_id(message: &Value) -> Option<String> {
    message
        .get("chat")
        .and_then(|c| c.get("id"))
        .or_else(|| message.get("chat_id"))
        .and_then(value_as_id_string)
}

/// Prefers `message_id`, falling back to a flat `id` field.
pub fn get_message_id(message: &Value) -> Option<String> {
    message
        .get("message_id")
        .or_else(|| message.get("id"))
        .and_then(value_as_id_string)
}

/// Prefers `sender.id`, falling back to `sender_id`.
pub fn get_sender_id(message: &Value) -> Option<String> {
    message
        .get("sender")
        .and_then(|s| s.get("id"))
        .or_else(|| message.get("sender_id"))
        .and_then(value_as_id_string)
}

/// The update's kind, used for priority classification and to restrict
/// anti-link moderation to group-shaped chats (§4.10, §4.11). Read from the
/// envelope-level `type` field, falling back to the message's own `chat.type`
/// (covers inline messages and callback queries, which carry no top-level
/// `type`).
pub fn get_update_type(update: &Value, message: &Value) -> Option<String> {
    update
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            message
                .get("chat")
                .and_then(|c| c.get("type"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
}

/// The tapped inline keypad button id, present on `callback_query` updates.
pub fn get_button_id(update: &Value, message: &Value) -> Option<String> {
    update
        .get("button_id")
        .or_else(|| update.get("data"))
        .or_else(|| message.get("button_id"))
        .or_else(|| message.get("aux_data").and_then(|a| a.get("button_id")))
        .and_then(value_as_id_string)
}

pub fn value_as_id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
