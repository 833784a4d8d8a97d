//! Storage key derivation for persistent state layers.
//!
//! Keys are built only from channel, conversation and user identifiers (plus
//! an optional deployment namespace). Identifier segments are escaped so that
//! a `/` inside an id can never make two different scopes collide.

pub const CONVERSATION_LAYER: &str = "conversation";
pub const USER_LAYER: &str = "user";
pub const TEMP_LAYER: &str = "temp";

fn escape_segment(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for ch in segment.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn join(namespace: Option<&str>, channel_id: &str, scope: &str, id: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!(
            "{}/{}/{scope}/{}",
            escape_segment(channel_id),
            escape_segment(ns),
            escape_segment(id)
        ),
        _ => format!(
            "{}/{scope}/{}",
            escape_segment(channel_id),
            escape_segment(id)
        ),
    }
}

pub fn conversation_key(namespace: Option<&str>, channel_id: &str, conversation_id: &str) -> String {
    join(namespace, channel_id, "conversations", conversation_id)
}

pub fn user_key(namespace: Option<&str>, channel_id: &str, user_id: &str) -> String {
    join(namespace, channel_id, "users", user_id)
}

/// Key for an application-defined scope; `scope` names the layer.
///
/// Custom scopes live under their own `scopes/` segment so no scope name can
/// produce a conversation or user key.
pub fn custom_key(namespace: Option<&str>, channel_id: &str, scope: &str, id: &str) -> String {
    join(
        namespace,
        channel_id,
        &format!("scopes/{}", escape_segment(scope)),
        id,
    )
}

/// Prefix shared by every record of a channel, for listing.
pub fn channel_prefix(namespace: Option<&str>, channel_id: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => {
            format!("{}/{}/", escape_segment(channel_id), escape_segment(ns))
        }
        _ => format!("{}/", escape_segment(channel_id)),
    }
}
