use std::future::Future;
use std::pin::Pin;

/// An inbound message as delivered by a channel adapter.
///
/// `channel_id` names the messaging platform, `conversation_id` the thread or
/// chat the message belongs to and `user_id` the sender on that platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: String,
    pub channel_id: String,
    pub conversation_id: String,
    pub user_id: String,
    pub text: String,
}

impl Activity {
    pub fn message(
        channel_id: impl Into<String>,
        conversation_id: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel_id: channel_id.into(),
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
            text: text.into(),
        }
    }
}

/// Outward half of a channel adapter.
pub trait Outbound: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Deliver `text` as a reply to `activity`
    fn send<'a>(
        &'a self,
        activity: &'a Activity,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;
}
