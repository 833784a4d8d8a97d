use super::traits::{Activity, Outbound};
use std::sync::{Arc, Mutex, PoisonError};

/// Per-turn view of the transport: the inbound activity plus a way to reply.
///
/// Every message sent through [`TurnContext::send_activity`] is also kept in
/// an ordered log so the executor can mirror outward effects into history.
pub struct TurnContext {
    turn_id: String,
    activity: Activity,
    outbound: Arc<dyn Outbound>,
    sent: Mutex<Vec<String>>,
}

impl TurnContext {
    pub fn new(activity: Activity, outbound: Arc<dyn Outbound>) -> Self {
        Self {
            turn_id: uuid::Uuid::new_v4().to_string(),
            activity,
            outbound,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn turn_id(&self) -> &str {
        &self.turn_id
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub async fn send_activity(&self, text: &str) -> anyhow::Result<()> {
        self.outbound.send(&self.activity, text).await?;
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
        tracing::debug!(
            turn_id = %self.turn_id,
            outbound = self.outbound.name(),
            chars = text.chars().count(),
            "outward message sent"
        );
        Ok(())
    }

    /// Everything sent outward so far this turn, oldest first.
    pub fn sent_messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub(crate) fn sent_since(&self, start: usize) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(start..)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for TurnContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnContext")
            .field("turn_id", &self.turn_id)
            .field("activity", &self.activity)
            .field("outbound", &self.outbound.name())
            .finish_non_exhaustive()
    }
}
