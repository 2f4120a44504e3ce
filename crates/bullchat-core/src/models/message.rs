use serde::{Deserialize, Serialize};

use super::{Identity, RoomId};

pub type MessageId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub author: Identity,
    pub content: String,
    /// Nanoseconds since epoch
    pub timestamp: u64,
    /// Parent message in the same room, if this is a threaded reply
    pub reply_to: Option<MessageId>,
    /// Set by the service once the content has been edited
    pub edited: bool,
    /// Accumulated tips in e8s, only ever changed by the service
    #[serde(rename = "tip_total_e8s")]
    pub tip_total: u64,
}

impl Message {
    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }

    pub fn has_tips(&self) -> bool {
        self.tip_total > 0
    }
}

/// Sort a fetched window into display order.
///
/// Ascending by timestamp; ties fall back to id so repeated polls of the
/// same data always render identically.
pub fn sort_for_display(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
}
