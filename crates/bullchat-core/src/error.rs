use crate::models::{MessageId, RoomId};

/// Failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected by service: {0}")]
    Rejected(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u64 },

    #[error("invalid response: {0}")]
    Decode(String),
}

/// Component-level errors. Every remote failure is converted into one of
/// these before it leaves a component, and the display text is what the
/// presentation layer shows in its error banner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Failed to load rooms: {0}")]
    Rooms(ServiceError),

    #[error("Failed to load messages: {0}")]
    Messages(ServiceError),

    #[error("Failed to send message: {0}")]
    Submit(ServiceError),

    #[error("Failed to tip message: {0}")]
    Tip(ServiceError),

    #[error("No room selected")]
    NoActiveRoom,

    #[error("Unknown room: {0}")]
    UnknownRoom(String),

    #[error("Message #{0} is not in the loaded window")]
    UnknownMessage(MessageId),

    #[error("Message is empty")]
    EmptyDraft,

    #[error("A message is already being sent")]
    SubmitInProgress,

    #[error("Message #{message_id} belongs to room {room_id}, not the active room")]
    EditTargetOutsideRoom { message_id: MessageId, room_id: RoomId },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ChatError {
    /// Listing or room-creation failures; last good data is kept.
    pub fn is_fetch(&self) -> bool {
        matches!(self, ChatError::Rooms(_) | ChatError::Messages(_))
    }

    /// Send/edit failures; the draft is kept for a retry.
    pub fn is_submit(&self) -> bool {
        matches!(self, ChatError::Submit(_))
    }
}
