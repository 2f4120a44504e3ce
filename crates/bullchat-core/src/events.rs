use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::models::RoomId;

/// Notifications for the presentation layer. Carry no data: the receiver
/// re-reads the component it cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// Room set or active room changed
    RoomsChanged,
    /// A fetch replaced the message window of the active room
    MessagesChanged { room_id: RoomId },
    /// A remote call failed; text is ready for an error banner
    Error(String),
}

pub type EventSender = UnboundedSender<CoreEvent>;
pub type EventReceiver = UnboundedReceiver<CoreEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Send if anyone is listening; a dropped receiver is not an error.
pub(crate) fn emit(sender: Option<&EventSender>, event: CoreEvent) {
    if let Some(tx) = sender {
        let _ = tx.send(event);
    }
}
