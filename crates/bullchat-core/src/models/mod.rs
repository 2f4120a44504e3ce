pub mod identity;
pub mod message;
pub mod room;

pub use identity::Identity;
pub use message::{sort_for_display, Message, MessageId};
pub use room::{dedup_by_name, Room, RoomId};
