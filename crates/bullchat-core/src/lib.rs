pub mod compose;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod format;
pub mod models;
pub mod runtime;
pub mod service;
pub mod session;
pub mod store;
pub mod sync;
pub mod tracing_setup;

#[cfg(test)]
pub(crate) mod test_support;

pub use compose::{ComposeState, ComposeStateMachine, Submission};
pub use config::{CoreConfig, Network};
pub use error::{ChatError, ServiceError};
pub use events::CoreEvent;
pub use models::{Identity, Message, MessageId, Room, RoomId};
pub use runtime::ChatClient;
pub use service::{HttpChatService, MemoryChatService, RemoteChatService, SharedService};
pub use session::Session;
pub use store::{RoomDirectory, ThreadResolver};
pub use sync::{FetchOutcome, MessageSync};
