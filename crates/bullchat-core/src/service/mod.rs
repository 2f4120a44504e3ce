//! Seam to the remote chat ledger.
//!
//! Components only ever talk to `dyn RemoteChatService`; the transport
//! behind it is swappable (HTTP gateway in production, in-memory ledger for
//! tests and the demo mode).

pub mod http;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::models::{Identity, Message, MessageId, Room, RoomId};

pub use http::HttpChatService;
pub use memory::{MemoryChatService, Operation};

#[async_trait]
pub trait RemoteChatService: Send + Sync {
    /// Caller identity as seen by the service
    async fn whoami(&self) -> Result<Identity, ServiceError>;

    async fn list_rooms(&self) -> Result<Vec<Room>, ServiceError>;

    async fn create_room(
        &self,
        name: &str,
        description: &str,
        is_private: bool,
    ) -> Result<Room, ServiceError>;

    async fn send_message(
        &self,
        room_id: RoomId,
        content: &str,
        reply_to: Option<MessageId>,
    ) -> Result<Message, ServiceError>;

    /// Authorization (author-only) is enforced remotely.
    async fn edit_message(&self, message_id: MessageId, content: &str)
        -> Result<(), ServiceError>;

    /// Return order is unspecified; callers sort.
    async fn list_messages(
        &self,
        room_id: RoomId,
        cursor: Option<u64>,
        limit: u32,
    ) -> Result<Vec<Message>, ServiceError>;

    async fn tip_message(&self, message_id: MessageId, amount: u64) -> Result<(), ServiceError>;
}

pub type SharedService = Arc<dyn RemoteChatService>;
