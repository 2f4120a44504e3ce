//! Service wrapper for exercising fetch ordering in tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};

use crate::error::ServiceError;
use crate::models::{Identity, Message, MessageId, Room, RoomId};
use crate::service::{MemoryChatService, RemoteChatService};

/// Delegates to a `MemoryChatService`, but `list_messages` calls for held
/// rooms park until the test releases them.
pub(crate) struct GatedService {
    inner: Arc<MemoryChatService>,
    held: Mutex<HashSet<RoomId>>,
    parked: Mutex<Vec<oneshot::Sender<()>>>,
    arrived: Notify,
    reverse: AtomicBool,
    concurrent: AtomicUsize,
    max_concurrent: AtomicUsize,
}

impl GatedService {
    pub(crate) fn new(inner: Arc<MemoryChatService>) -> Self {
        Self {
            inner,
            held: Mutex::new(HashSet::new()),
            parked: Mutex::new(Vec::new()),
            arrived: Notify::new(),
            reverse: AtomicBool::new(false),
            concurrent: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
        }
    }

    pub(crate) fn hold(&self, room_id: RoomId) {
        self.held.lock().insert(room_id);
    }

    pub(crate) fn unhold(&self, room_id: RoomId) {
        self.held.lock().remove(&room_id);
    }

    /// Return listings newest-first, the opposite of display order.
    pub(crate) fn reverse_listings(&self) {
        self.reverse.store(true, Ordering::SeqCst);
    }

    /// Wait until at least `count` listings are parked.
    pub(crate) async fn wait_for_held(&self, count: usize) {
        loop {
            if self.parked.lock().len() >= count {
                return;
            }
            self.arrived.notified().await;
        }
    }

    pub(crate) fn release_all(&self) {
        for gate in self.parked.lock().drain(..) {
            let _ = gate.send(());
        }
    }

    pub(crate) fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteChatService for GatedService {
    async fn whoami(&self) -> Result<Identity, ServiceError> {
        self.inner.whoami().await
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, ServiceError> {
        self.inner.list_rooms().await
    }

    async fn create_room(
        &self,
        name: &str,
        description: &str,
        is_private: bool,
    ) -> Result<Room, ServiceError> {
        self.inner.create_room(name, description, is_private).await
    }

    async fn send_message(
        &self,
        room_id: RoomId,
        content: &str,
        reply_to: Option<MessageId>,
    ) -> Result<Message, ServiceError> {
        self.inner.send_message(room_id, content, reply_to).await
    }

    async fn edit_message(&self, message_id: MessageId, content: &str) -> Result<(), ServiceError> {
        self.inner.edit_message(message_id, content).await
    }

    async fn list_messages(
        &self,
        room_id: RoomId,
        cursor: Option<u64>,
        limit: u32,
    ) -> Result<Vec<Message>, ServiceError> {
        let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);

        let gate = if self.held.lock().contains(&room_id) {
            let (tx, rx) = oneshot::channel();
            self.parked.lock().push(tx);
            self.arrived.notify_one();
            Some(rx)
        } else {
            None
        };
        if let Some(rx) = gate {
            let _ = rx.await;
        }

        let result = self.inner.list_messages(room_id, cursor, limit).await;
        self.concurrent.fetch_sub(1, Ordering::SeqCst);

        let mut messages = result?;
        if self.reverse.load(Ordering::SeqCst) {
            messages.reverse();
        }
        Ok(messages)
    }

    async fn tip_message(&self, message_id: MessageId, amount: u64) -> Result<(), ServiceError> {
        self.inner.tip_message(message_id, amount).await
    }
}
