//! In-process ledger with the same rules as the remote backend.

use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::RemoteChatService;
use crate::constants::{MAX_MESSAGE_WINDOW, MESSAGE_WINDOW};
use crate::error::ServiceError;
use crate::models::{Identity, Message, MessageId, Room, RoomId};

/// Remote operations, used to script failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Whoami,
    ListRooms,
    CreateRoom,
    SendMessage,
    EditMessage,
    ListMessages,
    TipMessage,
}

struct Ledger {
    next_room_id: RoomId,
    next_message_id: MessageId,
    rooms: BTreeMap<RoomId, Room>,
    messages: BTreeMap<MessageId, Message>,
    last_timestamp: u64,
    failures: HashMap<Operation, VecDeque<ServiceError>>,
    calls: HashMap<Operation, usize>,
}

impl Ledger {
    fn new() -> Self {
        Self {
            next_room_id: 1,
            next_message_id: 1,
            rooms: BTreeMap::new(),
            messages: BTreeMap::new(),
            last_timestamp: 0,
            failures: HashMap::new(),
            calls: HashMap::new(),
        }
    }

    /// Record the call and surface a scripted failure, if one is queued.
    fn begin(&mut self, op: Operation) -> Result<(), ServiceError> {
        *self.calls.entry(op).or_insert(0) += 1;
        match self.failures.get_mut(&op).and_then(|queue| queue.pop_front()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Wall clock in nanoseconds, forced strictly increasing.
    fn now(&mut self) -> u64 {
        let wall = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        self.last_timestamp = wall.max(self.last_timestamp + 1);
        self.last_timestamp
    }
}

pub struct MemoryChatService {
    caller: RwLock<Identity>,
    ledger: Mutex<Ledger>,
}

impl MemoryChatService {
    pub fn new(caller: Identity) -> Self {
        Self {
            caller: RwLock::new(caller),
            ledger: Mutex::new(Ledger::new()),
        }
    }

    /// Change who subsequent calls are made as.
    pub fn set_caller(&self, caller: Identity) {
        *self.caller.write() = caller;
    }

    /// Queue a failure for the next call of `op`.
    pub fn fail_next(&self, op: Operation, err: ServiceError) {
        self.ledger
            .lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(err);
    }

    pub fn calls(&self, op: Operation) -> usize {
        self.ledger.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Insert a room directly, bypassing call accounting.
    pub fn seed_room(&self, name: &str, description: &str, is_private: bool) -> Room {
        let creator = self.caller.read().clone();
        let mut ledger = self.ledger.lock();
        let id = ledger.next_room_id;
        ledger.next_room_id += 1;
        let room = Room {
            id,
            name: name.to_string(),
            description: description.to_string(),
            creator,
            is_private,
            created_at: ledger.now(),
        };
        ledger.rooms.insert(id, room.clone());
        room
    }

    /// Insert a fully formed message (explicit id and timestamp).
    pub fn seed_message(&self, message: Message) {
        let mut ledger = self.ledger.lock();
        ledger.next_message_id = ledger.next_message_id.max(message.id + 1);
        ledger.last_timestamp = ledger.last_timestamp.max(message.timestamp);
        ledger.messages.insert(message.id, message);
    }

    pub fn message(&self, message_id: MessageId) -> Option<Message> {
        self.ledger.lock().messages.get(&message_id).cloned()
    }

    pub fn messages_in(&self, room_id: RoomId) -> Vec<Message> {
        self.ledger
            .lock()
            .messages
            .values()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect()
    }

    pub fn room_count(&self) -> usize {
        self.ledger.lock().rooms.len()
    }
}

#[async_trait]
impl RemoteChatService for MemoryChatService {
    async fn whoami(&self) -> Result<Identity, ServiceError> {
        self.ledger.lock().begin(Operation::Whoami)?;
        Ok(self.caller.read().clone())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, ServiceError> {
        let mut ledger = self.ledger.lock();
        ledger.begin(Operation::ListRooms)?;
        Ok(ledger.rooms.values().cloned().collect())
    }

    async fn create_room(
        &self,
        name: &str,
        description: &str,
        is_private: bool,
    ) -> Result<Room, ServiceError> {
        self.ledger.lock().begin(Operation::CreateRoom)?;
        Ok(self.seed_room(name, description, is_private))
    }

    async fn send_message(
        &self,
        room_id: RoomId,
        content: &str,
        reply_to: Option<MessageId>,
    ) -> Result<Message, ServiceError> {
        let author = self.caller.read().clone();
        let mut ledger = self.ledger.lock();
        ledger.begin(Operation::SendMessage)?;

        if content.trim().is_empty() {
            return Err(ServiceError::Rejected(
                "message content cannot be empty".to_string(),
            ));
        }
        if !ledger.rooms.contains_key(&room_id) {
            return Err(ServiceError::NotFound {
                kind: "room",
                id: room_id,
            });
        }

        let id = ledger.next_message_id;
        ledger.next_message_id += 1;
        let message = Message {
            id,
            room_id,
            author,
            content: content.to_string(),
            timestamp: ledger.now(),
            reply_to,
            edited: false,
            tip_total: 0,
        };
        ledger.messages.insert(id, message.clone());
        Ok(message)
    }

    async fn edit_message(
        &self,
        message_id: MessageId,
        content: &str,
    ) -> Result<(), ServiceError> {
        let caller = self.caller.read().clone();
        let mut ledger = self.ledger.lock();
        ledger.begin(Operation::EditMessage)?;

        if content.trim().is_empty() {
            return Err(ServiceError::Rejected(
                "new content cannot be empty".to_string(),
            ));
        }
        let message = ledger
            .messages
            .get_mut(&message_id)
            .ok_or(ServiceError::NotFound {
                kind: "message",
                id: message_id,
            })?;
        if message.author != caller {
            return Err(ServiceError::Rejected(
                "only the author can edit this message".to_string(),
            ));
        }

        message.content = content.to_string();
        message.edited = true;
        Ok(())
    }

    async fn list_messages(
        &self,
        room_id: RoomId,
        cursor: Option<u64>,
        limit: u32,
    ) -> Result<Vec<Message>, ServiceError> {
        let mut ledger = self.ledger.lock();
        ledger.begin(Operation::ListMessages)?;

        let from = cursor.unwrap_or(0);
        let max = match limit {
            0 => MESSAGE_WINDOW,
            n => n.min(MAX_MESSAGE_WINDOW),
        };

        let mut messages: Vec<Message> = ledger
            .messages
            .values()
            .filter(|m| m.room_id == room_id && m.timestamp >= from)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.timestamp);
        messages.truncate(max as usize);
        Ok(messages)
    }

    async fn tip_message(&self, message_id: MessageId, amount: u64) -> Result<(), ServiceError> {
        let mut ledger = self.ledger.lock();
        ledger.begin(Operation::TipMessage)?;

        if amount == 0 {
            return Err(ServiceError::Rejected(
                "tip amount must be > 0".to_string(),
            ));
        }
        let message = ledger
            .messages
            .get_mut(&message_id)
            .ok_or(ServiceError::NotFound {
                kind: "message",
                id: message_id,
            })?;
        message.tip_total = message.tip_total.saturating_add(amount);
        Ok(())
    }
}
