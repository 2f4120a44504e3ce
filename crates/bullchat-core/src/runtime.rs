use tracing::{debug, info, warn};

use crate::compose::{ComposeStateMachine, Submission};
use crate::config::CoreConfig;
use crate::error::ChatError;
use crate::events::{emit, CoreEvent, EventSender};
use crate::format::{render_window, MessageView};
use crate::models::{Identity, Message, MessageId, Room, RoomId};
use crate::service::SharedService;
use crate::session::Session;
use crate::store::RoomDirectory;
use crate::sync::{FetchOutcome, MessageSync};

/// One chat session: the room directory feeds the active room to message
/// sync, whose window backs thread labels and compose validation.
pub struct ChatClient {
    service: SharedService,
    identity: Identity,
    rooms: RoomDirectory,
    sync: MessageSync,
    compose: ComposeStateMachine,
    events: Option<EventSender>,
}

impl ChatClient {
    pub fn new(session: &Session) -> Self {
        Self::with_service(session.service(), session.identity(), session.config())
    }

    pub fn with_service(service: SharedService, identity: Identity, config: &CoreConfig) -> Self {
        Self {
            rooms: RoomDirectory::new(service.clone()),
            sync: MessageSync::new(service.clone(), config.poll_interval, config.message_limit),
            compose: ComposeStateMachine::new(),
            service,
            identity,
            events: None,
        }
    }

    /// Subscribe a presentation layer to change notifications.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.sync = self.sync.with_events(events.clone());
        self.events = Some(events);
        self
    }

    /// Load the room directory and open the active room.
    pub async fn start(&mut self) -> Result<(), ChatError> {
        self.refresh_rooms().await
    }

    /// Re-fetch rooms. If the active room changed (first load, or the old one
    /// disappeared) the new one is opened and compose is reset.
    pub async fn refresh_rooms(&mut self) -> Result<(), ChatError> {
        if let Err(e) = self.rooms.load().await {
            self.emit(CoreEvent::Error(e.to_string()));
            return Err(e);
        }
        self.emit(CoreEvent::RoomsChanged);

        match self.rooms.active_room_id() {
            Some(room_id) if self.sync.active_room() != Some(room_id) => {
                self.open_room(room_id).await
            }
            _ => Ok(()),
        }
    }

    pub async fn select_room(&mut self, room_id: RoomId) -> Result<(), ChatError> {
        self.rooms.select(room_id)?;
        self.emit(CoreEvent::RoomsChanged);
        self.open_room(room_id).await
    }

    /// Select by exact name, falling back to a numeric id.
    pub async fn select_room_by_name(&mut self, name: &str) -> Result<(), ChatError> {
        let room_id = match self.rooms.find_by_name(name) {
            Some(room) => room.id,
            None => name
                .trim()
                .parse::<RoomId>()
                .ok()
                .filter(|id| self.rooms.find(*id).is_some())
                .ok_or_else(|| ChatError::UnknownRoom(name.to_string()))?,
        };
        self.select_room(room_id).await
    }

    pub async fn create_room(
        &mut self,
        name: &str,
        description: &str,
        is_private: bool,
    ) -> Result<Room, ChatError> {
        let room = match self.rooms.create_room(name, description, is_private).await {
            Ok(room) => room,
            Err(e) => {
                self.emit(CoreEvent::Error(e.to_string()));
                return Err(e);
            }
        };
        self.emit(CoreEvent::RoomsChanged);
        if self.sync.active_room().is_none() {
            if let Some(room_id) = self.rooms.active_room_id() {
                self.open_room(room_id).await?;
            }
        }
        Ok(room)
    }

    async fn open_room(&mut self, room_id: RoomId) -> Result<(), ChatError> {
        debug!(room_id, "opening room");
        self.compose.cancel();
        self.sync.activate(room_id);
        self.sync.refresh().await.map(|_| ())
    }

    /// Out-of-cycle fetch of the active room.
    pub async fn refresh_messages(&self) -> Result<FetchOutcome, ChatError> {
        self.sync.refresh().await
    }

    pub fn start_reply(&mut self, message_id: MessageId) -> Result<(), ChatError> {
        let target = self.loaded(message_id)?;
        self.compose.start_reply(&target);
        Ok(())
    }

    pub fn start_edit(&mut self, message_id: MessageId) -> Result<(), ChatError> {
        let target = self.loaded(message_id)?;
        self.compose.start_edit(&target);
        Ok(())
    }

    pub fn cancel_compose(&mut self) {
        self.compose.cancel();
    }

    pub fn text_change(&mut self, text: impl Into<String>) {
        self.compose.text_change(text);
    }

    pub fn append_text(&mut self, text: &str) {
        self.compose.append_text(text);
    }

    /// Send or edit the current draft, then refresh the window immediately.
    pub async fn submit(&mut self) -> Result<Submission, ChatError> {
        let active_room = self.rooms.active_room_id();
        let submission = match self.compose.submit(self.service.as_ref(), active_room).await {
            Ok(submission) => submission,
            Err(e) => {
                if e.is_submit() {
                    self.emit(CoreEvent::Error(e.to_string()));
                }
                return Err(e);
            }
        };

        if let Err(e) = self.sync.refresh().await {
            warn!(error = %e, "refresh after submit failed");
        }
        Ok(submission)
    }

    /// Tip a message (amount in e8s), then refresh to observe the new total.
    pub async fn tip(&mut self, message_id: MessageId, amount: u64) -> Result<(), ChatError> {
        if let Err(e) = self.service.tip_message(message_id, amount).await {
            let err = ChatError::Tip(e);
            warn!(message_id, error = %err, "tip failed");
            self.emit(CoreEvent::Error(err.to_string()));
            return Err(err);
        }
        info!(message_id, amount, "tipped message");
        if let Err(e) = self.sync.refresh().await {
            warn!(error = %e, "refresh after tip failed");
        }
        Ok(())
    }

    /// Caller identity as the service sees it.
    pub async fn whoami(&self) -> Result<Identity, ChatError> {
        self.service
            .whoami()
            .await
            .map_err(|e| ChatError::Session(e.to_string()))
    }

    /// Stop polling. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.sync.deactivate();
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn rooms(&self) -> &[Room] {
        self.rooms.rooms()
    }

    pub fn active_room(&self) -> Option<&Room> {
        self.rooms.active_room()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.sync.messages()
    }

    pub fn render(&self) -> Vec<MessageView> {
        self.sync.with_window(|window| render_window(window, &self.identity))
    }

    pub fn compose(&self) -> &ComposeStateMachine {
        &self.compose
    }

    pub fn is_polling(&self) -> bool {
        self.sync.is_polling()
    }

    /// Most relevant error for a banner: submit, then messages, then rooms.
    pub fn last_error(&self) -> Option<String> {
        self.compose
            .last_error()
            .map(str::to_string)
            .or_else(|| self.sync.last_error())
            .or_else(|| self.rooms.last_error().map(str::to_string))
    }

    fn loaded(&self, message_id: MessageId) -> Result<Message, ChatError> {
        self.sync
            .find_message(message_id)
            .ok_or(ChatError::UnknownMessage(message_id))
    }

    fn emit(&self, event: CoreEvent) {
        emit(self.events.as_ref(), event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ComposeState;
    use crate::error::ServiceError;
    use crate::events;
    use crate::service::{MemoryChatService, Operation};
    use crate::store::ThreadResolver;
    use std::sync::Arc;
    use std::time::Duration;

    fn config() -> CoreConfig {
        CoreConfig {
            poll_interval: Duration::from_secs(3600),
            ..CoreConfig::default()
        }
    }

    fn message(id: MessageId, room_id: RoomId, author: &str, timestamp: u64, content: &str) -> Message {
        Message {
            id,
            room_id,
            author: Identity::new(author),
            content: content.to_string(),
            timestamp,
            reply_to: None,
            edited: false,
            tip_total: 0,
        }
    }

    /// Rooms "Global Chat" and "Traders"; Global Chat holds message 1.
    fn trading_floor(me: &str) -> (Arc<MemoryChatService>, ChatClient, Room, Room) {
        let memory = Arc::new(MemoryChatService::new(Identity::new(me)));
        let global = memory.seed_room("Global Chat", "", false);
        let traders = memory.seed_room("Traders", "", false);
        memory.seed_message(message(1, global.id, "rdmx6-jaaaa-aaaaa-aaadq-cai", 100, "hi"));
        let client = ChatClient::with_service(memory.clone(), Identity::new(me), &config());
        (memory, client, global, traders)
    }

    #[tokio::test]
    async fn test_start_opens_first_room() {
        let (_, mut client, global, _) = trading_floor("bob");
        client.start().await.unwrap();

        assert_eq!(client.active_room().map(|r| r.id), Some(global.id));
        assert_eq!(client.messages().len(), 1);
        assert!(client.is_polling());

        client.shutdown();
        client.shutdown();
        assert!(!client.is_polling());
    }

    #[tokio::test]
    async fn test_start_on_empty_service_bootstraps_default_room() {
        let memory = Arc::new(MemoryChatService::new(Identity::new("bob")));
        let mut client = ChatClient::with_service(memory.clone(), Identity::new("bob"), &config());

        client.start().await.unwrap();
        assert_eq!(client.rooms().len(), 1);
        assert_eq!(client.active_room().map(|r| r.name.as_str()), Some("Global Chat"));
        assert!(client.messages().is_empty());
    }

    #[tokio::test]
    async fn test_reply_scenario_refreshes_and_labels_thread() {
        let (memory, mut client, global, _) = trading_floor("bob");
        let (tx, mut rx) = events::channel();
        client = client.with_events(tx);
        client.start().await.unwrap();
        while rx.try_recv().is_ok() {}

        client.start_reply(1).unwrap();
        client.text_change("yo");
        let submission = client.submit().await.unwrap();

        assert_eq!(
            submission,
            Submission::Reply {
                room_id: global.id,
                content: "yo".to_string(),
                reply_to: 1,
            }
        );
        assert!(client.compose().state().is_idle());
        assert_eq!(client.compose().draft(), "");
        assert_eq!(memory.calls(Operation::ListMessages), 2);
        assert_eq!(
            rx.try_recv().ok(),
            Some(CoreEvent::MessagesChanged { room_id: global.id })
        );

        let window = client.messages();
        let reply = window.iter().find(|m| m.reply_to == Some(1)).unwrap();
        assert_eq!(reply.content, "yo");
        assert_eq!(
            ThreadResolver::new(&window).reply_label(reply).as_deref(),
            Some("rdmx6…cai")
        );

        let views = client.render();
        assert_eq!(views.last().and_then(|v| v.reply_label.clone()).as_deref(), Some("rdmx6…cai"));
    }

    #[tokio::test]
    async fn test_edit_scenario_shows_edited_content() {
        let (memory, mut client, global, _) = trading_floor("bob");
        memory.seed_message(message(5, global.id, "bob", 200, "old"));
        client.start().await.unwrap();

        client.start_edit(5).unwrap();
        assert_eq!(client.compose().draft(), "old");
        client.text_change("new");
        let submission = client.submit().await.unwrap();

        assert_eq!(
            submission,
            Submission::Edit {
                message_id: 5,
                content: "new".to_string(),
            }
        );
        assert!(client.compose().state().is_idle());
        let edited = client.messages().into_iter().find(|m| m.id == 5).unwrap();
        assert_eq!(edited.content, "new");
        assert!(edited.edited);
    }

    #[tokio::test]
    async fn test_failed_reply_keeps_state_and_surfaces_error() {
        let (memory, mut client, _, _) = trading_floor("bob");
        let (tx, mut rx) = events::channel();
        client = client.with_events(tx);
        client.start().await.unwrap();
        while rx.try_recv().is_ok() {}

        memory.fail_next(
            Operation::SendMessage,
            ServiceError::Rejected("canister trapped".into()),
        );
        client.start_reply(1).unwrap();
        client.text_change("yo");
        assert!(client.submit().await.is_err());

        match client.compose().state() {
            ComposeState::Replying { target, draft } => {
                assert_eq!(target.id, 1);
                assert_eq!(draft, "yo");
            }
            other => panic!("expected Replying, got {other:?}"),
        }
        let banner = client.last_error().unwrap();
        assert!(banner.starts_with("Failed to send message"));
        assert_eq!(rx.try_recv().ok(), Some(CoreEvent::Error(banner)));
        // no refresh after a failed submit
        assert_eq!(memory.calls(Operation::ListMessages), 1);
    }

    #[tokio::test]
    async fn test_selecting_room_resets_compose_and_switches_window() {
        let (_, mut client, _, traders) = trading_floor("bob");
        client.start().await.unwrap();

        client.start_reply(1).unwrap();
        client.text_change("yo");
        client.select_room_by_name("Traders").await.unwrap();

        assert_eq!(client.compose().state(), &ComposeState::default());
        assert_eq!(client.active_room().map(|r| r.id), Some(traders.id));
        assert!(client.messages().is_empty());
        assert!(matches!(
            client.start_reply(1),
            Err(ChatError::UnknownMessage(1))
        ));
        assert!(matches!(
            client.select_room_by_name("Nowhere").await,
            Err(ChatError::UnknownRoom(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_draft_is_not_sent() {
        let (memory, mut client, _, _) = trading_floor("bob");
        client.start().await.unwrap();

        client.text_change("   ");
        assert_eq!(client.submit().await, Err(ChatError::EmptyDraft));
        assert_eq!(memory.calls(Operation::SendMessage), 0);
        assert!(client.last_error().is_none());
    }

    #[tokio::test]
    async fn test_tip_refreshes_total() {
        let (_, mut client, _, _) = trading_floor("bob");
        client.start().await.unwrap();

        client.tip(1, 25_000_000).await.unwrap();
        assert_eq!(client.messages()[0].tip_total, 25_000_000);
        assert_eq!(client.render()[0].tip.as_deref(), Some("Tips: 0.25 ICP"));

        assert!(matches!(client.tip(1, 0).await, Err(ChatError::Tip(_))));
    }

    #[tokio::test]
    async fn test_room_fetch_failure_surfaces_without_rooms() {
        let memory = Arc::new(MemoryChatService::new(Identity::new("bob")));
        memory.fail_next(
            Operation::ListRooms,
            ServiceError::Transport("replica down".into()),
        );
        let mut client = ChatClient::with_service(memory, Identity::new("bob"), &config());

        assert!(client.start().await.is_err());
        assert!(client.rooms().is_empty());
        assert!(!client.is_polling());
        assert_eq!(
            client.last_error().as_deref(),
            Some("Failed to load rooms: transport error: replica down")
        );
        assert_eq!(client.compose().placeholder(client.active_room().is_some()), "No room selected.");
    }

    #[tokio::test]
    async fn test_whoami_reports_caller() {
        let (_, client, _, _) = trading_floor("bob");
        assert_eq!(client.whoami().await.unwrap(), Identity::new("bob"));
    }
}
