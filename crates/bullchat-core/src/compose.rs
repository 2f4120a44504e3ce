use tracing::{info, warn};

use crate::error::{ChatError, ServiceError};
use crate::models::{Message, MessageId, RoomId};
use crate::service::RemoteChatService;

/// Compose box state. Replying and editing are mutually exclusive; a plain
/// post is `Idle` with a non-empty draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeState {
    Idle { draft: String },
    Replying { target: Message, draft: String },
    Editing { target: Message, draft: String },
}

impl Default for ComposeState {
    fn default() -> Self {
        ComposeState::Idle {
            draft: String::new(),
        }
    }
}

impl ComposeState {
    pub fn draft(&self) -> &str {
        match self {
            ComposeState::Idle { draft }
            | ComposeState::Replying { draft, .. }
            | ComposeState::Editing { draft, .. } => draft,
        }
    }

    fn draft_mut(&mut self) -> &mut String {
        match self {
            ComposeState::Idle { draft }
            | ComposeState::Replying { draft, .. }
            | ComposeState::Editing { draft, .. } => draft,
        }
    }

    pub fn target(&self) -> Option<&Message> {
        match self {
            ComposeState::Idle { .. } => None,
            ComposeState::Replying { target, .. } | ComposeState::Editing { target, .. } => {
                Some(target)
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ComposeState::Idle { .. })
    }
}

/// A validated remote call, ready to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Post {
        room_id: RoomId,
        content: String,
    },
    Reply {
        room_id: RoomId,
        content: String,
        reply_to: MessageId,
    },
    Edit {
        message_id: MessageId,
        content: String,
    },
}

impl Submission {
    pub async fn execute(&self, service: &dyn RemoteChatService) -> Result<(), ServiceError> {
        match self {
            Submission::Post { room_id, content } => {
                service.send_message(*room_id, content, None).await.map(|_| ())
            }
            Submission::Reply {
                room_id,
                content,
                reply_to,
            } => service
                .send_message(*room_id, content, Some(*reply_to))
                .await
                .map(|_| ()),
            Submission::Edit {
                message_id,
                content,
            } => service.edit_message(*message_id, content).await,
        }
    }
}

#[derive(Debug, Default)]
pub struct ComposeStateMachine {
    state: ComposeState,
    sending: bool,
    last_error: Option<String>,
}

impl ComposeStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ComposeState {
        &self.state
    }

    pub fn draft(&self) -> &str {
        self.state.draft()
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reply to `target` with a fresh draft. Drops any edit in progress.
    pub fn start_reply(&mut self, target: &Message) {
        self.state = ComposeState::Replying {
            target: target.clone(),
            draft: String::new(),
        };
    }

    /// Edit `target`, seeding the draft with its current content. Drops any
    /// reply in progress.
    pub fn start_edit(&mut self, target: &Message) {
        self.state = ComposeState::Editing {
            target: target.clone(),
            draft: target.content.clone(),
        };
    }

    /// Leave reply/edit mode and discard its draft. A plain draft is kept.
    pub fn cancel(&mut self) {
        if !self.state.is_idle() {
            self.state = ComposeState::default();
        }
    }

    pub fn text_change(&mut self, text: impl Into<String>) {
        *self.state.draft_mut() = text.into();
    }

    /// Append to whichever draft is active (emoji picker, pasted text).
    pub fn append_text(&mut self, text: &str) {
        self.state.draft_mut().push_str(text);
    }

    /// Validate the current draft into a submission without changing state.
    pub fn prepare(&self, active_room: Option<RoomId>) -> Result<Submission, ChatError> {
        if self.sending {
            return Err(ChatError::SubmitInProgress);
        }
        let room_id = active_room.ok_or(ChatError::NoActiveRoom)?;
        let content = self.state.draft().trim();
        if content.is_empty() {
            return Err(ChatError::EmptyDraft);
        }
        let content = content.to_string();

        Ok(match &self.state {
            ComposeState::Idle { .. } => Submission::Post { room_id, content },
            ComposeState::Replying { target, .. } => Submission::Reply {
                room_id,
                content,
                reply_to: target.id,
            },
            ComposeState::Editing { target, .. } => {
                if target.room_id != room_id {
                    return Err(ChatError::EditTargetOutsideRoom {
                        message_id: target.id,
                        room_id: target.room_id,
                    });
                }
                Submission::Edit {
                    message_id: target.id,
                    content,
                }
            }
        })
    }

    /// `prepare` and mark the machine as sending.
    pub fn begin_submit(&mut self, active_room: Option<RoomId>) -> Result<Submission, ChatError> {
        let submission = self.prepare(active_room)?;
        self.sending = true;
        Ok(submission)
    }

    /// Settle a submission started with `begin_submit`. Success returns to an
    /// empty `Idle`; failure keeps state and draft for a retry.
    pub fn complete_submit(&mut self, result: Result<(), ServiceError>) -> Result<(), ChatError> {
        self.sending = false;
        match result {
            Ok(()) => {
                self.state = ComposeState::default();
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "submit failed");
                let err = ChatError::Submit(e);
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Issue the current draft against `service`.
    pub async fn submit(
        &mut self,
        service: &dyn RemoteChatService,
        active_room: Option<RoomId>,
    ) -> Result<Submission, ChatError> {
        let submission = self.begin_submit(active_room)?;
        let result = submission.execute(service).await;
        self.complete_submit(result)?;
        info!(?submission, "submitted");
        Ok(submission)
    }

    /// Banner text above the compose box, if replying or editing.
    pub fn banner(&self) -> Option<String> {
        match &self.state {
            ComposeState::Idle { .. } => None,
            ComposeState::Replying { target, .. } => {
                Some(format!("Replying to {}", target.author.short_label()))
            }
            ComposeState::Editing { target, .. } => {
                Some(format!("Editing your message #{}", target.id))
            }
        }
    }

    pub fn placeholder(&self, has_room: bool) -> &'static str {
        if !has_room {
            return "No room selected.";
        }
        match self.state {
            ComposeState::Idle { .. } => "Type a message and hit Enter to send…",
            ComposeState::Replying { .. } => "Reply and press Enter…",
            ComposeState::Editing { .. } => "Edit your message and press Enter…",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;
    use crate::service::{MemoryChatService, Operation};

    fn msg(id: MessageId, content: &str) -> Message {
        Message {
            id,
            room_id: 1,
            author: Identity::new("rdmx6-jaaaa-aaaaa-aaadq-cai"),
            content: content.to_string(),
            timestamp: 100,
            reply_to: None,
            edited: false,
            tip_total: 0,
        }
    }

    #[test]
    fn test_reply_then_edit_leaves_only_edit() {
        let mut compose = ComposeStateMachine::new();
        let a = msg(1, "first");
        let b = msg(2, "second");

        compose.start_reply(&a);
        compose.text_change("half typed");
        compose.start_edit(&b);

        assert_eq!(
            compose.state(),
            &ComposeState::Editing {
                target: b.clone(),
                draft: "second".to_string(),
            }
        );

        compose.start_reply(&a);
        assert_eq!(
            compose.state(),
            &ComposeState::Replying {
                target: a,
                draft: String::new(),
            }
        );
    }

    #[test]
    fn test_cancel_returns_to_empty_idle() {
        let mut compose = ComposeStateMachine::new();

        compose.start_reply(&msg(1, "x"));
        compose.text_change("yo");
        compose.cancel();
        assert_eq!(compose.state(), &ComposeState::default());

        compose.start_edit(&msg(2, "old"));
        compose.cancel();
        assert_eq!(compose.state(), &ComposeState::default());

        // a plain draft survives a cancel
        compose.text_change("gm");
        compose.cancel();
        assert_eq!(compose.draft(), "gm");
    }

    #[test]
    fn test_text_change_keeps_target() {
        let mut compose = ComposeStateMachine::new();
        let target = msg(7, "old");
        compose.start_edit(&target);
        compose.text_change("new");
        compose.append_text(" 🚀");

        assert_eq!(compose.state().target(), Some(&target));
        assert_eq!(compose.draft(), "new 🚀");
    }

    #[test]
    fn test_prepare_validates_draft_and_room() {
        let mut compose = ComposeStateMachine::new();
        assert_eq!(compose.prepare(Some(1)), Err(ChatError::EmptyDraft));

        compose.text_change("   ");
        assert_eq!(compose.prepare(Some(1)), Err(ChatError::EmptyDraft));

        compose.text_change("  gm  ");
        assert_eq!(compose.prepare(None), Err(ChatError::NoActiveRoom));
        assert_eq!(
            compose.prepare(Some(3)),
            Ok(Submission::Post {
                room_id: 3,
                content: "gm".to_string(),
            })
        );
    }

    #[test]
    fn test_edit_target_must_be_in_active_room() {
        let mut compose = ComposeStateMachine::new();
        compose.start_edit(&msg(5, "old"));

        assert_eq!(
            compose.prepare(Some(2)),
            Err(ChatError::EditTargetOutsideRoom {
                message_id: 5,
                room_id: 1,
            })
        );
        assert!(matches!(compose.prepare(Some(1)), Ok(Submission::Edit { .. })));
    }

    #[test]
    fn test_second_submit_rejected_while_sending() {
        let mut compose = ComposeStateMachine::new();
        compose.text_change("gm");

        compose.begin_submit(Some(1)).unwrap();
        assert!(compose.is_sending());
        assert_eq!(compose.begin_submit(Some(1)), Err(ChatError::SubmitInProgress));

        compose.complete_submit(Ok(())).unwrap();
        assert!(!compose.is_sending());
        assert_eq!(compose.draft(), "");
    }

    #[test]
    fn test_banner_and_placeholder() {
        let mut compose = ComposeStateMachine::new();
        assert_eq!(compose.banner(), None);
        assert_eq!(compose.placeholder(false), "No room selected.");
        assert_eq!(compose.placeholder(true), "Type a message and hit Enter to send…");

        compose.start_reply(&msg(1, "x"));
        assert_eq!(compose.banner().as_deref(), Some("Replying to rdmx6…cai"));
        assert_eq!(compose.placeholder(true), "Reply and press Enter…");

        compose.start_edit(&msg(42, "x"));
        assert_eq!(compose.banner().as_deref(), Some("Editing your message #42"));
    }

    #[tokio::test]
    async fn test_submit_reply_issues_send_with_parent() {
        let service = MemoryChatService::new(Identity::new("bob"));
        let room = service.seed_room("Global Chat", "", false);
        let parent = service.send_message(room.id, "hi", None).await.unwrap();

        let mut compose = ComposeStateMachine::new();
        compose.start_reply(&parent);
        compose.text_change("yo");
        let submission = compose.submit(&service, Some(room.id)).await.unwrap();

        assert_eq!(
            submission,
            Submission::Reply {
                room_id: room.id,
                content: "yo".to_string(),
                reply_to: parent.id,
            }
        );
        assert_eq!(compose.state(), &ComposeState::default());
        let sent = service.messages_in(room.id);
        assert_eq!(sent.last().map(|m| m.reply_to), Some(Some(parent.id)));
    }

    #[tokio::test]
    async fn test_failed_submit_preserves_reply_and_draft() {
        let service = MemoryChatService::new(Identity::new("bob"));
        let room = service.seed_room("Global Chat", "", false);
        let parent = service.send_message(room.id, "hi", None).await.unwrap();
        service.fail_next(
            Operation::SendMessage,
            ServiceError::Transport("replica unreachable".into()),
        );

        let mut compose = ComposeStateMachine::new();
        compose.start_reply(&parent);
        compose.text_change("yo");
        let err = compose.submit(&service, Some(room.id)).await.unwrap_err();

        assert!(err.is_submit());
        assert_eq!(
            compose.state(),
            &ComposeState::Replying {
                target: parent.clone(),
                draft: "yo".to_string(),
            }
        );
        assert!(!compose.is_sending());
        assert_eq!(
            compose.last_error(),
            Some("Failed to send message: transport error: replica unreachable")
        );

        // retry goes through and clears the error
        compose.submit(&service, Some(room.id)).await.unwrap();
        assert!(compose.state().is_idle());
        assert!(compose.last_error().is_none());
    }
}
