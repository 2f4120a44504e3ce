use std::collections::HashMap;

use crate::models::{Message, MessageId};

/// Resolves reply references against the currently loaded window only.
///
/// A parent outside the window is not an error; the label is just omitted.
pub struct ThreadResolver<'a> {
    by_id: HashMap<MessageId, &'a Message>,
}

impl<'a> ThreadResolver<'a> {
    pub fn new(window: &'a [Message]) -> Self {
        Self {
            by_id: window.iter().map(|m| (m.id, m)).collect(),
        }
    }

    pub fn parent_of(&self, message: &Message) -> Option<&'a Message> {
        message
            .reply_to
            .and_then(|parent| self.by_id.get(&parent).copied())
    }

    /// Shortened author label of the replied-to message, if it is loaded.
    pub fn reply_label(&self, message: &Message) -> Option<String> {
        self.parent_of(message).map(|parent| parent.author.short_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;

    fn msg(id: MessageId, author: &str, reply_to: Option<MessageId>) -> Message {
        Message {
            id,
            room_id: 1,
            author: Identity::new(author),
            content: format!("message {id}"),
            timestamp: id * 100,
            reply_to,
            edited: false,
            tip_total: 0,
        }
    }

    #[test]
    fn test_reply_label_uses_short_parent_author() {
        let window = vec![
            msg(1, "rdmx6-jaaaa-aaaaa-aaadq-cai", None),
            msg(2, "bob", Some(1)),
            msg(3, "carol", Some(2)),
        ];
        let resolver = ThreadResolver::new(&window);

        assert_eq!(resolver.reply_label(&window[1]).as_deref(), Some("rdmx6…cai"));
        assert_eq!(resolver.reply_label(&window[2]).as_deref(), Some("bob"));
        assert_eq!(resolver.parent_of(&window[2]).map(|m| m.id), Some(2));
    }

    #[test]
    fn test_missing_parent_is_silently_omitted() {
        let window = vec![msg(10, "bob", Some(4))];
        let resolver = ThreadResolver::new(&window);

        assert!(resolver.parent_of(&window[0]).is_none());
        assert!(resolver.reply_label(&window[0]).is_none());
    }

    #[test]
    fn test_non_reply_has_no_label() {
        let window = vec![msg(1, "alice", None)];
        assert!(ThreadResolver::new(&window).reply_label(&window[0]).is_none());
    }
}
