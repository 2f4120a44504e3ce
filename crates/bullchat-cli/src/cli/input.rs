use bullchat_core::format::parse_amount;
use bullchat_core::MessageId;

/// One-shot command parsed from arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// List the (deduplicated) rooms
    Rooms,
    /// Create a room
    CreateRoom {
        name: String,
        description: String,
        is_private: bool,
    },
    /// Print the message window of a room
    Messages { room: Option<String> },
    /// Post, optionally as a reply
    Send {
        room: Option<String>,
        content: String,
        reply_to: Option<MessageId>,
    },
    /// Edit one of your messages
    Edit {
        room: Option<String>,
        message_id: MessageId,
        content: String,
    },
    /// Tip a message, amount in e8s
    Tip {
        room: Option<String>,
        message_id: MessageId,
        amount: u64,
    },
    /// Print the caller principal
    Whoami,
}

/// A line typed into the interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Plain text: post it, reply with it, or save it as the edit
    Text(String),
    Room(String),
    Reply(MessageId),
    Edit(MessageId),
    Cancel,
    Tip { message_id: MessageId, amount: u64 },
    Rooms,
    Refresh,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub const HELP: &str = "\
/room <name|id>     switch room
/rooms              list rooms
/reply <id>         reply to a message
/edit <id>          edit one of your messages
/cancel             leave reply/edit mode
/tip <id> <amount>  tip a message (whole tokens, e.g. 0.5)
/refresh            re-fetch the current room
/quit               leave";

pub fn parse_line(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ChatInput::Text(line.to_string());
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "room" | "r" if !rest.is_empty() => ChatInput::Room(rest.to_string()),
        "rooms" => ChatInput::Rooms,
        "reply" => parse_id(rest).map_or_else(|| usage("/reply <id>"), ChatInput::Reply),
        "edit" => parse_id(rest).map_or_else(|| usage("/edit <id>"), ChatInput::Edit),
        "cancel" => ChatInput::Cancel,
        "tip" => {
            let mut parts = rest.split_whitespace();
            let message_id = parts.next().and_then(parse_id);
            let amount = parts.next().and_then(parse_amount).filter(|a| *a > 0);
            match (message_id, amount, parts.next()) {
                (Some(message_id), Some(amount), None) => ChatInput::Tip { message_id, amount },
                _ => usage("/tip <id> <amount>"),
            }
        }
        "refresh" => ChatInput::Refresh,
        "help" | "?" => ChatInput::Help,
        "quit" | "q" | "exit" => ChatInput::Quit,
        "room" | "r" => usage("/room <name|id>"),
        other => ChatInput::Invalid(format!("Unknown command /{other}, try /help")),
    }
}

fn parse_id(text: &str) -> Option<MessageId> {
    text.trim().trim_start_matches('#').parse().ok()
}

fn usage(text: &str) -> ChatInput {
    ChatInput::Invalid(format!("Usage: {text}"))
}
