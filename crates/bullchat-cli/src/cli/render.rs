use bullchat_core::format::MessageView;
use bullchat_core::{ChatClient, Room, RoomId};

// ANSI color codes
pub const CYAN: &str = "\x1b[36m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const RED: &str = "\x1b[31m";
pub const WHITE_BOLD: &str = "\x1b[1;37m";
pub const DIM: &str = "\x1b[2m";
pub const RESET: &str = "\x1b[0m";

pub fn room_line(room: &Room, active: Option<RoomId>) -> String {
    let marker = if Some(room.id) == active { "*" } else { " " };
    let lock = if room.is_private { " (private)" } else { "" };
    if room.description.is_empty() {
        format!("{marker} {:>4}  {}{lock}", room.id, room.name)
    } else {
        format!(
            "{marker} {:>4}  {}{lock}  {DIM}{}{RESET}",
            room.id, room.name, room.description
        )
    }
}

/// Colored single-line form of a message row.
pub fn message_line(view: &MessageView) -> String {
    let author_color = if view.is_own { GREEN } else { CYAN };
    let mut line = format!(
        "{DIM}{} #{}{RESET} {author_color}{}{RESET}",
        view.time, view.id, view.author
    );
    if let Some(label) = &view.reply_label {
        line.push_str(&format!(" {DIM}↪ {label}{RESET}"));
    } else if let Some(parent) = view.reply_to {
        line.push_str(&format!(" {DIM}↪ #{parent}{RESET}"));
    }
    line.push_str(": ");
    line.push_str(&view.content);
    if view.edited {
        line.push_str(&format!(" {DIM}(edited){RESET}"));
    }
    if let Some(tip) = &view.tip {
        line.push_str(&format!("  {YELLOW}💰 {tip}{RESET}"));
    }
    line
}

pub fn header(client: &ChatClient) -> String {
    match client.active_room() {
        Some(room) => format!("{WHITE_BOLD}# {}{RESET}  {DIM}{}{RESET}", room.name, room.description),
        None => format!("{DIM}{}{RESET}", client.compose().placeholder(false)),
    }
}

/// Prompt line showing the compose mode.
pub fn prompt(client: &ChatClient) -> String {
    let compose = client.compose();
    match compose.banner() {
        Some(banner) => format!("{DIM}[{banner}]{RESET} > "),
        None => "> ".to_string(),
    }
}

pub fn error_line(text: &str) -> String {
    format!("{RED}{text}{RESET}")
}
