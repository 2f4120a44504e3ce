//! Display helpers shared by front ends.

use chrono::{Local, TimeZone};

use crate::constants::{E8S_PER_TOKEN, NANOS_PER_MILLI, TOKEN_SYMBOL};
use crate::models::{Identity, Message, MessageId};
use crate::store::ThreadResolver;

/// Nanosecond timestamp as local `HH:MM:SS`; empty if out of range.
pub fn format_time(nanos: u64) -> String {
    let millis = (nanos / NANOS_PER_MILLI) as i64;
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => String::new(),
    }
}

/// Whole-token amount with trailing zeros trimmed: `150_000_000` → `1.5`.
pub fn format_amount(e8s: u64) -> String {
    let whole = e8s / E8S_PER_TOKEN;
    let frac = e8s % E8S_PER_TOKEN;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:08}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Tip line for a message; `None` when nothing has been tipped.
pub fn format_tip(e8s: u64) -> Option<String> {
    (e8s > 0).then(|| format!("Tips: {} {}", format_amount(e8s), TOKEN_SYMBOL))
}

/// Parse a whole-token amount ("0.5", "2") into e8s.
pub fn parse_amount(text: &str) -> Option<u64> {
    let text = text.trim();
    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (text, ""),
    };
    if frac.len() > 8 || (whole.is_empty() && frac.is_empty()) {
        return None;
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: u64 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<8}").parse().ok()?
    };
    whole.checked_mul(E8S_PER_TOKEN)?.checked_add(frac)
}

/// One rendered row of the message window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub author: String,
    pub is_own: bool,
    pub time: String,
    pub content: String,
    pub edited: bool,
    pub reply_to: Option<MessageId>,
    /// `None` for non-replies and for parents outside the window
    pub reply_label: Option<String>,
    pub tip: Option<String>,
}

impl MessageView {
    /// Single-line rendering used by the command line client.
    pub fn to_line(&self) -> String {
        let mut line = format!("[{}] #{} {}", self.time, self.id, self.author);
        if let Some(label) = &self.reply_label {
            line.push_str(&format!(" ↪ {label}"));
        }
        line.push_str(": ");
        line.push_str(&self.content);
        if self.edited {
            line.push_str(" (edited)");
        }
        if let Some(tip) = &self.tip {
            line.push_str(&format!("  [{tip}]"));
        }
        line
    }
}

pub fn render_window(window: &[Message], me: &Identity) -> Vec<MessageView> {
    let threads = ThreadResolver::new(window);
    window
        .iter()
        .map(|message| MessageView {
            id: message.id,
            author: message.author.short_label(),
            is_own: &message.author == me,
            time: format_time(message.timestamp),
            content: message.content.clone(),
            edited: message.edited,
            reply_to: message.reply_to,
            reply_label: threads.reply_label(message),
            tip: format_tip(message.tip_total),
        })
        .collect()
}
