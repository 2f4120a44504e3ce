use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use bullchat_core::events::{self, CoreEvent};
use bullchat_core::format::{format_amount, MessageView};
use bullchat_core::{ChatClient, ChatError, MessageId, RoomId, Session};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::input::{parse_line, ChatInput, HELP};
use super::render::{error_line, header, message_line, prompt, room_line, DIM, RESET};

/// Rows already printed for the current room, so a poll only prints what
/// is new or changed.
#[derive(Default)]
struct Transcript {
    room: Option<RoomId>,
    shown: HashMap<MessageId, MessageView>,
}

impl Transcript {
    /// Lines to print for the current window.
    fn update(&mut self, room: Option<RoomId>, views: Vec<MessageView>) -> Vec<String> {
        if room != self.room {
            self.room = room;
            self.shown.clear();
        }
        let mut lines = Vec::new();
        for view in views {
            if self.shown.get(&view.id) != Some(&view) {
                lines.push(message_line(&view));
                self.shown.insert(view.id, view);
            }
        }
        lines
    }
}

fn print_prompt(client: &ChatClient) {
    print!("{}", prompt(client));
    std::io::stdout().flush().ok();
}

fn print_window(client: &ChatClient, transcript: &mut Transcript) {
    let room = client.active_room().map(|r| r.id);
    for line in transcript.update(room, client.render()) {
        println!("{line}");
    }
}

fn print_rooms(client: &ChatClient) {
    let active = client.active_room().map(|r| r.id);
    for room in client.rooms() {
        println!("{}", room_line(room, active));
    }
}

/// Interactive session: plain lines post (or reply/edit), slash commands
/// steer. Incoming polls are printed between prompts.
pub async fn run_chat(session: &Session, room: Option<String>) -> Result<()> {
    let (tx, mut rx) = events::channel();
    let mut client = ChatClient::new(session).with_events(tx);
    let mut transcript = Transcript::default();

    if let Err(e) = client.start().await {
        println!("{}", error_line(&e.to_string()));
    }
    if let Some(room) = room {
        if let Err(e) = client.select_room_by_name(&room).await {
            println!("{}", error_line(&e.to_string()));
        }
    }
    println!("{}", header(&client));
    println!("{DIM}Type a message, or /help for commands.{RESET}");
    print_window(&client, &mut transcript);
    print_prompt(&client);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_input(&mut client, &mut transcript, parse_line(&line)).await {
                    break;
                }
                print_prompt(&client);
            }
            Some(event) = rx.recv() => {
                match event {
                    CoreEvent::MessagesChanged { .. } => {
                        let room = client.active_room().map(|r| r.id);
                        let updates = transcript.update(room, client.render());
                        if !updates.is_empty() {
                            println!();
                            for line in updates {
                                println!("{line}");
                            }
                            print_prompt(&client);
                        }
                    }
                    CoreEvent::RoomsChanged => {}
                    CoreEvent::Error(text) => {
                        println!();
                        println!("{}", error_line(&text));
                        print_prompt(&client);
                    }
                }
            }
        }
    }

    client.shutdown();
    Ok(())
}

/// Lines to print after `/room <name>`. The header and window follow the
/// active room even when the fetch for it failed.
async fn switch_room(client: &mut ChatClient, transcript: &mut Transcript, name: &str) -> Vec<String> {
    let before = client.active_room().map(|r| r.id);
    let result = client.select_room_by_name(name).await;
    let room = client.active_room().map(|r| r.id);

    let mut lines = Vec::new();
    if result.is_ok() || room != before {
        lines.push(header(client));
        lines.extend(transcript.update(room, client.render()));
    }
    match result {
        // fetch failures already arrive as events
        Ok(()) => {}
        Err(e) if e.is_fetch() => {}
        Err(e) => lines.push(error_line(&e.to_string())),
    }
    lines
}

/// Returns `false` when the session should end.
async fn handle_input(client: &mut ChatClient, transcript: &mut Transcript, input: ChatInput) -> bool {
    match input {
        ChatInput::Quit => return false,
        ChatInput::Empty => {}
        ChatInput::Help => println!("{HELP}"),
        ChatInput::Invalid(text) => println!("{}", error_line(&text)),
        ChatInput::Rooms => print_rooms(client),
        ChatInput::Room(name) => {
            for line in switch_room(client, transcript, &name).await {
                println!("{line}");
            }
        }
        ChatInput::Refresh => {
            if let Err(ChatError::NoActiveRoom) = client.refresh_messages().await {
                println!("{}", error_line(&ChatError::NoActiveRoom.to_string()));
            }
        }
        ChatInput::Reply(id) => {
            if let Err(e) = client.start_reply(id) {
                println!("{}", error_line(&e.to_string()));
            }
        }
        ChatInput::Edit(id) => match client.start_edit(id) {
            Ok(()) => println!("{DIM}current: {}{RESET}", client.compose().draft()),
            Err(e) => println!("{}", error_line(&e.to_string())),
        },
        ChatInput::Cancel => client.cancel_compose(),
        ChatInput::Tip { message_id, amount } => match client.tip(message_id, amount).await {
            Ok(()) => println!("{DIM}tipped #{message_id} {} ICP{RESET}", format_amount(amount)),
            Err(e) if matches!(e, ChatError::Tip(_)) => {}
            Err(e) => println!("{}", error_line(&e.to_string())),
        },
        ChatInput::Text(text) => {
            client.text_change(text);
            match client.submit().await {
                Ok(_) => print_window(client, transcript),
                // submit failures already arrive as events; draft is kept
                Err(e) if e.is_submit() => {}
                Err(e) => println!("{}", error_line(&e.to_string())),
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: MessageId, content: &str) -> MessageView {
        MessageView {
            id,
            author: "bob".into(),
            is_own: false,
            time: "12:00:00".into(),
            content: content.into(),
            edited: false,
            reply_to: None,
            reply_label: None,
            tip: None,
        }
    }

    #[tokio::test]
    async fn test_switch_room_prints_header_when_fetch_fails() {
        use std::sync::Arc;

        use bullchat_core::error::ServiceError;
        use bullchat_core::service::Operation;
        use bullchat_core::session::StaticIdentityProvider;
        use bullchat_core::{CoreConfig, Identity, MemoryChatService};

        let me = Identity::new("alice-principal");
        let memory = Arc::new(MemoryChatService::new(me.clone()));
        memory.seed_room("Global Chat", "", false);
        memory.seed_room("Traders", "Charts and calls", false);
        let session = Session::new(
            CoreConfig::default(),
            Arc::new(StaticIdentityProvider::new(me)),
            memory.clone(),
        );
        let mut client = ChatClient::new(&session);
        let mut transcript = Transcript::default();
        client.start().await.unwrap();

        memory.fail_next(
            Operation::ListMessages,
            ServiceError::Transport("gateway down".into()),
        );
        let lines = switch_room(&mut client, &mut transcript, "Traders").await;
        assert_eq!(client.active_room().map(|r| r.name.as_str()), Some("Traders"));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("# Traders"));

        let lines = switch_room(&mut client, &mut transcript, "Nowhere").await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Nowhere"));
        client.shutdown();
    }

    #[test]
    fn test_transcript_prints_only_new_or_changed_rows() {
        let mut transcript = Transcript::default();
        assert_eq!(transcript.update(Some(1), vec![view(1, "a"), view(2, "b")]).len(), 2);
        assert!(transcript.update(Some(1), vec![view(1, "a"), view(2, "b")]).is_empty());

        let mut edited = view(2, "b2");
        edited.edited = true;
        let lines = transcript.update(Some(1), vec![view(1, "a"), edited, view(3, "c")]);
        assert_eq!(lines.len(), 2);

        // a room switch starts over
        assert_eq!(transcript.update(Some(2), vec![view(1, "a")]).len(), 1);
    }
}
