use anyhow::Result;
use bullchat_core::format::{format_amount, render_window};
use bullchat_core::{ChatClient, Session, Submission};
use serde::Serialize;
use serde_json::json;

use super::input::CliCommand;
use super::render::{message_line, room_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Text,
    Json,
    PrettyJson,
}

impl Output {
    pub fn new(json: bool, pretty: bool) -> Self {
        match (json, pretty) {
            (_, true) => Output::PrettyJson,
            (true, false) => Output::Json,
            _ => Output::Text,
        }
    }

    fn print_json<T: Serialize>(self, value: &T) -> Result<()> {
        if self == Output::PrettyJson {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", serde_json::to_string(value)?);
        }
        Ok(())
    }
}

/// Execute a one-shot command against `session` and print the result.
pub async fn run_command(command: CliCommand, session: &Session, output: Output) -> Result<()> {
    let mut client = ChatClient::new(session);
    let result = execute(&mut client, command, output).await;
    client.shutdown();
    result
}

async fn execute(client: &mut ChatClient, command: CliCommand, output: Output) -> Result<()> {
    match command {
        CliCommand::Whoami => {
            let identity = client.whoami().await?;
            match output {
                Output::Text => println!("{identity}"),
                _ => output.print_json(&json!({
                    "identity": identity,
                    "anonymous": identity.is_anonymous(),
                }))?,
            }
        }
        CliCommand::Rooms => {
            client.start().await?;
            match output {
                Output::Text => {
                    let active = client.active_room().map(|r| r.id);
                    for room in client.rooms() {
                        println!("{}", room_line(room, active));
                    }
                }
                _ => output.print_json(&client.rooms())?,
            }
        }
        CliCommand::CreateRoom {
            name,
            description,
            is_private,
        } => {
            client.start().await?;
            let room = client.create_room(&name, &description, is_private).await?;
            match output {
                Output::Text => println!("Created room #{} {}", room.id, room.name),
                _ => output.print_json(&room)?,
            }
        }
        CliCommand::Messages { room } => {
            open(client, room.as_deref()).await?;
            print_window(client, output)?;
        }
        CliCommand::Send {
            room,
            content,
            reply_to,
        } => {
            open(client, room.as_deref()).await?;
            if let Some(parent) = reply_to {
                client.start_reply(parent)?;
            }
            client.text_change(content);
            let submission = client.submit().await?;
            print_submission(&submission, output)?;
        }
        CliCommand::Edit {
            room,
            message_id,
            content,
        } => {
            open(client, room.as_deref()).await?;
            client.start_edit(message_id)?;
            client.text_change(content);
            let submission = client.submit().await?;
            print_submission(&submission, output)?;
        }
        CliCommand::Tip {
            room,
            message_id,
            amount,
        } => {
            open(client, room.as_deref()).await?;
            client.tip(message_id, amount).await?;
            match output {
                Output::Text => println!("Tipped #{message_id} {} ICP", format_amount(amount)),
                _ => output.print_json(&json!({
                    "message_id": message_id,
                    "amount_e8s": amount,
                }))?,
            }
        }
    }
    Ok(())
}

async fn open(client: &mut ChatClient, room: Option<&str>) -> Result<()> {
    client.start().await?;
    if let Some(room) = room {
        client.select_room_by_name(room).await?;
    }
    Ok(())
}

fn print_window(client: &ChatClient, output: Output) -> Result<()> {
    let messages = client.messages();
    match output {
        Output::Text => {
            for view in render_window(&messages, client.identity()) {
                println!("{}", message_line(&view));
            }
        }
        _ => output.print_json(&messages)?,
    }
    Ok(())
}

fn print_submission(submission: &Submission, output: Output) -> Result<()> {
    let (text, value) = match submission {
        Submission::Post { room_id, content } => (
            format!("Sent to room {room_id}"),
            json!({ "action": "post", "room_id": room_id, "content": content }),
        ),
        Submission::Reply {
            room_id,
            content,
            reply_to,
        } => (
            format!("Replied to #{reply_to} in room {room_id}"),
            json!({
                "action": "reply",
                "room_id": room_id,
                "content": content,
                "reply_to": reply_to,
            }),
        ),
        Submission::Edit {
            message_id,
            content,
        } => (
            format!("Edited #{message_id}"),
            json!({ "action": "edit", "message_id": message_id, "content": content }),
        ),
    };
    match output {
        Output::Text => println!("{text}"),
        _ => output.print_json(&value)?,
    }
    Ok(())
}
