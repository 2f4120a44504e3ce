pub mod chat;
pub mod config;
pub mod demo;
pub mod input;
pub mod render;
pub mod run;

pub use chat::run_chat;
pub use config::resolve_config;
pub use input::{parse_line, ChatInput, CliCommand};
pub use run::run_command;
