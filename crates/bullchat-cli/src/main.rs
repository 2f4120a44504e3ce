use std::path::PathBuf;

use anyhow::Result;
use bullchat_cli::cli::demo::demo_session;
use bullchat_cli::cli::run::Output;
use bullchat_cli::cli::{resolve_config, run_chat, run_command, CliCommand};
use bullchat_core::format::parse_amount;
use bullchat_core::session::{self, Session};
use bullchat_core::tracing_setup::init_tracing;
use clap::{Parser, Subcommand};
use tracing::debug;

#[derive(Parser)]
#[command(name = "bullchat")]
#[command(about = "Command line client for bullchat rooms")]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, short, global = true)]
    pretty: bool,

    /// Path to JSON config file (network, host, canisterId, identity, ...)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// "local" or "ic"
    #[arg(long, global = true)]
    network: Option<String>,

    /// Principal to act as (defaults to anonymous)
    #[arg(long, global = true)]
    identity: Option<String>,

    /// Run against a seeded in-memory ledger instead of the network
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List rooms
    Rooms,

    /// Create a room
    CreateRoom {
        /// Room name
        name: String,
        /// Room description
        #[arg(long, short = 'd', default_value = "")]
        description: String,
        /// Mark the room private
        #[arg(long)]
        private: bool,
    },

    /// Show the latest messages of a room
    Messages {
        /// Room name or id (defaults to the first room)
        #[arg(long, short)]
        room: Option<String>,
    },

    /// Post a message
    Send {
        /// Message content
        content: String,
        #[arg(long, short)]
        room: Option<String>,
        /// Reply to this message id
        #[arg(long)]
        reply_to: Option<u64>,
    },

    /// Edit one of your messages
    Edit {
        message_id: u64,
        /// New content
        content: String,
        #[arg(long, short)]
        room: Option<String>,
    },

    /// Tip a message
    Tip {
        message_id: u64,
        /// Whole tokens, e.g. 0.5
        amount: String,
        #[arg(long, short)]
        room: Option<String>,
    },

    /// Show the caller principal
    Whoami,

    /// Interactive chat
    Chat {
        #[arg(long, short)]
        room: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        eprintln!("No command specified. Use --help for usage.");
        std::process::exit(1);
    };

    let config = resolve_config(
        cli.config.as_deref(),
        cli.network.as_deref(),
        cli.identity.as_deref(),
    )?;
    let demo = cli.demo;
    debug!(demo, network = ?config.network, host = %config.host, "resolved config");
    let session = session::global()
        .get_or_try_init(|| async move {
            if demo {
                Ok(demo_session(config))
            } else {
                Session::connect(config)
            }
        })
        .await?;
    let output = Output::new(cli.json, cli.pretty);

    let command = match command {
        Commands::Chat { room } => return run_chat(&session, room).await,
        Commands::Rooms => CliCommand::Rooms,
        Commands::CreateRoom {
            name,
            description,
            private,
        } => CliCommand::CreateRoom {
            name,
            description,
            is_private: private,
        },
        Commands::Messages { room } => CliCommand::Messages { room },
        Commands::Send {
            content,
            room,
            reply_to,
        } => CliCommand::Send {
            room,
            content,
            reply_to,
        },
        Commands::Edit {
            message_id,
            content,
            room,
        } => CliCommand::Edit {
            room,
            message_id,
            content,
        },
        Commands::Tip {
            message_id,
            amount,
            room,
        } => {
            let amount = parse_amount(&amount)
                .filter(|a| *a > 0)
                .ok_or_else(|| anyhow::anyhow!("Invalid tip amount: {amount}"))?;
            CliCommand::Tip {
                room,
                message_id,
                amount,
            }
        }
        Commands::Whoami => CliCommand::Whoami,
    };

    run_command(command, &session, output).await
}
