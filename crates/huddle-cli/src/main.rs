use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod commands;

use app::App;

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "Huddle - multi-agent group chats backed by local AI CLIs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List chats, most recently active first
    Chats,
    /// Create a chat
    NewChat {
        #[arg(long)]
        title: Option<String>,
        /// Shared context included in every agent's prompt
        #[arg(long, default_value = "")]
        context: String,
        /// Agent spec `provider:Display Name[:persona]`, repeatable
        #[arg(long = "agent")]
        agents: Vec<String>,
        /// Let agents read and write their chat workspace
        #[arg(long)]
        roaming: bool,
        /// Roaming without sandbox guardrails
        #[arg(long)]
        yolo: bool,
    },
    /// Edit a chat's title, context, or agent names
    Edit {
        chat_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        context: Option<String>,
        /// Rename an agent: `handle=New Name`, repeatable. Rewrites
        /// historical mentions in the transcript.
        #[arg(long = "rename")]
        renames: Vec<String>,
    },
    /// Show a chat's roster and transcript
    Show {
        chat_id: String,
        #[arg(long, default_value_t = 200)]
        limit: usize,
    },
    /// Send a user message; `@mentions` trigger agent replies
    Send {
        chat_id: String,
        text: String,
        /// Print run records afterwards
        #[arg(long)]
        debug: bool,
    },
    /// Run one agent manually, by handle or id
    Run {
        chat_id: String,
        agent: String,
        #[arg(long)]
        debug: bool,
    },
    /// Continue a paused mention cascade
    Resume {
        chat_id: String,
        #[arg(long)]
        debug: bool,
    },
    /// Delete a message (appends a tombstone)
    DeleteMessage { chat_id: String, message_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = App::open().await?;

    match cli.command {
        Commands::Chats => commands::chats::list(&app).await?,
        Commands::NewChat {
            title,
            context,
            agents,
            roaming,
            yolo,
        } => commands::chats::create(&app, title, context, agents, roaming, yolo).await?,
        Commands::Edit {
            chat_id,
            title,
            context,
            renames,
        } => commands::chats::edit(&app, &chat_id, title, context, renames).await?,
        Commands::Show { chat_id, limit } => commands::chats::show(&app, &chat_id, limit).await?,
        Commands::Send {
            chat_id,
            text,
            debug,
        } => commands::messages::send(&app, &chat_id, &text, debug).await?,
        Commands::Run {
            chat_id,
            agent,
            debug,
        } => commands::messages::run(&app, &chat_id, &agent, debug).await?,
        Commands::Resume { chat_id, debug } => {
            commands::messages::resume(&app, &chat_id, debug).await?
        }
        Commands::DeleteMessage {
            chat_id,
            message_id,
        } => commands::messages::delete(&app, &chat_id, &message_id).await?,
    }

    Ok(())
}
