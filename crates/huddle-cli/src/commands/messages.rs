//! Message-level commands: send, run, resume, delete.

use anyhow::{Result, bail};

use huddle_core::chat::ChatStore;

use crate::app::App;

pub async fn send(app: &App, chat_id: &str, text: &str, debug: bool) -> Result<()> {
    app.usecase.send_user_message(chat_id, text).await?;
    if debug {
        crate::commands::runs::print(app, chat_id)?;
    }
    Ok(())
}

/// Runs one agent manually, by handle or participant id.
pub async fn run(app: &App, chat_id: &str, agent: &str, debug: bool) -> Result<()> {
    let chat = app.store.get_chat(chat_id).await?;
    let participant = chat
        .participants
        .iter()
        .find(|p| p.handle == agent.trim_start_matches('@') || p.id == agent);
    let Some(participant) = participant else {
        bail!("no participant '{agent}' in chat {chat_id}");
    };

    app.usecase.run_participant(chat_id, &participant.id).await?;
    if debug {
        crate::commands::runs::print(app, chat_id)?;
    }
    Ok(())
}

pub async fn resume(app: &App, chat_id: &str, debug: bool) -> Result<()> {
    let outcome = app.usecase.resume(chat_id).await?;
    if outcome.appended.is_empty() && !outcome.paused {
        eprintln!("nothing pending");
    }
    if debug {
        crate::commands::runs::print(app, chat_id)?;
    }
    Ok(())
}

pub async fn delete(app: &App, chat_id: &str, message_id: &str) -> Result<()> {
    app.usecase.delete_message(chat_id, message_id).await?;
    println!("deleted {message_id}");
    Ok(())
}
