//! Chat-level commands: list, create, edit, show.

use anyhow::{Context, Result, bail};

use huddle_core::chat::{
    ChatStore, ChatUpdate, NewChat, NewParticipant, ProviderKind, RoamingConfig, RoamingMode,
};

use crate::app::App;

/// Rotating default colors for new participants.
const PALETTE: &[&str] = &["#e4572e", "#17bebb", "#ffc914", "#76b041", "#8338ec"];

/// Parses an `--agent` spec: `provider:Display Name[:persona]`.
pub fn parse_agent_spec(spec: &str, index: usize) -> Result<NewParticipant> {
    let mut parts = spec.splitn(3, ':');
    let provider: ProviderKind = parts
        .next()
        .unwrap_or_default()
        .trim()
        .parse()
        .with_context(|| format!("unknown provider in agent spec '{spec}' (codex|claude|gemini)"))?;
    let display_name = match parts.next().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => bail!("agent spec '{spec}' is missing a display name"),
    };
    let persona = parts.next().map(str::trim).unwrap_or_default().to_string();
    Ok(NewParticipant {
        provider,
        display_name,
        color_hex: PALETTE[index % PALETTE.len()].to_string(),
        persona,
        roaming: RoamingConfig::default(),
    })
}

pub async fn list(app: &App) -> Result<()> {
    let chats = app.store.list_chats().await?;
    if chats.is_empty() {
        println!("No chats yet. Create one with `huddle new-chat`.");
        return Ok(());
    }
    for chat in chats {
        println!("{}  {}  (updated {})", chat.id, chat.title, chat.updated_at);
    }
    Ok(())
}

pub async fn create(
    app: &App,
    title: Option<String>,
    context: String,
    agents: Vec<String>,
    roaming: bool,
    yolo: bool,
) -> Result<()> {
    let mut participants = Vec::with_capacity(agents.len());
    for (i, spec) in agents.iter().enumerate() {
        let mut p = parse_agent_spec(spec, i)?;
        if roaming || yolo {
            p.roaming = RoamingConfig {
                enabled: true,
                workspace_dir: None,
                mode: if yolo { RoamingMode::Yolo } else { RoamingMode::Safe },
            };
        }
        participants.push(p);
    }

    let chat = app
        .store
        .create_chat(NewChat {
            title,
            context,
            participants,
        })
        .await?;

    println!("Created {}  {}", chat.id, chat.title);
    for p in &chat.participants {
        println!("  @{}  {} ({})", p.handle, p.display_name, p.provider);
    }
    Ok(())
}

/// Edits chat metadata. A rename re-derives the handle and rewrites
/// historical `@mentions` in the transcript.
pub async fn edit(
    app: &App,
    chat_id: &str,
    title: Option<String>,
    context: Option<String>,
    rename: Vec<String>,
) -> Result<()> {
    let chat = app.store.get_chat(chat_id).await?;
    let mut participants = chat.participants.clone();
    for spec in &rename {
        let Some((handle, new_name)) = spec.split_once('=') else {
            bail!("rename spec '{spec}' must be `handle=New Name`");
        };
        let handle = handle.trim().trim_start_matches('@');
        let Some(p) = participants.iter_mut().find(|p| p.handle == handle) else {
            bail!("no participant '@{handle}' in chat {chat_id}");
        };
        p.display_name = new_name.trim().to_string();
    }

    let updated = app
        .store
        .update_chat(ChatUpdate {
            chat_id: chat_id.to_string(),
            title: title.unwrap_or(chat.title),
            context: context.unwrap_or(chat.context),
            participants,
        })
        .await?;

    println!("Updated {}  {}", updated.id, updated.title);
    for p in &updated.participants {
        println!("  @{}  {} ({})", p.handle, p.display_name, p.provider);
    }
    Ok(())
}

pub async fn show(app: &App, chat_id: &str, limit: usize) -> Result<()> {
    let chat = app.store.get_chat(chat_id).await?;
    println!("{}  {}", chat.id, chat.title);
    if !chat.context.trim().is_empty() {
        println!("context: {}", chat.context.trim());
    }
    for p in &chat.participants {
        let roaming = if p.roaming.enabled {
            format!(", roaming/{}", p.roaming.mode)
        } else {
            String::new()
        };
        println!("  @{}  {} ({}{})", p.handle, p.display_name, p.provider, roaming);
    }
    println!();

    for msg in app.usecase.list_messages(chat_id, limit).await? {
        println!("[{}] {}: {}", msg.ts, msg.author_display_name, msg.text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_agent_spec_full() {
        let p = parse_agent_spec("claude:Rev Iewer:reviews code", 0).unwrap();
        assert_eq!(p.provider, ProviderKind::Claude);
        assert_eq!(p.display_name, "Rev Iewer");
        assert_eq!(p.persona, "reviews code");
    }

    #[test]
    fn test_parse_agent_spec_without_persona() {
        let p = parse_agent_spec("gemini:Gem", 1).unwrap();
        assert_eq!(p.provider, ProviderKind::Gemini);
        assert!(p.persona.is_empty());
    }

    #[test]
    fn test_parse_agent_spec_rejects_bad_input() {
        assert!(parse_agent_spec("cursor:Nope", 0).is_err());
        assert!(parse_agent_spec("claude", 0).is_err());
        assert!(parse_agent_spec("claude:  ", 0).is_err());
    }
}
