//! Mention token extraction and rewriting.
//!
//! A mention is `@handle`, `@DisplayName`, or the reserved `@everyone`,
//! matched case-insensitively. A candidate only matches when both edges sit
//! on a boundary character, so `@alice2` never matches the token `@alice`
//! and `email@alice.com` has no preceding boundary at all. When several
//! tokens could match at one position the longest wins, and the cursor
//! advances past the match so matches never overlap.

use crate::chat::Participant;

/// Reserved token that expands to every participant in the chat.
pub const EVERYONE_TOKEN: &str = "@everyone";

/// Boundary characters accepted before and after a mention token.
/// Kept exactly in sync with the transcript rewrite pass; not extended for
/// other locales.
fn is_boundary_char(ch: char) -> bool {
    ch.is_whitespace()
        || matches!(
            ch,
            '(' | '[' | '{' | '\'' | '"' | '`' | '.' | ',' | ';' | ':' | '!' | '?'
        )
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// True when `token` matches `text` at position `i` and ends on a boundary.
fn token_matches(text: &[char], i: usize, token: &[char]) -> bool {
    let end = i + token.len();
    if end > text.len() {
        return false;
    }
    if !text[i..end]
        .iter()
        .zip(token.iter())
        .all(|(&a, &b)| chars_eq_ignore_case(a, b))
    {
        return false;
    }
    end == text.len() || is_boundary_char(text[end])
}

enum MentionTarget {
    Everyone,
    Participant(String),
}

struct Candidate {
    token: Vec<char>,
    target: MentionTarget,
}

fn build_candidates(participants: &[Participant]) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(participants.len() * 2 + 1);
    candidates.push(Candidate {
        token: EVERYONE_TOKEN.chars().collect(),
        target: MentionTarget::Everyone,
    });
    for p in participants {
        candidates.push(Candidate {
            token: format!("@{}", p.handle).chars().collect(),
            target: MentionTarget::Participant(p.id.clone()),
        });
        // DisplayName mentions are less robust but user-friendly.
        let dn = p.display_name.trim();
        if !dn.is_empty() {
            candidates.push(Candidate {
                token: format!("@{}", dn).chars().collect(),
                target: MentionTarget::Participant(p.id.clone()),
            });
        }
    }
    // Prefer the longest token first to avoid partial matches.
    candidates.sort_by(|a, b| b.token.len().cmp(&a.token.len()));
    candidates
}

/// Extracts the participants mentioned in `text`, in first-mention order,
/// deduplicated. `@everyone` expands to the full roster. Total on any input;
/// side-effect free.
pub fn extract_mentions(text: &str, participants: &[Participant]) -> Vec<String> {
    let candidates = build_candidates(participants);
    let chars: Vec<char> = text.chars().collect();

    let mut mentioned: Vec<String> = Vec::new();
    let mut push = |id: &str, out: &mut Vec<String>| {
        if !out.iter().any(|m| m == id) {
            out.push(id.to_string());
        }
    };

    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '@' {
            i += 1;
            continue;
        }
        if i > 0 && !is_boundary_char(chars[i - 1]) {
            i += 1;
            continue;
        }
        match candidates.iter().find(|c| token_matches(&chars, i, &c.token)) {
            Some(c) => {
                match &c.target {
                    MentionTarget::Everyone => {
                        for p in participants {
                            push(&p.id, &mut mentioned);
                        }
                    }
                    MentionTarget::Participant(id) => push(id, &mut mentioned),
                }
                i += c.token.len();
            }
            None => i += 1,
        }
    }

    mentioned
}

/// A participant rename: old and new handle and display name.
#[derive(Debug, Clone)]
pub struct MentionRewrite {
    pub old_handle: String,
    pub old_display_name: String,
    pub new_handle: String,
    pub new_display_name: String,
}

struct TokenRewrite {
    token: Vec<char>,
    replace_with: String,
}

/// Rewrites mention tokens in `text` after participant renames, using the
/// same boundary and longest-token-first rules as extraction. Non-mention
/// text is untouched.
pub fn rewrite_mentions(text: &str, rewrites: &[MentionRewrite]) -> String {
    let mut token_rewrites: Vec<TokenRewrite> = Vec::new();
    for r in rewrites {
        if !r.old_handle.is_empty() && r.old_handle != r.new_handle {
            token_rewrites.push(TokenRewrite {
                token: format!("@{}", r.old_handle).chars().collect(),
                replace_with: format!("@{}", r.new_handle),
            });
        }
        let old_dn = r.old_display_name.trim();
        if !old_dn.is_empty() && r.old_display_name != r.new_display_name {
            token_rewrites.push(TokenRewrite {
                token: format!("@{}", old_dn).chars().collect(),
                replace_with: format!("@{}", r.new_display_name.trim()),
            });
        }
    }
    if token_rewrites.is_empty() {
        return text.to_string();
    }
    token_rewrites.sort_by(|a, b| b.token.len().cmp(&a.token.len()));

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let at_boundary = chars[i] == '@' && (i == 0 || is_boundary_char(chars[i - 1]));
        if at_boundary {
            if let Some(r) = token_rewrites
                .iter()
                .find(|r| token_matches(&chars, i, &r.token))
            {
                out.push_str(&r.replace_with);
                i += r.token.len();
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}
