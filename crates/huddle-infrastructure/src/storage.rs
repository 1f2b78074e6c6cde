//! Small async helpers over `tokio::fs` for JSON and JSONL files.
//!
//! Whole-file writes go through a temp file in the same directory followed
//! by a rename, so a crash mid-write never leaves a truncated file behind.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use huddle_core::{HuddleError, Result};

pub async fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await?;
    Ok(())
}

pub async fn path_exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

pub async fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).await?;
    serde_json::from_slice(&bytes).map_err(|e| HuddleError::Serialization {
        format: "json".to_string(),
        message: format!("{}: {}", path.display(), e),
    })
}

pub async fn write_json_file_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut body = serde_json::to_vec_pretty(value)?;
    body.push(b'\n');
    write_atomic(path, &body).await
}

pub async fn append_jsonl_line<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(&line).await?;
    file.flush().await?;
    Ok(())
}

/// Read a JSONL file, skipping blank lines. Lines that fail to parse are
/// skipped with a warning rather than failing the whole read, so one bad
/// record never makes a chat unreadable.
pub async fn read_jsonl_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = fs::read_to_string(path).await?;
    let mut records = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = lineno + 1,
                    error = %e,
                    "skipping unreadable log line"
                );
            }
        }
    }
    Ok(records)
}

pub async fn write_jsonl_file_atomic<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut body = Vec::new();
    for record in records {
        body.extend_from_slice(&serde_json::to_vec(record)?);
        body.push(b'\n');
    }
    write_atomic(path, &body).await
}

pub(crate) async fn write_atomic(path: &Path, body: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| HuddleError::io(format!("no parent directory for {}", path.display())))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let tmp = dir.join(format!(
        ".{}.tmp-{}-{}",
        name,
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(body).await?;
    file.flush().await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Rec {
        n: u32,
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.json");
        write_json_file_atomic(&path, &Rec { n: 7 }).await.unwrap();
        let back: Rec = read_json_file(&path).await.unwrap();
        assert_eq!(back, Rec { n: 7 });
        assert!(!path_exists(&dir.path().join(".rec.json.tmp")).await);
    }

    #[tokio::test]
    async fn test_jsonl_append_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        append_jsonl_line(&path, &Rec { n: 1 }).await.unwrap();
        append_jsonl_line(&path, &Rec { n: 2 }).await.unwrap();
        let records: Vec<Rec> = read_jsonl_file(&path).await.unwrap();
        assert_eq!(records, vec![Rec { n: 1 }, Rec { n: 2 }]);
    }

    #[tokio::test]
    async fn test_jsonl_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        fs::write(&path, "{\"n\":1}\nnot json\n\n{\"n\":2}\n")
            .await
            .unwrap();
        let records: Vec<Rec> = read_jsonl_file(&path).await.unwrap();
        assert_eq!(records, vec![Rec { n: 1 }, Rec { n: 2 }]);
    }
}
