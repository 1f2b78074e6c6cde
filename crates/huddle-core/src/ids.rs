//! Prefixed identifiers and timestamps.
//!
//! Every persisted record carries an id of the form `<prefix>_<uuid>` so a
//! bare id string is still recognizable in logs and on disk.

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// Creates a new id with the given prefix, e.g. `new_id("m")` -> `m_<uuid>`.
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4())
}

/// Current UTC time as an RFC 3339 string with millisecond precision.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
