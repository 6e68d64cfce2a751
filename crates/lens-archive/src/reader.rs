//! Conversation export parsing.
//!
//! The export schema is a JSON array of conversation objects. Each object
//! carries a `mapping` of message nodes forming a thread: nodes point at
//! their parent, and `current_node` names the tip of the active branch.
//! Loading walks that chain tip-to-root and reverses it, which yields the
//! causal message order.
//!
//! Loading is restartable: re-reading the same archive yields the same
//! records in the same order.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use lens_core::{ConversationRecord, Message, Role};

use crate::error::ArchiveError;

/// Primary export filename, with the shared-link export as fallback.
const ARCHIVE_FILES: [&str; 2] = ["conversations.json", "shared_conversations.json"];

/// Result of loading an archive: the valid records plus how many malformed
/// records were dropped along the way.
#[derive(Debug)]
pub struct ArchiveLoad {
    pub records: Vec<ConversationRecord>,
    pub malformed: usize,
}

/// Reads conversation records out of an export directory.
#[derive(Debug, Clone)]
pub struct ArchiveReader {
    archive_dir: PathBuf,
}

impl ArchiveReader {
    #[must_use]
    pub fn new(archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive_dir: archive_dir.into(),
        }
    }

    /// Locate the export file inside the archive directory.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] when neither export file exists.
    pub fn archive_file(&self) -> Result<PathBuf, ArchiveError> {
        for name in ARCHIVE_FILES {
            let candidate = self.archive_dir.join(name);
            if candidate.exists() {
                return Ok(candidate);
            }
        }
        Err(ArchiveError::NotFound(self.archive_dir.clone()))
    }

    /// Load every valid conversation from the archive.
    ///
    /// A record missing its id or creation time (or otherwise malformed) is
    /// logged and dropped; it never aborts the load.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] when the file is unreadable or the top-level
    /// structure is not a JSON array.
    pub fn load(&self) -> Result<ArchiveLoad, ArchiveError> {
        let path = self.archive_file()?;
        let text = std::fs::read_to_string(&path)?;
        let raw = parse_top_level(&path, &text)?;

        let mut records = Vec::with_capacity(raw.len());
        let mut malformed = 0usize;
        for value in raw {
            match parse_conversation(value) {
                Ok(record) => records.push(record),
                Err(detail) => {
                    warn!(%detail, "dropping malformed conversation record");
                    malformed += 1;
                }
            }
        }
        debug!(
            loaded = records.len(),
            malformed,
            path = %path.display(),
            "archive loaded"
        );
        Ok(ArchiveLoad { records, malformed })
    }

    /// Fetch the raw JSON object of one conversation, as stored in the
    /// archive. Used by the export command so debugging dumps are unfiltered.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::UnknownConversation`] when no record carries
    /// the requested id.
    pub fn load_raw(&self, id: &str) -> Result<serde_json::Value, ArchiveError> {
        let path = self.archive_file()?;
        let text = std::fs::read_to_string(&path)?;
        let raw = parse_top_level(&path, &text)?;
        raw.into_iter()
            .find(|v| v.get("id").and_then(serde_json::Value::as_str) == Some(id))
            .ok_or_else(|| ArchiveError::UnknownConversation(id.to_string()))
    }

    /// Load one parsed conversation by id.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::UnknownConversation`] when the id is absent
    /// (including when the matching record was malformed and dropped).
    pub fn load_one(&self, id: &str) -> Result<ConversationRecord, ArchiveError> {
        let load = self.load()?;
        load.records
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ArchiveError::UnknownConversation(id.to_string()))
    }
}

fn parse_top_level(
    path: &Path,
    text: &str,
) -> Result<Vec<serde_json::Value>, ArchiveError> {
    serde_json::from_str::<Vec<serde_json::Value>>(text).map_err(|e| ArchiveError::Format {
        path: path.to_path_buf(),
        detail: format!("expected a JSON array of conversation objects: {e}"),
    })
}

#[derive(Debug, Deserialize)]
struct RawConversation {
    id: String,
    title: Option<String>,
    create_time: f64,
    #[serde(default)]
    mapping: HashMap<String, RawNode>,
    current_node: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    parent: Option<String>,
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    author: RawAuthor,
    #[serde(default)]
    content: Option<RawContent>,
    create_time: Option<f64>,
    #[serde(default)]
    metadata: RawMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct RawAuthor {
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    content_type: Option<String>,
    #[serde(default)]
    parts: Vec<serde_json::Value>,
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    is_visually_hidden_from_conversation: bool,
}

/// Parse one conversation object, or explain why it is malformed.
fn parse_conversation(value: serde_json::Value) -> Result<ConversationRecord, String> {
    let raw: RawConversation = serde_json::from_value(value).map_err(|e| e.to_string())?;
    if raw.id.is_empty() {
        return Err("empty conversation id".to_string());
    }
    let created_at = epoch_to_datetime(raw.create_time)
        .ok_or_else(|| format!("create_time {} out of range", raw.create_time))?;

    let messages = thread_messages(&raw.mapping, raw.current_node.as_deref());
    Ok(ConversationRecord {
        id: raw.id,
        title: raw.title.filter(|t| !t.is_empty()),
        created_at,
        messages,
    })
}

/// Walk the node chain from the thread tip to the root, then reverse into
/// causal order. A visited set guards against parent cycles in damaged
/// exports.
fn thread_messages(
    mapping: &HashMap<String, RawNode>,
    current_node: Option<&str>,
) -> Vec<Message> {
    let mut messages = Vec::new();
    let mut visited = HashSet::new();
    let mut cursor = current_node;

    while let Some(node_id) = cursor {
        if !visited.insert(node_id.to_string()) {
            warn!(node_id, "cycle in message mapping, truncating thread");
            break;
        }
        let Some(node) = mapping.get(node_id) else {
            break;
        };
        if let Some(message) = node.message.as_ref().and_then(convert_message) {
            messages.push(message);
        }
        cursor = node.parent.as_deref();
    }

    messages.reverse();
    messages
}

fn convert_message(raw: &RawMessage) -> Option<Message> {
    if raw.metadata.is_visually_hidden_from_conversation {
        return None;
    }
    let text = raw.content.as_ref().and_then(extract_text)?;
    if text.is_empty() {
        return None;
    }
    Some(Message {
        role: parse_role(raw.author.role.as_deref()),
        text,
        timestamp: raw.create_time.and_then(epoch_to_datetime),
    })
}

/// Extract display text from the content envelope.
///
/// Handles the three content types the export produces: plain `text`
/// (first part), `multimodal_text` (text and audio-transcription parts
/// joined), and `user_editable_context` (custom-instruction text).
fn extract_text(content: &RawContent) -> Option<String> {
    match content.content_type.as_deref() {
        Some("text") => content
            .parts
            .first()
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        Some("multimodal_text") => {
            let parts: Vec<&str> = content
                .parts
                .iter()
                .filter_map(|part| {
                    let obj = part.as_object()?;
                    match obj.get("content_type").and_then(serde_json::Value::as_str) {
                        Some("text" | "audio_transcription") => {
                            obj.get("text").and_then(serde_json::Value::as_str)
                        }
                        _ => None,
                    }
                })
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        }
        Some("user_editable_context") => content.text.clone(),
        _ => None,
    }
}

fn parse_role(role: Option<&str>) -> Role {
    match role {
        Some("user") => Role::User,
        Some("assistant") => Role::Assistant,
        Some("system") => Role::System,
        _ => Role::Other,
    }
}

fn epoch_to_datetime(epoch: f64) -> Option<DateTime<Utc>> {
    if !epoch.is_finite() || epoch < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (secs, nanos) = (epoch.trunc() as i64, (epoch.fract() * 1e9) as u32);
    DateTime::from_timestamp(secs, nanos)
}
