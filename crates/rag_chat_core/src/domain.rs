//! crates/rag_chat_core/src/domain.rs
//!
//! Defines the pure, core data structures for the client.
//! These structs are independent of the HTTP wire format and of any
//! persistence format.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// The authenticated user's identity, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
}

/// The access/refresh token pair plus the identity it belongs to.
///
/// A credential is either fully present or entirely absent. The tokens and
/// the identity always travel together; partial population is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserIdentity,
}

/// Opaque identifier correlating all chat turns of one dashboard activation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh identifier. Each dashboard activation gets its own;
    /// identifiers are never reused and never persisted across restarts.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side processing state of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    /// The human-readable label used by the presentation layer.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }
}

/// A server-tracked uploaded file. The server owns this record; the client
/// only ever observes status transitions through a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: i64,
    pub original_filename: String,
    pub status: DocumentStatus,
}

/// Who produced a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

/// A single committed entry in the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
    /// Source citations. Assistant turns may carry them; user turns never do.
    pub sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// The assistant's answer to one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// A file selected for upload, with the media type the caller determined.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub media_type: String,
    pub data: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_match_display_mapping() {
        assert_eq!(DocumentStatus::Processing.label(), "processing");
        assert_eq!(DocumentStatus::Completed.label(), "completed");
        assert_eq!(DocumentStatus::Failed.label(), "failed");
    }

    #[test]
    fn session_ids_are_unique_per_generation() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }
}
