//! crates/rag_chat_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the client's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! orchestration layer to be independent of the concrete HTTP transport and
//! of how the credential is persisted.

use async_trait::async_trait;

use crate::domain::{ChatReply, ChatTurn, Credential, Document, SessionId, UploadFile};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific failures of the HTTP transport and the
/// on-disk credential store.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The backend rejected the credential (HTTP 401). By the time a caller
    /// observes this, the gateway has already torn the session down.
    #[error("Authentication expired")]
    AuthExpired,
    /// The backend answered with a non-success status.
    #[error("Backend rejected the request (status {status})")]
    Rejected {
        status: u16,
        /// The message the server attached to the failure body, when present.
        message: Option<String>,
    },
    /// The operation never produced a backend answer (transport, I/O,
    /// or serialization failure).
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// The server-provided message for a rejection, if there is one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            PortError::Rejected {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The full backend surface consumed by the client, one method per endpoint.
///
/// Implementations are the single egress point for network traffic: they
/// attach the bearer credential when one is present and normalize every
/// failure into a [`PortError`].
#[async_trait]
pub trait BackendGateway: Send + Sync {
    // --- Authentication ---
    async fn login(&self, username: &str, password: &str) -> PortResult<Credential>;

    async fn signup(
        &self,
        username: &str,
        password: &str,
        email: &str,
        name: &str,
    ) -> PortResult<Credential>;

    async fn refresh_token(&self, refresh_token: &str) -> PortResult<Credential>;

    // --- Documents ---
    async fn upload_document(&self, file: &UploadFile) -> PortResult<()>;

    async fn list_documents(&self) -> PortResult<Vec<Document>>;

    async fn get_document(&self, id: i64) -> PortResult<Document>;

    async fn delete_document(&self, id: i64) -> PortResult<()>;

    // --- Chat ---
    async fn send_message(&self, message: &str, session_id: &SessionId) -> PortResult<ChatReply>;

    async fn chat_history(&self, session_id: &SessionId) -> PortResult<Vec<ChatTurn>>;
}

/// Durable storage for the credential, so a login survives process restarts.
///
/// No expiry validation happens here; a stored credential stays "present"
/// until `clear` runs or the backend answers 401.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the current credential, or `None` when logged out.
    async fn get(&self) -> Option<Credential>;

    /// Stores a credential for the process lifetime and across restarts.
    async fn set(&self, credential: Credential) -> PortResult<()>;

    /// Removes the credential from memory and from durable storage. Cached
    /// document and transcript data is stale from this point; resetting those
    /// components is the caller's responsibility.
    async fn clear(&self) -> PortResult<()>;
}
