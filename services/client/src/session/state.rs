//! services/client/src/session/state.rs
//!
//! Defines the client's shared and per-activation states.

use std::sync::Arc;

use rag_chat_core::domain::SessionId;
use rag_chat_core::ports::{BackendGateway, CredentialStore};

use crate::config::Config;
use crate::session::documents::DocumentRegistry;
use crate::session::transcript::ChatTranscript;

//=========================================================================================
// AppState (Shared Across the Process)
//=========================================================================================

/// The shared application state, created once at startup and injected into
/// every orchestration component.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn BackendGateway>,
    pub credentials: Arc<dyn CredentialStore>,
    pub config: Arc<Config>,
}

//=========================================================================================
// DashboardState (Specific to One Dashboard Activation)
//=========================================================================================

/// State for a single dashboard activation: a fresh session identifier plus
/// the document and transcript caches that live exactly as long as it does.
///
/// Dropped wholesale when the activation ends, including on forced logout;
/// nothing in here outlives the session it belongs to.
pub struct DashboardState {
    pub session_id: SessionId,
    pub documents: DocumentRegistry,
    pub transcript: ChatTranscript,
}

impl DashboardState {
    /// Creates the per-activation state. The session identifier is generated
    /// here and stays constant until the dashboard is left.
    pub fn new() -> Self {
        let session_id = SessionId::generate();
        Self {
            session_id: session_id.clone(),
            documents: DocumentRegistry::new(),
            transcript: ChatTranscript::new(session_id),
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}
