//! services/client/src/session/auth.rs
//!
//! Login and signup orchestration: calls the backend and populates the
//! credential store on success.

use std::sync::Arc;

use tracing::info;

use rag_chat_core::domain::UserIdentity;
use rag_chat_core::ports::{BackendGateway, CredentialStore, PortError};

/// Fixed fallback shown when the backend rejects a login without a message.
const LOGIN_FAILED: &str = "Login failed. Please try again.";
/// Fixed fallback shown when the backend rejects a signup without a message.
const SIGNUP_FAILED: &str = "Signup failed. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A required field was left empty; no request was sent.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// The attempt was rejected; the message is safe to display.
    #[error("{0}")]
    Rejected(String),
    /// The operation needs a stored credential and none is present.
    #[error("not logged in")]
    NotAuthenticated,
    /// The credential could not be persisted or cleared.
    #[error(transparent)]
    Storage(PortError),
}

/// Orchestrates authentication against the backend and owns nothing itself:
/// the outcome of every successful call lands in the credential store.
pub struct AuthFlow {
    gateway: Arc<dyn BackendGateway>,
    credentials: Arc<dyn CredentialStore>,
}

impl AuthFlow {
    pub fn new(gateway: Arc<dyn BackendGateway>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            gateway,
            credentials,
        }
    }

    /// Authenticates with the backend and stores the returned credential.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserIdentity, AuthError> {
        require(username, "username")?;
        require(password, "password")?;

        let credential = self
            .gateway
            .login(username, password)
            .await
            .map_err(|e| rejection(e, LOGIN_FAILED))?;
        let identity = credential.user.clone();
        self.credentials
            .set(credential)
            .await
            .map_err(AuthError::Storage)?;
        info!("User '{}' logged in.", identity.username);
        Ok(identity)
    }

    /// Registers a new account and stores the returned credential.
    pub async fn signup(
        &self,
        username: &str,
        password: &str,
        email: &str,
        name: &str,
    ) -> Result<UserIdentity, AuthError> {
        require(username, "username")?;
        require(password, "password")?;
        require(email, "email")?;
        require(name, "name")?;

        let credential = self
            .gateway
            .signup(username, password, email, name)
            .await
            .map_err(|e| rejection(e, SIGNUP_FAILED))?;
        let identity = credential.user.clone();
        self.credentials
            .set(credential)
            .await
            .map_err(AuthError::Storage)?;
        info!("User '{}' registered.", identity.username);
        Ok(identity)
    }

    /// Exchanges the stored refresh token for a fresh credential pair.
    ///
    /// There is no automatic trigger for this; callers decide when a refresh
    /// is worthwhile.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let Some(credential) = self.credentials.get().await else {
            return Err(AuthError::NotAuthenticated);
        };
        let refreshed = self
            .gateway
            .refresh_token(&credential.refresh_token)
            .await
            .map_err(|e| rejection(e, LOGIN_FAILED))?;
        self.credentials
            .set(refreshed)
            .await
            .map_err(AuthError::Storage)
    }

    /// Discards the stored credential. Cached documents and transcripts are
    /// stale from this point and must be rebuilt by the caller.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.credentials
            .clear()
            .await
            .map_err(AuthError::Storage)?;
        info!("Logged out.");
        Ok(())
    }
}

fn require(value: &str, field: &'static str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Maps a gateway failure onto a displayable rejection, preferring the
/// server-provided message. A 401 is folded into the generic message: the
/// gateway has already torn down whatever session existed, and an "expired
/// session" error must never reach the user.
fn rejection(error: PortError, fallback: &str) -> AuthError {
    match error {
        PortError::Rejected {
            message: Some(message),
            ..
        } => AuthError::Rejected(message),
        PortError::AuthExpired | PortError::Rejected { .. } | PortError::Unexpected(_) => {
            AuthError::Rejected(fallback.to_string())
        }
    }
}
