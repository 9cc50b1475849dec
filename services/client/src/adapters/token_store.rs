//! services/client/src/adapters/token_store.rs
//!
//! File-backed implementation of the `CredentialStore` port. The credential is
//! cached in memory for the process lifetime and mirrored to a JSON file so a
//! login survives client restarts.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::warn;

use rag_chat_core::domain::{Credential, UserIdentity};
use rag_chat_core::ports::{CredentialStore, PortError, PortResult};

//=========================================================================================
// "Impure" Persistence Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
struct CredentialRecord {
    access_token: String,
    refresh_token: String,
    user_id: i64,
    username: String,
    email: String,
    role: String,
}

impl CredentialRecord {
    fn from_domain(credential: &Credential) -> Self {
        Self {
            access_token: credential.access_token.clone(),
            refresh_token: credential.refresh_token.clone(),
            user_id: credential.user.user_id,
            username: credential.user.username.clone(),
            email: credential.user.email.clone(),
            role: credential.user.role.clone(),
        }
    }

    fn into_domain(self) -> Credential {
        Credential {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user: UserIdentity {
                user_id: self.user_id,
                username: self.username,
                email: self.email,
                role: self.role,
            },
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A credential store that persists to a JSON file on disk.
pub struct FileTokenStore {
    path: PathBuf,
    current: RwLock<Option<Credential>>,
}

impl FileTokenStore {
    /// Opens the store, loading any credential persisted by a previous run.
    /// A missing, unreadable, or corrupt file is treated as "logged out".
    pub async fn open(path: PathBuf) -> Self {
        let current = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<CredentialRecord>(&bytes) {
                Ok(record) => Some(record.into_domain()),
                Err(e) => {
                    warn!("Ignoring corrupt credential file {}: {e}", path.display());
                    None
                }
            },
            Err(_) => None,
        };
        Self {
            path,
            current: RwLock::new(current),
        }
    }
}

#[async_trait]
impl CredentialStore for FileTokenStore {
    async fn get(&self) -> Option<Credential> {
        self.current.read().await.clone()
    }

    async fn set(&self, credential: Credential) -> PortResult<()> {
        let record = CredentialRecord::from_domain(&credential);
        let bytes = serde_json::to_vec_pretty(&record)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        *self.current.write().await = Some(credential);
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        *self.current.write().await = None;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(token: &str) -> Credential {
        Credential {
            access_token: token.to_string(),
            refresh_token: format!("{token}-refresh"),
            user: UserIdentity {
                user_id: 1,
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                role: "USER".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn credential_survives_a_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");

        let store = FileTokenStore::open(path.clone()).await;
        assert!(store.get().await.is_none());
        store.set(credential("at-1")).await.expect("set");

        let reopened = FileTokenStore::open(path).await;
        let loaded = reopened.get().await.expect("credential should persist");
        assert_eq!(loaded, credential("at-1"));
    }

    #[tokio::test]
    async fn clear_removes_memory_and_disk_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");

        let store = FileTokenStore::open(path.clone()).await;
        store.set(credential("at-1")).await.expect("set");
        store.clear().await.expect("clear");
        assert!(store.get().await.is_none());
        assert!(!path.exists());

        // Clearing an already-empty store is not an error.
        store.clear().await.expect("second clear");

        let reopened = FileTokenStore::open(path).await;
        assert!(reopened.get().await.is_none());
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_logged_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, b"not json").expect("write");

        let store = FileTokenStore::open(path).await;
        assert!(store.get().await.is_none());
    }

    #[tokio::test]
    async fn set_replaces_the_previous_credential() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");

        let store = FileTokenStore::open(path).await;
        store.set(credential("at-1")).await.expect("first set");
        store.set(credential("at-2")).await.expect("second set");
        let loaded = store.get().await.expect("credential present");
        assert_eq!(loaded.access_token, "at-2");
    }
}
