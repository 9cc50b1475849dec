//! services/client/src/session/documents.rs
//!
//! The client-side mirror of the server-known document set.

use tracing::info;

use rag_chat_core::domain::{Document, UploadFile};
use rag_chat_core::ports::{BackendGateway, PortError};

/// The only media type accepted for upload.
pub const ACCEPTED_MEDIA_TYPE: &str = "application/pdf";

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The file was rejected locally; no request was sent and the registry is
    /// unchanged.
    #[error("only PDF files can be uploaded")]
    UnsupportedMediaType { media_type: String },
    /// The backend refused the upload; the registry is unchanged.
    #[error("failed to upload the document")]
    UploadFailed(#[source] PortError),
    /// The backend refused the deletion; the registry is unchanged.
    #[error("failed to delete the document")]
    DeleteFailed(#[source] PortError),
    /// A refresh failed, or the session was torn down mid-call.
    #[error(transparent)]
    Port(#[from] PortError),
}

/// A read-mostly cache of the server's document list.
///
/// The server stays the source of truth: the cache is only ever replaced
/// wholesale by `refresh`, never advanced locally. This guards against drift
/// from server-side processing the client cannot observe directly.
#[derive(Default)]
pub struct DocumentRegistry {
    documents: Vec<Document>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Replaces the cached list with the backend's current document set.
    /// On failure the cache keeps its previous contents.
    pub async fn refresh(&mut self, gateway: &dyn BackendGateway) -> Result<(), DocumentError> {
        let documents = gateway.list_documents().await?;
        self.documents = documents;
        Ok(())
    }

    /// Validates and uploads a file, then re-fetches the list so the new
    /// document's server-assigned id and status become visible.
    pub async fn request_upload(
        &mut self,
        gateway: &dyn BackendGateway,
        file: &UploadFile,
    ) -> Result<(), DocumentError> {
        if file.media_type != ACCEPTED_MEDIA_TYPE {
            return Err(DocumentError::UnsupportedMediaType {
                media_type: file.media_type.clone(),
            });
        }

        gateway.upload_document(file).await.map_err(|e| match e {
            PortError::AuthExpired => DocumentError::Port(e),
            other => DocumentError::UploadFailed(other),
        })?;
        info!("Uploaded '{}'; refreshing the document list.", file.filename);
        self.refresh(gateway).await
    }

    /// Deletes a document the user has already confirmed, then re-fetches the
    /// list. Obtaining the confirmation is the caller's responsibility; this
    /// operation must not be reached without it.
    pub async fn request_delete(
        &mut self,
        gateway: &dyn BackendGateway,
        id: i64,
    ) -> Result<(), DocumentError> {
        gateway.delete_document(id).await.map_err(|e| match e {
            PortError::AuthExpired => DocumentError::Port(e),
            other => DocumentError::DeleteFailed(other),
        })?;
        // The deletion is confirmed; drop the entry at once and let the
        // follow-up refresh re-mirror the server.
        self.documents.retain(|document| document.id != id);
        info!("Deleted document {id}; refreshing the document list.");
        self.refresh(gateway).await
    }

    /// Fetches a single document's current state straight from the backend,
    /// without touching the cache.
    pub async fn fetch_document(
        &self,
        gateway: &dyn BackendGateway,
        id: i64,
    ) -> Result<Document, DocumentError> {
        Ok(gateway.get_document(id).await?)
    }
}
