//! services/client/src/adapters/http.rs
//!
//! This module contains the HTTP gateway adapter, the single egress point for
//! every backend call. It implements the `BackendGateway` port from the `core`
//! crate using `reqwest`: it attaches the bearer credential when one is
//! present, normalizes non-success statuses into structured errors, and
//! performs the forced session teardown on any 401 response.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{error, warn};

use rag_chat_core::domain::{
    ChatReply, ChatTurn, Credential, Document, DocumentStatus, SessionId, TurnRole, UploadFile,
    UserIdentity,
};
use rag_chat_core::ports::{BackendGateway, CredentialStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `BackendGateway` port over HTTP.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpGateway {
    /// Creates a new `HttpGateway`. The base URL must not end with a slash.
    pub fn new(base_url: String, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            credentials,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches the bearer credential when one is present, sends the request,
    /// and normalizes the response status.
    ///
    /// A 401 from ANY endpoint clears the credential store before surfacing
    /// `PortError::AuthExpired`; callers observe the teardown as a fait
    /// accompli, never as an ordinary request failure.
    async fn execute(&self, request: RequestBuilder) -> PortResult<Response> {
        let request = match self.credentials.get().await {
            Some(credential) => request.bearer_auth(credential.access_token),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("Backend answered 401; tearing the session down.");
            if let Err(e) = self.credentials.clear().await {
                error!("Failed to clear the stored credential after a 401: {e}");
            }
            return Err(PortError::AuthExpired);
        }
        if !status.is_success() {
            let message = read_error_message(response).await;
            return Err(PortError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> PortResult<T> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

/// Extracts the `error` field the backend attaches to failure bodies.
async fn read_error_message(response: Response) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }
    response
        .json::<ErrorBody>()
        .await
        .ok()
        .map(|body| body.error)
}

//=========================================================================================
// Wire Format Structs
//=========================================================================================

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupBody<'a> {
    username: &'a str,
    password: &'a str,
    email: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatBody<'a> {
    message: &'a str,
    session_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthPayload {
    access_token: String,
    refresh_token: String,
    user_id: i64,
    username: String,
    email: String,
    role: String,
}

impl AuthPayload {
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

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentPayload {
    id: i64,
    original_filename: String,
    status: String,
}

impl DocumentPayload {
    fn into_domain(self) -> PortResult<Document> {
        Ok(Document {
            id: self.id,
            original_filename: self.original_filename,
            status: parse_status(&self.status)?,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatPayload {
    response: String,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(deserialize_with = "deserialize_wire_timestamp")]
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEntryPayload {
    #[serde(rename = "type")]
    kind: String,
    content: String,
    #[serde(deserialize_with = "deserialize_wire_timestamp")]
    timestamp: DateTime<Utc>,
}

impl HistoryEntryPayload {
    fn into_domain(self) -> PortResult<ChatTurn> {
        let role = match self.kind.as_str() {
            "USER" => TurnRole::User,
            "ASSISTANT" => TurnRole::Assistant,
            other => {
                return Err(PortError::Unexpected(format!(
                    "unknown chat turn type '{other}'"
                )))
            }
        };
        Ok(ChatTurn {
            role,
            content: self.content,
            sources: Vec::new(),
            timestamp: self.timestamp,
        })
    }
}

fn parse_status(status: &str) -> PortResult<DocumentStatus> {
    match status {
        "PROCESSING" => Ok(DocumentStatus::Processing),
        "COMPLETED" => Ok(DocumentStatus::Completed),
        "FAILED" => Ok(DocumentStatus::Failed),
        other => Err(PortError::Unexpected(format!(
            "unknown document status '{other}'"
        ))),
    }
}

/// The backend serializes its timestamps without a UTC offset
/// (`2024-01-01T00:00:00`). Accept both offset-bearing and bare forms,
/// treating bare ones as UTC.
fn deserialize_wire_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(serde::de::Error::custom)
}

//=========================================================================================
// `BackendGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn login(&self, username: &str, password: &str) -> PortResult<Credential> {
        let request = self
            .client
            .post(self.url("/auth/login"))
            .json(&LoginBody { username, password });
        let payload: AuthPayload = self.fetch_json(request).await?;
        Ok(payload.into_domain())
    }

    async fn signup(
        &self,
        username: &str,
        password: &str,
        email: &str,
        name: &str,
    ) -> PortResult<Credential> {
        let request = self.client.post(self.url("/auth/signup")).json(&SignupBody {
            username,
            password,
            email,
            name,
        });
        let payload: AuthPayload = self.fetch_json(request).await?;
        Ok(payload.into_domain())
    }

    async fn refresh_token(&self, refresh_token: &str) -> PortResult<Credential> {
        let request = self
            .client
            .post(self.url("/auth/refresh"))
            .json(&RefreshBody { refresh_token });
        let payload: AuthPayload = self.fetch_json(request).await?;
        Ok(payload.into_domain())
    }

    async fn upload_document(&self, file: &UploadFile) -> PortResult<()> {
        let part = multipart::Part::stream(file.data.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.media_type)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let request = self.client.post(self.url("/documents/upload")).multipart(form);
        // The 201 acknowledgment body is discarded; the registry re-fetches
        // the list to pick up the server-assigned id and status.
        self.execute(request).await?;
        Ok(())
    }

    async fn list_documents(&self) -> PortResult<Vec<Document>> {
        let request = self.client.get(self.url("/documents"));
        let payload: Vec<DocumentPayload> = self.fetch_json(request).await?;
        payload
            .into_iter()
            .map(DocumentPayload::into_domain)
            .collect()
    }

    async fn get_document(&self, id: i64) -> PortResult<Document> {
        let request = self.client.get(self.url(&format!("/documents/{id}")));
        let payload: DocumentPayload = self.fetch_json(request).await?;
        payload.into_domain()
    }

    async fn delete_document(&self, id: i64) -> PortResult<()> {
        let request = self.client.delete(self.url(&format!("/documents/{id}")));
        // The acknowledgment body is ignored.
        self.execute(request).await?;
        Ok(())
    }

    async fn send_message(&self, message: &str, session_id: &SessionId) -> PortResult<ChatReply> {
        let request = self.client.post(self.url("/chat")).json(&ChatBody {
            message,
            session_id: session_id.as_str(),
        });
        let payload: ChatPayload = self.fetch_json(request).await?;
        Ok(ChatReply {
            response: payload.response,
            sources: payload.sources,
            timestamp: payload.timestamp,
        })
    }

    async fn chat_history(&self, session_id: &SessionId) -> PortResult<Vec<ChatTurn>> {
        let request = self
            .client
            .get(self.url("/chat/history"))
            .query(&[("sessionId", session_id.as_str())]);
        let payload: Vec<HistoryEntryPayload> = self.fetch_json(request).await?;
        payload
            .into_iter()
            .map(HistoryEntryPayload::into_domain)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_payload_parses_camel_case_fields() {
        let raw = r#"{
            "accessToken": "at-1",
            "refreshToken": "rt-1",
            "userId": 7,
            "username": "alice",
            "email": "alice@example.com",
            "role": "USER"
        }"#;
        let credential = serde_json::from_str::<AuthPayload>(raw)
            .expect("auth payload should parse")
            .into_domain();
        assert_eq!(credential.access_token, "at-1");
        assert_eq!(credential.refresh_token, "rt-1");
        assert_eq!(credential.user.user_id, 7);
        assert_eq!(credential.user.username, "alice");
        assert_eq!(credential.user.role, "USER");
    }

    #[test]
    fn document_payload_maps_status_strings() {
        let raw = r#"{"id": 42, "originalFilename": "policy.pdf", "status": "PROCESSING"}"#;
        let document = serde_json::from_str::<DocumentPayload>(raw)
            .expect("document payload should parse")
            .into_domain()
            .expect("status should be known");
        assert_eq!(document.id, 42);
        assert_eq!(document.original_filename, "policy.pdf");
        assert_eq!(document.status, DocumentStatus::Processing);
    }

    #[test]
    fn unknown_document_status_is_an_error() {
        let raw = r#"{"id": 1, "originalFilename": "a.pdf", "status": "ARCHIVED"}"#;
        let result = serde_json::from_str::<DocumentPayload>(raw)
            .expect("payload should parse")
            .into_domain();
        assert!(matches!(result, Err(PortError::Unexpected(_))));
    }

    #[test]
    fn chat_payload_accepts_offset_bearing_timestamps() {
        let raw = r#"{
            "response": "Refunds are processed within 7 days.",
            "sources": ["policy.pdf"],
            "timestamp": "2024-01-01T00:00:00Z"
        }"#;
        let payload: ChatPayload = serde_json::from_str(raw).expect("chat payload should parse");
        assert_eq!(payload.sources, vec!["policy.pdf".to_string()]);
        assert_eq!(
            payload.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn chat_payload_accepts_bare_backend_timestamps() {
        // The backend serializes LocalDateTime without an offset.
        let raw = r#"{"response": "hi", "timestamp": "2024-01-15T10:30:00"}"#;
        let payload: ChatPayload = serde_json::from_str(raw).expect("chat payload should parse");
        assert!(payload.sources.is_empty());
        assert_eq!(
            payload.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn history_entries_map_type_onto_roles() {
        let raw = r#"[
            {"id": 1, "type": "USER", "content": "hello", "timestamp": "2024-01-01T00:00:00"},
            {"id": 2, "type": "ASSISTANT", "content": "hi", "timestamp": "2024-01-01T00:00:01"}
        ]"#;
        let turns = serde_json::from_str::<Vec<HistoryEntryPayload>>(raw)
            .expect("history should parse")
            .into_iter()
            .map(|entry| entry.into_domain().expect("roles should be known"))
            .collect::<Vec<_>>();
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[1].role, TurnRole::Assistant);
        assert!(turns.iter().all(|turn| turn.sources.is_empty()));
    }

    #[test]
    fn unknown_history_type_is_an_error() {
        let raw = r#"{"id": 1, "type": "SYSTEM", "content": "x", "timestamp": "2024-01-01T00:00:00"}"#;
        let result = serde_json::from_str::<HistoryEntryPayload>(raw)
            .expect("payload should parse")
            .into_domain();
        assert!(matches!(result, Err(PortError::Unexpected(_))));
    }
}
