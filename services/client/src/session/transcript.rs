//! services/client/src/session/transcript.rs
//!
//! The ordered, append-only chat transcript and the state machine for one
//! message exchange: optimistic user turn, in-flight guard, assistant turn
//! (or fallback substitute) on resolution.

use chrono::Utc;
use tracing::{error, info};

use rag_chat_core::domain::{ChatReply, ChatTurn, SessionId, TurnRole};
use rag_chat_core::ports::{BackendGateway, PortError, PortResult};

/// Fixed assistant reply substituted when a submission fails.
pub const FALLBACK_ANSWER: &str =
    "Sorry, something went wrong while generating a response. Please try again.";

/// Transient label shown while a response is being generated. Never becomes a
/// committed transcript entry.
pub const GENERATING_PLACEHOLDER: &str = "Generating a response...";

/// What a call to [`ChatTranscript::submit`] did.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The exchange ran to completion: an assistant turn (answer or fallback)
    /// was appended after the user turn.
    Completed,
    /// Another exchange was already in flight; nothing was appended.
    InFlight,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The message contained no visible characters; no turn was appended and
    /// no request was sent.
    #[error("message must not be empty")]
    EmptyMessage,
    /// The session was torn down mid-exchange (HTTP 401). The transcript is
    /// stale and must be discarded along with the session.
    #[error("authentication expired")]
    AuthExpired,
}

/// Ordered, append-only log of chat turns for one session.
///
/// The per-exchange state machine is explicit: `begin_exchange` commits the
/// user turn and raises the in-flight marker, and exactly one of
/// `complete_exchange`, `fail_exchange`, or `abort_exchange` lowers it again.
/// [`ChatTranscript::submit`] drives a full exchange against the backend.
pub struct ChatTranscript {
    session_id: SessionId,
    turns: Vec<ChatTurn>,
    awaiting_response: bool,
}

impl ChatTranscript {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            turns: Vec::new(),
            awaiting_response: false,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// True while a request is in flight. Presentation shows
    /// [`GENERATING_PLACEHOLDER`] during this window.
    pub fn awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    //=====================================================================================
    // Exchange state machine
    //=====================================================================================

    /// Commits the user turn optimistically and raises the in-flight marker.
    ///
    /// Returns `Ok(false)` without touching the transcript when another
    /// exchange is already in flight, and `EmptyMessage` when the trimmed
    /// message is empty. No request may be sent in either case.
    pub fn begin_exchange(&mut self, message: &str) -> Result<bool, ChatError> {
        if self.awaiting_response {
            return Ok(false);
        }
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        self.turns.push(ChatTurn {
            role: TurnRole::User,
            content: message.to_string(),
            sources: Vec::new(),
            timestamp: Utc::now(),
        });
        self.awaiting_response = true;
        Ok(true)
    }

    /// Appends the assistant's answer, with the server-supplied timestamp and
    /// citations, and returns the transcript to idle.
    pub fn complete_exchange(&mut self, reply: ChatReply) {
        self.turns.push(ChatTurn {
            role: TurnRole::Assistant,
            content: reply.response,
            sources: reply.sources,
            timestamp: reply.timestamp,
        });
        self.awaiting_response = false;
    }

    /// Appends the fixed fallback answer and returns the transcript to idle.
    /// The failure is not fatal: the next submission may start immediately.
    pub fn fail_exchange(&mut self) {
        self.turns.push(ChatTurn {
            role: TurnRole::Assistant,
            content: FALLBACK_ANSWER.to_string(),
            sources: Vec::new(),
            timestamp: Utc::now(),
        });
        self.awaiting_response = false;
    }

    /// Lowers the in-flight marker without appending anything. Used when the
    /// session is torn down mid-exchange and the transcript is discarded with it.
    pub fn abort_exchange(&mut self) {
        self.awaiting_response = false;
    }

    //=====================================================================================
    // Exchange driver
    //=====================================================================================

    /// Runs one full message exchange against the backend.
    ///
    /// Network and server failures are converted into the visible fallback
    /// assistant turn rather than propagated; only session teardown surfaces
    /// as an error.
    pub async fn submit(
        &mut self,
        gateway: &dyn BackendGateway,
        message: &str,
    ) -> Result<SubmitOutcome, ChatError> {
        if !self.begin_exchange(message)? {
            return Ok(SubmitOutcome::InFlight);
        }

        match gateway.send_message(message, &self.session_id).await {
            Ok(reply) => {
                self.complete_exchange(reply);
                Ok(SubmitOutcome::Completed)
            }
            Err(PortError::AuthExpired) => {
                self.abort_exchange();
                Err(ChatError::AuthExpired)
            }
            Err(e) => {
                error!("Chat submission failed: {e}");
                self.fail_exchange();
                Ok(SubmitOutcome::Completed)
            }
        }
    }

    /// Replaces the local transcript with the server-side history for this
    /// session. Only meaningful while no exchange is in flight.
    pub async fn hydrate(&mut self, gateway: &dyn BackendGateway) -> PortResult<()> {
        let turns = gateway.chat_history(&self.session_id).await?;
        info!(
            "Hydrated {} chat turns for session {}.",
            turns.len(),
            self.session_id
        );
        self.turns = turns;
        Ok(())
    }
}
