pub mod auth;
pub mod documents;
pub mod state;
pub mod transcript;


// Re-export the orchestration components to make them easily accessible
// to the binary that wires the client together.
pub use auth::{AuthError, AuthFlow};
pub use documents::{DocumentError, DocumentRegistry};
pub use state::{AppState, DashboardState};
pub use transcript::{ChatError, ChatTranscript, SubmitOutcome};
