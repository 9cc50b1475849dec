pub mod domain;
pub mod ports;

pub use domain::{
    ChatReply, ChatTurn, Credential, Document, DocumentStatus, SessionId, TurnRole, UploadFile,
    UserIdentity,
};
pub use ports::{BackendGateway, CredentialStore, PortError, PortResult};
