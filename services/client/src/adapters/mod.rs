pub mod http;
pub mod token_store;

pub use http::HttpGateway;
pub use token_store::FileTokenStore;
