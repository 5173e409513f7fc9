// fortisase-api: Async Rust client for the FortiSASE resource API

pub mod auth;
pub mod client;
pub mod error;
pub mod input;
pub mod transport;

pub use auth::{Credentials, DEFAULT_AUTH_URL, DEFAULT_CLIENT_ID, TokenResponse};
pub use client::{ResourceApi, SaseClient};
pub use error::Error;
pub use input::{InputModel, JsonMap};
pub use transport::{TlsMode, TransportConfig};
