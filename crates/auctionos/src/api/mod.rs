//! Shared plumbing for requests against the admin backend.

mod client;
mod credentials;
mod error;

pub use client::ApiClient;
pub use credentials::{CredentialError, CredentialProvider, NoCredentials, StaticCredentials};
pub use error::TransportError;
