//! Error types for building the HTTP client

use thiserror::Error;

/// Errors that can occur constructing an [`HttpEventStore`](crate::HttpEventStore)
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// The base URL is not an absolute `http`/`https` URL
    #[error("Invalid event store URL '{0}'")]
    InvalidBaseUrl(String),

    /// The underlying HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}
