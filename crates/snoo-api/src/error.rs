use thiserror::Error;

/// SNOO API client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Username or password was unusable.
    #[error("invalid credentials: {reason}")]
    InvalidCredentials { reason: &'static str },
    /// The configured base URL could not be parsed.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// The request never produced a response (connection, TLS, timeout).
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// The login endpoint rejected the credentials.
    #[error("authentication failed: {status}")]
    Authentication { status: String },
    /// An authenticated call returned a non-success status.
    #[error("API error: {status}")]
    Api { status: String },
    /// The response body was not the expected JSON.
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}
