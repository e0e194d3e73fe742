//! Error types for the downstream engine.

use thiserror::Error;

/// Errors raised by a [`crate::client::BuildClient`] implementation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connect, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with a non-success status code.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("unable to decode response: {0}")]
    Decode(String),

    /// The request URL could not be built from the configured server.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The access token cannot be sent as an HTTP header.
    #[error("access token contains characters not allowed in a header")]
    InvalidToken,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

/// Convenience result alias for client calls.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Errors produced while locating, restarting and reconciling builds.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// Missing or invalid plugin configuration.
    #[error("invalid configuration: {0}")]
    ConfigValidation(String),

    /// A repository descriptor is not `org/repo` or `org/repo@branch`.
    #[error("unable to parse repo descriptor: {descriptor}")]
    MalformedDescriptor { descriptor: String },

    /// No build in the scanned history matched the criteria.
    #[error("no {statuses} build with branch {branch} and event {event} found for {repo}")]
    NotFound {
        repo: String,
        branch: String,
        event: String,
        statuses: String,
    },

    /// An API call failed.
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: ClientError,
    },

    /// A triggered build finished outside the target statuses.
    #[error("build {repo}/{number} finished with status {status}")]
    BuildFailed {
        repo: String,
        number: u64,
        status: String,
    },

    /// Triggered builds were still pending when the deadline passed.
    #[error("timed out after {timeout_secs}s waiting on builds: {pending:?}")]
    Timeout {
        timeout_secs: u64,
        pending: Vec<String>,
    },
}

impl DownstreamError {
    /// Wrap a client failure with a description of the failed operation.
    pub fn transport(context: impl Into<String>, source: ClientError) -> Self {
        DownstreamError::Transport {
            context: context.into(),
            source,
        }
    }

    /// `true` for the recoverable "no matching build" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DownstreamError::NotFound { .. })
    }
}

/// Convenience result alias.
pub type DownstreamResult<T> = std::result::Result<T, DownstreamError>;
