//! Error types for the client.

use thiserror::Error;

/// Result type for client operations.
pub type CouchResult<T> = Result<T, CouchError>;

/// Errors that can occur while talking to the database.
#[derive(Error, Debug)]
pub enum CouchError {
    /// The document or database does not exist (HTTP 404).
    #[error("{method} {url}: not found: {reason}")]
    NotFound {
        /// HTTP method of the request.
        method: String,
        /// Request URL.
        url: String,
        /// Reason reported by the server.
        reason: String,
    },

    /// The supplied revision is not the current one (HTTP 409).
    #[error("{method} {url}: conflict: {reason}")]
    Conflict {
        /// HTTP method of the request.
        method: String,
        /// Request URL.
        url: String,
        /// Reason reported by the server.
        reason: String,
    },

    /// Credentials were missing or rejected (HTTP 401).
    #[error("{method} {url}: unauthorized: {reason}")]
    Unauthorized {
        /// HTTP method of the request.
        method: String,
        /// Request URL.
        url: String,
        /// Reason reported by the server.
        reason: String,
    },

    /// Any other non-2xx response.
    #[error("{method} {url}: ({status}) {error}: {reason}")]
    Server {
        /// HTTP method of the request.
        method: String,
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error kind reported by the server.
        error: String,
        /// Reason reported by the server.
        reason: String,
    },

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// A body could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// An update or delete was attempted without a revision.
    #[error("document {id} has no revision")]
    MissingRevision {
        /// Document ID.
        id: String,
    },

    /// The caller passed an unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Local I/O error (design directory parsing).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CouchError {
    /// Classifies a non-2xx response.
    pub fn from_status(
        method: &str,
        url: &str,
        status: u16,
        error: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let method = method.to_string();
        let url = url.to_string();
        let reason = reason.into();
        match status {
            401 => CouchError::Unauthorized {
                method,
                url,
                reason,
            },
            404 => CouchError::NotFound {
                method,
                url,
                reason,
            },
            409 => CouchError::Conflict {
                method,
                url,
                reason,
            },
            _ => CouchError::Server {
                method,
                url,
                status,
                error: error.into(),
                reason,
            },
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        CouchError::Transport {
            message: message.into(),
        }
    }

    /// Returns true for [`CouchError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, CouchError::NotFound { .. })
    }

    /// Returns true for [`CouchError::Conflict`].
    pub fn is_conflict(&self) -> bool {
        matches!(self, CouchError::Conflict { .. })
    }

    /// Returns true for [`CouchError::Unauthorized`].
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CouchError::Unauthorized { .. })
    }

    /// Returns the HTTP status behind this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            CouchError::NotFound { .. } => Some(404),
            CouchError::Conflict { .. } => Some(409),
            CouchError::Unauthorized { .. } => Some(401),
            CouchError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CouchError {
    fn from(err: serde_json::Error) -> Self {
        CouchError::Codec(err.to_string())
    }
}
