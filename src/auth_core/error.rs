use std::fmt;
use std::io;
use std::time::Duration;

use super::http_client::{HttpClientError, HttpRequest, HttpResponse};

/// Failures raised by a persistent key-value backend.
#[derive(Debug)]
pub enum StorageError {
    IoError(io::Error),
    Serialization(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError(err) => write!(f, "Storage I/O error: {}", err),
            Self::Serialization(err) => write!(f, "Storage serialization error: {}", err),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            Self::Serialization(err) => Some(err),
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        Self::IoError(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

/// Every failure the session manager can surface.
#[derive(Debug)]
pub enum AuthError {
    /// A required driver or coordinator option was not supplied.
    MissingOption(&'static str),
    /// The token's payload nonce differs from the pending nonce.
    NonceMismatch,
    /// The token does not have a header and a payload segment.
    InvalidTokenFormat,
    /// A token segment is not valid base64.
    SegmentDecode(base64::DecodeError),
    /// A decoded token was requested while no token is held.
    NotLoggedIn,
    /// The system random source failed.
    NonceGeneration,
    Storage(StorageError),
    /// The navigation environment refused a navigation or frame.
    Navigation(String),
    /// Silent renewal failed and an interactive login was started instead.
    InteractiveLoginRequired,
    /// The identity provider did not answer the silent renewal in time.
    RenewalTimedOut(Duration),
    Transport(HttpClientError),
    /// The server answered with a non-success status.
    HttpStatus {
        request: Box<HttpRequest>,
        response: HttpResponse,
    },
}

impl AuthError {
    /// Status code of an HTTP failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { response, .. } => Some(response.status),
            _ => None,
        }
    }

    /// True for an HTTP 401 answer.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// True for failures that reject a candidate token rather than the session machinery.
    pub fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            Self::NonceMismatch | Self::InvalidTokenFormat | Self::SegmentDecode(_)
        )
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOption(name) => write!(f, "{} is required", name),
            Self::NonceMismatch => write!(f, "Token nonce does not match stored nonce"),
            Self::InvalidTokenFormat => write!(f, "Token is missing its payload segment"),
            Self::SegmentDecode(err) => write!(f, "Token segment is not valid base64: {}", err),
            Self::NotLoggedIn => write!(f, "No id token is held by the current driver"),
            Self::NonceGeneration => write!(f, "Failed to generate a nonce"),
            Self::Storage(err) => write!(f, "{}", err),
            Self::Navigation(err) => write!(f, "Navigation failed: {}", err),
            Self::InteractiveLoginRequired => {
                write!(f, "Silent renewal failed, interactive login started")
            }
            Self::RenewalTimedOut(after) => {
                write!(f, "Silent renewal timed out after {:?}", after)
            }
            Self::Transport(err) => write!(f, "HTTP transport error: {}", err),
            Self::HttpStatus { request, response } => write!(
                f,
                "{} {} failed with status {}",
                request.method, request.url, response.status
            ),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SegmentDecode(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Transport(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<base64::DecodeError> for AuthError {
    fn from(err: base64::DecodeError) -> Self {
        Self::SegmentDecode(err)
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
