//! Failure normalization for the data-access boundary.
//!
//! Every failed call surfaces exactly one [`AccessError`]. Its `Display`
//! output is the user-facing message stores record verbatim.

use serde::Deserialize;
use thiserror::Error;

/// A normalized data-access failure.
#[derive(Debug, Error)]
pub enum AccessError {
    /// No response was received at all.
    #[error("Network error. Please check your connection.")]
    NetworkUnavailable,

    /// HTTP 401.
    #[error("Unauthorized. Please log in again.")]
    Unauthorized,

    /// HTTP 403.
    #[error("Access denied.")]
    Forbidden,

    /// HTTP 404.
    #[error("Resource not found.")]
    NotFound,

    /// Any HTTP 5xx.
    #[error("Server error. Please try again later.")]
    ServerError { status: u16 },

    /// The response body carried an explicit message.
    #[error("{message}")]
    Application { status: u16, message: String },

    /// Anything else, including a success body that failed to decode.
    #[error("An unexpected error occurred")]
    Unexpected {
        status: Option<u16>,
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl AccessError {
    /// HTTP status that caused the failure, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NetworkUnavailable => None,
            Self::Unauthorized => Some(401),
            Self::Forbidden => Some(403),
            Self::NotFound => Some(404),
            Self::ServerError { status } | Self::Application { status, .. } => Some(*status),
            Self::Unexpected { status, .. } => *status,
        }
    }

    pub(crate) fn decode(status: u16, source: serde_json::Error) -> Self {
        Self::Unexpected {
            status: Some(status),
            source: Some(source),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Classify a failed call.
///
/// `status` is `None` (or `Some(0)`) when no response arrived. Checks run
/// in a fixed order: network, 401, 403, 404, 5xx, body message, fallback.
pub fn handle_error(status: Option<u16>, body: &str) -> AccessError {
    let status = match status {
        None | Some(0) => return AccessError::NetworkUnavailable,
        Some(status) => status,
    };

    match status {
        401 => AccessError::Unauthorized,
        403 => AccessError::Forbidden,
        404 => AccessError::NotFound,
        500.. => AccessError::ServerError { status },
        _ => match body_message(body) {
            Some(message) => AccessError::Application { status, message },
            None => AccessError::Unexpected {
                status: Some(status),
                source: None,
            },
        },
    }
}

fn body_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.is_empty())
}
