//! Client error model.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use offerdesk_auth::SessionStoreError;

use crate::{ApiResponse, TransportError};

/// Why a token refresh did not produce a new session.
///
/// `Clone` because a single refresh outcome is handed to every caller waiting
/// on it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("missing refresh token")]
    MissingRefreshToken,

    #[error("refresh response carried no access token")]
    MissingAccessToken,

    #[error("refresh rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("refresh transport error: {0}")]
    Transport(String),

    #[error("session store error during refresh: {0}")]
    Store(String),

    #[error("refresh did not settle within {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Status {
        status: u16,
        message: String,
        body: Value,
    },

    /// The access token expired and could not be refreshed. `original` is the
    /// failure that triggered the refresh.
    #[error("token refresh failed: {cause}")]
    Refresh {
        #[source]
        cause: RefreshError,
        original: Box<ApiError>,
    },

    #[error("session store error: {0}")]
    Session(#[from] SessionStoreError),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn from_response(response: ApiResponse) -> Self {
        let message = response
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status {}", response.status));
        ApiError::Status {
            status: response.status,
            message,
            body: response.body,
        }
    }

    /// HTTP status of the failure, looking through refresh failures to the
    /// original response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Refresh { original, .. } => original.status(),
            _ => None,
        }
    }

    /// Whether the caller should send the user back through login.
    ///
    /// False for a timed-out refresh: the session is kept in that case and
    /// the request can be tried again.
    pub fn requires_login(&self) -> bool {
        match self {
            ApiError::Refresh { cause, .. } => !matches!(cause, RefreshError::TimedOut(_)),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
