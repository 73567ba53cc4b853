use crate::api::models::relay::ErrorResponse;
use crate::storage::StorageError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

/// Message returned for every request body that cannot be decoded or is missing a field.
pub const PARSE_ARGS_MESSAGE: &str = "parse json args error";

#[derive(ThisError, Debug)]
pub enum Error {
    /// The request body was malformed or incomplete. No upstream call has been made.
    #[error("{message}: {detail}")]
    BadRequest { message: String, detail: String },

    /// The AI server address does not form a valid URL
    #[error("Invalid AI server address {address}")]
    InvalidUpstream {
        address: String,
        #[source]
        source: url::ParseError,
    },

    /// The AI server could not be reached (connection refused, DNS, timeout)
    #[error("Failed to reach AI server at {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The AI server answered, but not with a success status
    #[error("AI server returned {status} for {filename}")]
    UpstreamStatus { filename: String, status: u16 },

    /// The connection dropped while the body was being read
    #[error("Failed to read body of {filename}")]
    ReadBody {
        filename: String,
        #[source]
        source: reqwest::Error,
    },

    /// Declared Content-Length and the bytes actually received disagree
    #[error("Expected length: {expected}, but got: {actual}")]
    Truncated { filename: String, expected: u64, actual: u64 },

    /// The object store refused the write
    #[error("Failed to upload {key}")]
    Storage {
        key: String,
        #[source]
        source: StorageError,
    },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Error::BadRequest {
            message: PARSE_ARGS_MESSAGE.to_string(),
            detail: detail.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            // Relay the AI server's own status so callers can tell a missing file from an outage
            Error::UpstreamStatus { status, .. } => StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            Error::InvalidUpstream { .. }
            | Error::Transport { .. }
            | Error::ReadBody { .. }
            | Error::Truncated { .. }
            | Error::Storage { .. }
            | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the human readable `message` field of the error body
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message, .. } => message.clone(),
            Error::InvalidUpstream { .. } | Error::Transport { .. } => "Failed to fetch file from AI server".to_string(),
            Error::UpstreamStatus { .. } => "Failed to fetch file".to_string(),
            Error::ReadBody { .. } => "Failed to read response body".to_string(),
            Error::Truncated { .. } => "Incomplete file data response body".to_string(),
            Error::Storage { .. } => "Failed to upload object to OSS".to_string(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }

    /// Returns the `error` field of the error body: the underlying cause as text
    pub fn detail(&self) -> String {
        match self {
            Error::BadRequest { detail, .. } => detail.clone(),
            Error::InvalidUpstream { address, source } => format!("{address}: {source}"),
            Error::Transport { source, .. } | Error::ReadBody { source, .. } => source.to_string(),
            Error::UpstreamStatus { filename, status } => {
                format!("AI server responded with status {status} for {filename}")
            }
            Error::Truncated { .. } => self.to_string(),
            Error::Storage { source, .. } => source.to_string(),
            Error::Other(err) => format!("{err:#}"),
        }
    }

    fn to_string_chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = std::error::Error::source(cause);
        }
        out
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::bad_request(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::UpstreamStatus { .. } | Error::Truncated { .. } => {
                tracing::warn!("Upstream error: {}", self);
            }
            Error::InvalidUpstream { .. }
            | Error::Transport { .. }
            | Error::ReadBody { .. }
            | Error::Storage { .. }
            | Error::Other(_) => {
                tracing::error!("Relay error: {}", self.to_string_chain());
            }
        }

        let body = ErrorResponse {
            message: self.user_message(),
            error: self.detail(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

/// Type alias for relay operation results
pub type Result<T> = std::result::Result<T, Error>;
