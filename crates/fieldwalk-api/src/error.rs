//! Error types for fieldwalk-api

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Result type alias for fieldwalk-api operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving a request
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from fieldwalk-core
    #[error(transparent)]
    Core(#[from] fieldwalk_core::Error),

    /// The multipart body could not be read
    #[error("Invalid upload: {0}")]
    Multipart(String),

    /// The multipart body had no `file` part
    #[error("Upload is missing the 'file' field")]
    MissingFile,

    /// A context header is present but unreadable
    #[error("Invalid header '{name}': {message}")]
    BadHeader {
        /// Header name
        name: &'static str,
        /// What went wrong
        message: String,
    },

    /// The JSON body could not be decoded
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Listener could not be bound or the server failed
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status for the error.
    pub fn status_code(&self) -> StatusCode {
        use fieldwalk_core::Error as Core;
        match self {
            Self::Core(core) => match core {
                Core::Schema { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                Core::UnsupportedFormat { .. } | Core::Validation { .. } => StatusCode::BAD_REQUEST,
                Core::NotFound { .. } => StatusCode::NOT_FOUND,
                Core::Conflict { .. } => StatusCode::CONFLICT,
                Core::Transport { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Multipart(_)
            | Self::MissingFile
            | Self::BadHeader { .. }
            | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable category for the response body.
    pub fn category(&self) -> &'static str {
        use fieldwalk_core::Error as Core;
        match self {
            Self::Core(core) => match core {
                Core::Schema { .. } => "schema",
                Core::UnsupportedFormat { .. } => "unsupported_format",
                Core::NotFound { .. } => "not_found",
                Core::Conflict { .. } => "conflict",
                Core::Transport { .. } => "transport",
                Core::Validation { .. } => "validation",
                _ => "internal",
            },
            Self::Multipart(_)
            | Self::MissingFile
            | Self::BadHeader { .. }
            | Self::InvalidBody(_) => "bad_request",
            Self::Io(_) => "internal",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal details stay in the log.
        let message = if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            tracing::error!(error = %self, "Request failed");
            "internal server error".to_string()
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
            self.to_string()
        };
        let body = serde_json::json!({
            "error": {
                "category": self.category(),
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fieldwalk_core::Error as Core;

    #[test]
    fn test_status_codes() {
        let cases = [
            (Error::from(Core::schema("no address", vec![])), StatusCode::UNPROCESSABLE_ENTITY),
            (Error::from(Core::unsupported_format("a.pdf")), StatusCode::BAD_REQUEST),
            (Error::from(Core::validation("bad status")), StatusCode::BAD_REQUEST),
            (Error::from(Core::not_found("d", "1")), StatusCode::NOT_FOUND),
            (Error::from(Core::conflict("d", "1")), StatusCode::CONFLICT),
            (Error::from(Core::transport("down")), StatusCode::BAD_GATEWAY),
            (Error::from(Core::config("bad")), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::MissingFile, StatusCode::BAD_REQUEST),
            (Error::InvalidBody("eof".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn test_categories() {
        assert_eq!(Error::from(Core::not_found("d", "1")).category(), "not_found");
        assert_eq!(Error::from(Core::schema("x", vec![])).category(), "schema");
        assert_eq!(Error::MissingFile.category(), "bad_request");
    }

    #[tokio::test]
    async fn test_internal_details_not_exposed() {
        let response = Error::from(Core::config("secret path /etc/x")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["category"], "internal");
        assert_eq!(body["error"]["message"], "internal server error");
    }
}
