use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors scoped to a single translation request.
///
/// None of these are fatal to the process; the handler reports them and the
/// next submission starts from scratch.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("{0}")]
    Input(String),

    #[error("file is too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    /// The request body hit the upload limit before it was fully read.
    #[error("the upload exceeds the {limit} byte limit")]
    UploadTooLarge { limit: usize },

    #[error("unreachable source: {0}")]
    UnreachableSource(String),

    #[error("no content found at {0}")]
    NoContent(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },
}

/// Coarse grouping shown to users and returned by the JSON API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Network,
    Provider,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Input => "input",
            ErrorKind::Network => "network",
            ErrorKind::Provider => "provider",
        }
    }
}

impl TranslateError {
    pub fn input(message: impl Into<String>) -> Self {
        TranslateError::Input(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::Input(_)
            | TranslateError::TooLarge { .. }
            | TranslateError::UploadTooLarge { .. }
            | TranslateError::NoContent(_) => ErrorKind::Input,
            TranslateError::UnreachableSource(_) | TranslateError::Network(_) => ErrorKind::Network,
            TranslateError::Provider { .. } => ErrorKind::Provider,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            TranslateError::Input(_) => StatusCode::BAD_REQUEST,
            TranslateError::TooLarge { .. } | TranslateError::UploadTooLarge { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            TranslateError::NoContent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TranslateError::UnreachableSource(_) | TranslateError::Network(_) => StatusCode::BAD_GATEWAY,
            TranslateError::Provider { status, .. } if *status == 429 => StatusCode::TOO_MANY_REQUESTS,
            TranslateError::Provider { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for TranslateError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind().as_str(),
        }));
        (self.status_code(), body).into_response()
    }
}

pub type TranslateResult<T> = Result<T, TranslateError>;
