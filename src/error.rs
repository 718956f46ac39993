use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of an external collaborator (detector, audio service, knowledge
/// source, video lookup). Always caught at the call site.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing credential / endpoint, or the request never reached the service.
    #[error("{service} unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },

    /// Service answered with a non-success status.
    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    /// Service answered but the body was not what we expected.
    #[error("{service} sent a malformed response: {reason}")]
    Malformed { service: &'static str, reason: String },
}

impl ServiceError {
    pub fn unavailable(service: &'static str, reason: impl Into<String>) -> Self {
        ServiceError::Unavailable { service, reason: reason.into() }
    }

    pub fn malformed(service: &'static str, reason: impl Into<String>) -> Self {
        ServiceError::Malformed { service, reason: reason.into() }
    }

    /// Map a transport-level reqwest failure.
    pub fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ServiceError::Status { service, status: status.as_u16() };
        }
        if err.is_decode() {
            return ServiceError::malformed(service, err.to_string());
        }
        ServiceError::unavailable(service, err.to_string())
    }
}

/// Failure handling uploaded or derived media.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media could not be decoded: {0}")]
    DecodeFailure(String),

    #[error("media could not be encoded: {0}")]
    EncodeFailure(String),

    #[error("media io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        };

        let body = Json(json!({
            "ok": false,
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
