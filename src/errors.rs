use axum::http::StatusCode;
use axum::http::header::InvalidHeaderName;
use axum::response::{IntoResponse, Response};

/// Failures before a request reaches the gate. No decision is produced.
#[derive(Debug)]
pub enum RequestError {
    BodyRead(axum::Error),
    Timeout,
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            RequestError::BodyRead(error) => {
                tracing::debug!("Failed to read request body: {error}");
                (StatusCode::BAD_REQUEST, "malformed request")
            }
            RequestError::Timeout => (StatusCode::REQUEST_TIMEOUT, "request timeout"),
        };
        (status, message).into_response()
    }
}

#[derive(Debug)]
pub enum StartupError {
    Config(hookgate_config::Error),
    InvalidHeaderName(String, InvalidHeaderName),
    Bind(std::io::Error),
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartupError::Config(error) => write!(f, "{error}"),
            StartupError::InvalidHeaderName(name, error) => {
                write!(f, "Invalid header name {name:?}: {error}")
            }
            StartupError::Bind(error) => write!(f, "Failed to bind listener: {error}"),
        }
    }
}

impl From<hookgate_config::Error> for StartupError {
    fn from(error: hookgate_config::Error) -> Self {
        StartupError::Config(error)
    }
}
