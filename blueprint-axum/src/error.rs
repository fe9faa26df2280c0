use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use blueprint_core::MetadataError;
use serde_json::json;

/// Request-shape failures detected before dispatch
#[derive(Debug)]
pub enum RequestError {
    /// A required binding had no value in the request
    MissingParam { source: &'static str, name: String },

    /// The request body was present but not valid JSON
    InvalidBody,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParam { source, name } => {
                write!(f, "Missing required {source} parameter: {name}")
            }
            Self::InvalidBody => write!(f, "Request body must be valid JSON"),
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    /// Convert into `anyhow::Error` so it flows through the hook pipeline
    pub fn into_anyhow(self) -> anyhow::Error {
        anyhow::Error::new(self)
    }
}

/// Wrapper so `anyhow::Error` can flow out of handlers as a JSON response
#[derive(Debug)]
pub struct ApiError(pub anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Declaration and request-shape problems are the caller's fault;
        // everything else is ours.
        let is_bad_request = self.0.chain().any(|e| {
            e.downcast_ref::<RequestError>().is_some()
                || e.downcast_ref::<MetadataError>().is_some()
        });

        let (status, name) = if is_bad_request {
            (StatusCode::BAD_REQUEST, "BadRequest")
        } else {
            (StatusCode::INTERNAL_SERVER_ERROR, "GeneralError")
        };

        let body = json!({
            "name": name,
            "message": self.0.to_string(),
            "code": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
