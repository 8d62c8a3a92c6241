use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// ApiError
///
/// The client-facing error taxonomy shared by every service. Each variant maps
/// onto exactly one HTTP status, so handlers never translate errors by hand:
/// they bubble an `ApiError` up with `?` and the `IntoResponse` impl below
/// produces the final response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The record is absent or its deleted flag is set. The two cases are
    /// indistinguishable to the caller on purpose: a soft-deleted record must
    /// look exactly like one that never existed.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The authenticated principal is not the owner of the record.
    #[error("permission denied")]
    PermissionDenied,

    /// A mandatory create field was absent from the request body.
    #[error("missing required parameters: {0}")]
    MissingRequiredParameters(&'static str),

    /// Unique pair or unique key violation (duplicate subscription, duplicate
    /// username, duplicate role assignment).
    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    /// Credentials absent, malformed, or failed verification.
    #[error("invalid credentials")]
    Unauthorized,

    /// A persistence write did not go through. Details are logged at the
    /// repository layer; the client only sees a generic failure.
    #[error("internal error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::MissingRequiredParameters(_) => StatusCode::BAD_REQUEST,
            ApiError::AlreadyExists(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));

        if status == StatusCode::UNAUTHORIZED {
            // Basic auth challenge, so plain HTTP clients can retry with credentials.
            (
                status,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"jobfinder\"")],
                body,
            )
                .into_response()
        } else {
            (status, body).into_response()
        }
    }
}
