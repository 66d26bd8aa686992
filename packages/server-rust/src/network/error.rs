//! HTTP rendering of [`ApiError`].

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalyst_core::ApiError;
use tracing::{debug, error};

/// Handler result; the error side renders the console error envelope.
pub type HttpResult<T> = Result<T, HttpError>;

/// [`ApiError`] at the axum boundary.
#[derive(Debug)]
pub struct HttpError(pub ApiError);

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ApiError::validation("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for HttpError {
    fn from(rejection: QueryRejection) -> Self {
        Self(ApiError::validation("query", rejection.body_text()))
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let envelope = self.0.envelope();
        let status =
            StatusCode::from_u16(envelope.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(attribute = %envelope.fields.attribute, error = %self.0, "request failed");
        } else {
            debug!(attribute = %envelope.fields.attribute, error = %self.0, "request rejected");
        }
        (status, Json(envelope)).into_response()
    }
}
