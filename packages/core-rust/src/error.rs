//! Error taxonomy shared by every console operation.
//!
//! Each service function maps lower-layer failures onto one of four kinds and
//! returns immediately. The HTTP boundary turns an [`ApiError`] into the
//! `{ code, message, fields: { errorMessage, attribute } }` envelope.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used by the query pipeline and the console services.
pub type ApiResult<T> = Result<T, ApiError>;

/// Classified failure of a console operation.
///
/// Every variant names the request attribute (or collaborator) that triggered
/// it, so clients can point at the offending input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Bad or missing request attribute (HTTP 400).
    #[error("invalid {attribute}: {message}")]
    Validation { attribute: String, message: String },
    /// Valid request the server refuses to act on (HTTP 403).
    #[error("forbidden {attribute}: {message}")]
    Forbidden { attribute: String, message: String },
    /// Referenced entity is absent (HTTP 404).
    #[error("{attribute} not found: {message}")]
    NotFound { attribute: String, message: String },
    /// Store or collaborator failure (HTTP 500).
    #[error("internal failure in {attribute}: {message}")]
    Internal { attribute: String, message: String },
}

impl ApiError {
    #[must_use]
    pub fn validation(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn forbidden(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Forbidden {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// HTTP status code this error maps to at the boundary.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Internal { .. } => 500,
        }
    }

    /// Standard reason phrase for the status code.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "Bad Request",
            Self::Forbidden { .. } => "Forbidden",
            Self::NotFound { .. } => "Not Found",
            Self::Internal { .. } => "Internal Server Error",
        }
    }

    #[must_use]
    pub fn attribute(&self) -> &str {
        match self {
            Self::Validation { attribute, .. }
            | Self::Forbidden { attribute, .. }
            | Self::NotFound { attribute, .. }
            | Self::Internal { attribute, .. } => attribute,
        }
    }

    /// Human-readable message shown to the caller as `errorMessage`.
    #[must_use]
    pub fn error_message(&self) -> &str {
        match self {
            Self::Validation { message, .. }
            | Self::Forbidden { message, .. }
            | Self::NotFound { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    /// Builds the wire envelope for this error.
    #[must_use]
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            code: self.status_code(),
            message: self.reason().to_string(),
            fields: ErrorFields {
                error_message: self.error_message().to_string(),
                attribute: self.attribute().to_string(),
            },
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("server", format!("{err:#}"))
    }
}

/// Wire form of an [`ApiError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: u16,
    pub message: String,
    pub fields: ErrorFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorFields {
    pub error_message: String,
    pub attribute: String,
}

/// Maps any displayable collaborator failure onto [`ApiError::Internal`].
///
/// ```
/// use catalyst_core::error::{ApiResult, OrInternal};
///
/// fn read() -> ApiResult<u8> {
///     "7".parse::<u8>().or_internal("counter")
/// }
/// assert_eq!(read().unwrap(), 7);
/// ```
pub trait OrInternal<T> {
    /// Converts the error side into an internal error naming `attribute`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] when `self` is an error.
    fn or_internal(self, attribute: &str) -> ApiResult<T>;
}

impl<T, E: Display> OrInternal<T> for Result<T, E> {
    fn or_internal(self, attribute: &str) -> ApiResult<T> {
        self.map_err(|err| ApiError::internal(attribute, err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::validation("page", "bad").status_code(), 400);
        assert_eq!(ApiError::forbidden("ymlFile", "empty").status_code(), 403);
        assert_eq!(ApiError::not_found("gitHubId", "gone").status_code(), 404);
        assert_eq!(ApiError::internal("store", "down").status_code(), 500);
    }

    #[test]
    fn envelope_serializes_with_camel_case_fields() {
        let err = ApiError::not_found("gitHubId", "Git-Hub not found");
        let json = serde_json::to_value(err.envelope()).unwrap();

        assert_eq!(json["code"], 404);
        assert_eq!(json["message"], "Not Found");
        assert_eq!(json["fields"]["errorMessage"], "Git-Hub not found");
        assert_eq!(json["fields"]["attribute"], "gitHubId");
    }

    #[test]
    fn or_internal_keeps_attribute_and_message() {
        let failed: Result<(), &str> = Err("connection reset");
        let err = failed.or_internal("services").unwrap_err();

        assert_eq!(err.status_code(), 500);
        assert_eq!(err.attribute(), "services");
        assert_eq!(err.error_message(), "connection reset");
    }

    #[test]
    fn anyhow_errors_become_internal() {
        let err: ApiError = anyhow::anyhow!("disk full").into();
        assert_eq!(err.reason(), "Internal Server Error");
        assert_eq!(err.error_message(), "disk full");
    }
}
