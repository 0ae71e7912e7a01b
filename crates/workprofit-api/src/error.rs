//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::{error, warn};
use workprofit_core::{DomainError, FieldError, ValidationErrors};

use crate::models::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    FieldLocked(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(what: &str, id: i32) -> Self {
        ApiError::NotFound(format!("{} {} not found", what, id))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) | ApiError::FieldLocked(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::FieldLocked(_) => "FIELD_LOCKED",
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Turn a unique-key violation into `Conflict`, leaving other errors alone.
    pub fn conflict_on_unique(err: DbErr, message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ApiError::Conflict(message.to_string()),
            _ => ApiError::Database(err),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(m) => ApiError::NotFound(m),
            DomainError::Forbidden(m) => ApiError::Forbidden(m),
            DomainError::FieldLocked(m) => ApiError::FieldLocked(m),
            DomainError::Validation(v) => ApiError::Validation(v),
            DomainError::Rule(m) => ApiError::BadRequest(m),
            DomainError::Conflict(m) => ApiError::Conflict(m),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Database(e) => error!("Database error: {}", e),
            ApiError::Internal(m) => error!("Internal error: {}", m),
            ApiError::Unauthorized(m) => warn!("Unauthorized: {}", m),
            _ => {}
        }

        let (error, details): (String, Option<Vec<FieldError>>) = match &self {
            ApiError::Validation(v) => (self.to_string(), Some(v.errors().to_vec())),
            // Store internals stay in the logs
            ApiError::Database(_) => ("Database error".to_string(), None),
            _ => (self.to_string(), None),
        };

        (
            status,
            Json(ErrorResponse {
                error,
                code: Some(self.code().to_string()),
                details,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let cases = [
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DomainError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (DomainError::FieldLocked("x".into()), StatusCode::FORBIDDEN),
            (DomainError::Rule("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                DomainError::Validation(ValidationErrors::new()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (domain, status) in cases {
            assert_eq!(ApiError::from(domain).status(), status);
        }
    }

    #[test]
    fn test_field_locked_has_distinct_code() {
        let err = ApiError::from(DomainError::FieldLocked("locked".into()));
        assert_eq!(err.code(), "FIELD_LOCKED");
        assert_eq!(ApiError::forbidden("no").code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_validation_response_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.push("name", "name must not be empty");
        errors.push("end_date", "End date (2025-01-01) must be after start date (2025-01-01)");

        let response = ApiError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.code.as_deref(), Some("VALIDATION_FAILED"));
        let details = parsed.details.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[1].field, "end_date");
    }
}
