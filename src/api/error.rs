//! API error types with the stable JSON error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthError;
use crate::db::DatabaseError;
use crate::referrals::ReferralError;

/// Error envelope returned for every failed request:
/// `{"error": "...", "details": "..."}` (details omitted when empty).
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(String),
    #[error("invalid field")]
    InvalidField(String),
    #[error("authentication required")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden(String),
    #[error("not found")]
    NotFound(String),
    #[error("conflict")]
    Conflict(String),
    #[error("internal error")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::Validation(details) => {
                (StatusCode::BAD_REQUEST, "validation failed", Some(details))
            }
            ApiError::InvalidField(details) => {
                (StatusCode::BAD_REQUEST, "invalid field", Some(details))
            }
            ApiError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "authentication required", None)
            }
            ApiError::Forbidden(details) => (StatusCode::FORBIDDEN, "forbidden", Some(details)),
            ApiError::NotFound(details) => (StatusCode::NOT_FOUND, "not found", Some(details)),
            ApiError::Conflict(details) => (StatusCode::CONFLICT, "conflict", Some(details)),
            ApiError::Internal(details) => {
                tracing::error!(%details, "API internal error");
                // Details stay in the log, never in the response
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error", None)
            }
        };

        let body = ErrorBody {
            error: error.to_string(),
            details: details.filter(|d| !d.is_empty()),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ReferralError> for ApiError {
    fn from(err: ReferralError) -> Self {
        match err {
            ReferralError::Validation(m) => ApiError::Validation(m),
            ReferralError::InvalidField(m) => ApiError::InvalidField(m),
            ReferralError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            ReferralError::PatientNotFound => ApiError::NotFound("patient not found".into()),
            ReferralError::NotFound => ApiError::NotFound("referral not found".into()),
            ReferralError::Forbidden => {
                ApiError::Forbidden("not authorized for this referral".into())
            }
            ReferralError::Conflict => {
                ApiError::Conflict("assignment already taken by a concurrent update".into())
            }
            ReferralError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id} not found"))
            }
            DatabaseError::InvalidEnum { field, value } => {
                ApiError::Validation(format!("invalid {field}: {value}"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => ApiError::Unauthenticated,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use crate::models::enums::ReferralStatus;

    #[tokio::test]
    async fn unauthenticated_returns_401() {
        let response = ApiError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "authentication required");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn validation_returns_400_with_details() {
        let response = ApiError::Validation("reason is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["details"], "reason is required");
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let response = ApiError::Internal("disk exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "internal error");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn invalid_transition_maps_to_409() {
        let err: ApiError = ReferralError::InvalidTransition {
            from: ReferralStatus::Completed,
            to: ReferralStatus::Pending,
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn patient_not_found_maps_to_404() {
        let err: ApiError = ReferralError::PatientNotFound.into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn assignment_conflict_maps_to_409() {
        let err: ApiError = ReferralError::Conflict.into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
