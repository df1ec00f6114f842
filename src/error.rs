//! API error type and its mapping onto HTTP status buckets.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Contract not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(e) if e.is_constraint_violation() => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(e) if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::NotFound => ErrorResponse {
                error: "Contract not found".to_string(),
                message: None,
            },
            ApiError::Validation(msg) => ErrorResponse {
                error: "Validation failed".to_string(),
                message: Some(msg.clone()),
            },
            ApiError::Store(e) => {
                tracing::error!(error = %e, status = %status, "contract store failure");
                ErrorResponse {
                    error: if status == StatusCode::SERVICE_UNAVAILABLE {
                        "Database not available".to_string()
                    } else if status == StatusCode::UNPROCESSABLE_ENTITY {
                        "Validation failed".to_string()
                    } else {
                        "Database error".to_string()
                    },
                    message: None,
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_buckets() {
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::validation("bad").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Store(StoreError::Unavailable("pool closed".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Store(StoreError::Database(sqlx::Error::RowNotFound)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body_carries_message() {
        let res = ApiError::validation("Name is required").into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Validation failed");
        assert_eq!(body.message.as_deref(), Some("Name is required"));
    }
}
