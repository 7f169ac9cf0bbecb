// Error handling module for the Promotional Service
// Provides the HTTP error type and its response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::promotions::{PromoError, StoreError};

/// Main error type for the API
/// All handlers should return Result<T, ApiError>
///
/// Each variant maps to a specific HTTP status code. Business-rule failures
/// carry their user-facing reason verbatim in `message`.
#[derive(Debug)]
pub enum ApiError {
    /// Request validation errors
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// A promotion or coupon does not apply to the caller's cart
    /// Maps to HTTP 400 Bad Request
    Rejected { error_code: &'static str, message: String },

    /// Maps to HTTP 404 Not Found
    NotFound { message: String },

    /// Duplicate coupon code
    /// Maps to HTTP 409 Conflict
    Conflict { message: String },

    /// Rule store or usage ledger failures
    /// Maps to HTTP 500; details are logged, never returned
    StorageError(StoreError),
}

/// Consistent error response structure
///
/// `message` is the human-readable reason; `error_code` is machine-readable.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// e.g. "VALIDATION_ERROR", "PROMOTION_REJECTED"
    pub error_code: String,

    pub message: String,

    /// Field-level validation errors; omitted when None
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,

    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    fn new(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message: message.into(),
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    /// Convert ApiError to HTTP status code and ErrorResponse
    ///
    /// Logs 500-level errors at error, conflicts at warn and expected client
    /// errors at debug.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);

                let mut response = ErrorResponse::new("VALIDATION_ERROR", "Request validation failed");
                response.details = Some(serde_json::to_value(errors).unwrap_or(serde_json::json!({})));
                (StatusCode::BAD_REQUEST, response)
            }
            ApiError::Rejected { error_code, message } => {
                debug!("Promotion rejected: {}", message);
                (StatusCode::BAD_REQUEST, ErrorResponse::new(error_code, message.clone()))
            }
            ApiError::NotFound { message } => {
                debug!("Not found: {}", message);
                (StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", message.clone()))
            }
            ApiError::Conflict { message } => {
                warn!("Conflict error: {}", message);
                (StatusCode::CONFLICT, ErrorResponse::new("CONFLICT", message.clone()))
            }
            ApiError::StorageError(store_error) => {
                error!("Storage error: {:?}", store_error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("STORAGE_ERROR", "A storage error occurred"),
                )
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        self.to_error_response().0
    }
}

/// Convert promotion engine errors to ApiError
impl From<PromoError> for ApiError {
    fn from(error: PromoError) -> Self {
        match error {
            PromoError::Rejected(rejection) => ApiError::Rejected {
                error_code: "PROMOTION_REJECTED",
                message: rejection.to_string(),
            },
            PromoError::InvalidCouponCode => ApiError::Rejected {
                error_code: "INVALID_COUPON",
                message: error.to_string(),
            },
            PromoError::AmountOutOfRange => ApiError::Rejected {
                error_code: "AMOUNT_OUT_OF_RANGE",
                message: error.to_string(),
            },
            PromoError::CouponNotFound | PromoError::PromotionNotFound(_) => ApiError::NotFound {
                message: error.to_string(),
            },
            PromoError::DuplicateCode(_) => ApiError::Conflict {
                message: error.to_string(),
            },
            PromoError::Storage(store_error) => ApiError::StorageError(store_error),
        }
    }
}

/// Convert validator errors to ApiError
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}
