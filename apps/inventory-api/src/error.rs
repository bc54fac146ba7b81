//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Inventory API                      │
//! │                                                                         │
//! │  Handler                                                                │
//! │  Result<Json<T>, ApiError>                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  InventoryService ── InventoryError::Core(CoreError) ──┐                │
//! │         │                                              │                │
//! │         └──────── InventoryError::Db(DbError) ─────────┤                │
//! │                                                        ▼                │
//! │  Bad JSON / query ──── JsonRejection ─────────────► ApiError            │
//! │                                                        │                │
//! │                                                        ▼                │
//! │                              (StatusCode, Json({ code, message }))      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Mapping
//! | Kind                    | Status | Code                      |
//! |-------------------------|--------|---------------------------|
//! | Validation              | 400    | `VALIDATION_ERROR`        |
//! | NotFound                | 404    | `NOT_FOUND`               |
//! | InsufficientStock       | 409    | `INSUFFICIENT_STOCK`      |
//! | InvalidState            | 409    | `INVALID_STATE`           |
//! | Conflict                | 409    | `CONFLICT`                |
//! | ConcurrentModification  | 503    | `CONCURRENT_MODIFICATION` |
//! | LedgerInconsistent / DB | 500    | `INTERNAL` / `DATABASE_ERROR` |
//!
//! Database details are logged, never returned.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use mercato_core::CoreError;
use mercato_db::{DbError, InventoryError};

/// Error body returned by every failing request.
///
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for product ... available 3, requested 5"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Not enough available units (409)
    InsufficientStock,

    /// Reservation already resolved (409)
    InvalidState,

    /// Would orphan stock or reservations (409)
    Conflict,

    /// Contention retries exhausted; safe to retry (503)
    ConcurrentModification,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InsufficientStock | ErrorCode::InvalidState | ErrorCode::Conflict => {
                StatusCode::CONFLICT
            }
            ErrorCode::ConcurrentModification => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

/// Converts business errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InvalidState { .. } => ErrorCode::InvalidState,
            CoreError::Conflict { .. } => ErrorCode::Conflict,
            CoreError::ConcurrentModification { .. } => {
                tracing::warn!("Giving up on contended write: {}", err);
                ErrorCode::ConcurrentModification
            }
            CoreError::LedgerInconsistent { .. } => {
                tracing::error!("Ledger invariant violated: {}", err);
                return ApiError::new(ErrorCode::Internal, "Inventory ledger is inconsistent");
            }
        };
        ApiError::new(code, err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::Busy(e) => {
                tracing::warn!("Database busy: {}", e);
                ApiError::new(ErrorCode::ConcurrentModification, "Database is busy, retry the request")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", other);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Core(err) => err.into(),
            InventoryError::Db(err) => err.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Result type for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use mercato_core::ValidationError;

    #[test]
    fn test_business_errors_map_to_statuses() {
        let cases: Vec<(CoreError, StatusCode, ErrorCode)> = vec![
            (
                ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }
                .into(),
                StatusCode::BAD_REQUEST,
                ErrorCode::ValidationError,
            ),
            (
                CoreError::not_found("Reservation", "r-1"),
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
            ),
            (
                CoreError::InsufficientStock {
                    product_id: "p".to_string(),
                    location_id: "l".to_string(),
                    available: 3,
                    requested: 5,
                },
                StatusCode::CONFLICT,
                ErrorCode::InsufficientStock,
            ),
            (
                CoreError::InvalidState {
                    reservation_id: "r-1".to_string(),
                    current_status: "fulfilled".to_string(),
                },
                StatusCode::CONFLICT,
                ErrorCode::InvalidState,
            ),
            (
                CoreError::conflict("InventoryLocation", "l", "location still holds stock"),
                StatusCode::CONFLICT,
                ErrorCode::Conflict,
            ),
            (
                CoreError::ConcurrentModification {
                    entity: "StockRecord".to_string(),
                    id: "p@l".to_string(),
                    attempts: 5,
                },
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::ConcurrentModification,
            ),
        ];

        for (err, status, code) in cases {
            let api: ApiError = InventoryError::from(err).into();
            assert_eq!(api.status(), status);
            assert_eq!(api.code, code);
        }
    }

    #[test]
    fn test_insufficient_stock_message_carries_available() {
        let api: ApiError = CoreError::InsufficientStock {
            product_id: "p".to_string(),
            location_id: "l".to_string(),
            available: 3,
            requested: 5,
        }
        .into();
        assert!(api.message.contains("available 3"));
    }

    #[test]
    fn test_infrastructure_details_are_hidden() {
        let api: ApiError = InventoryError::from(DbError::QueryFailed("no such table: stock".to_string())).into();
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Database operation failed");

        let api: ApiError = CoreError::LedgerInconsistent {
            product_id: "p".to_string(),
            location_id: "l".to_string(),
            reason: "reserved exceeds on hand".to_string(),
        }
        .into();
        assert_eq!(api.code, ErrorCode::Internal);
        assert!(!api.message.contains("reserved exceeds"));
    }

    #[test]
    fn test_serializes_screaming_code() {
        let json = serde_json::to_value(ApiError::not_found("Product", "p-1")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: p-1");
    }
}
