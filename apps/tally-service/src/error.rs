//! # API Error Type
//!
//! What a caller of the service sees when an operation fails.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally POS                              │
//! │                                                                         │
//! │  SaleService::create_sale                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  SaleError ── kind() ──► status                                        │
//! │         │                                                               │
//! │         │   InvalidInput  400                                          │
//! │         │   Forbidden     400                                          │
//! │         │   Conflict      400                                          │
//! │         │   Unauthorized  401                                          │
//! │         │   NotFound      500                                          │
//! │         │   Internal      500 (details logged, generic message)        │
//! │         ▼                                                               │
//! │  ApiError { status, body: { "error": true, "message": "..." } }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The mapping switches on [`ErrorKind`], never on message text.

use serde::Serialize;
use tally_core::{ErrorKind, ErrorResponse, SaleError};
use tally_db::DbError;

/// Message returned for internal failures. The cause goes to the log.
pub const INTERNAL_MESSAGE: &str = "failed to create sale";

/// API error returned from service operations.
///
/// ## Serialization
/// Only the body is written to the caller:
/// ```json
/// {
///   "error": true,
///   "message": "insufficient stock for product P"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{status}: {}", .body.message)]
pub struct ApiError {
    /// HTTP-style status code
    #[serde(skip)]
    pub status: u16,

    #[serde(flatten)]
    pub body: ErrorResponse,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        ApiError {
            status,
            body: ErrorResponse::new(message),
        }
    }

    pub fn message(&self) -> &str {
        &self.body.message
    }
}

/// Status code for an error kind.
///
/// `NotFound` reports 500: a missing product surfaces as a generic failure.
pub fn status_for(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::InvalidInput | ErrorKind::Forbidden | ErrorKind::Conflict => 400,
        ErrorKind::Unauthorized => 401,
        ErrorKind::NotFound | ErrorKind::Internal => 500,
    }
}

/// Converts sale errors to API errors.
impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        let status = status_for(err.kind());

        match err {
            SaleError::Internal(cause) => {
                // Log the actual error but return a generic message
                tracing::error!("Sale failed: {}", cause);
                ApiError::new(status, INTERNAL_MESSAGE)
            }
            other => ApiError::new(status, other.to_string()),
        }
    }
}

/// Converts database errors from the read paths (summary, notifications).
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } if entity != "Product" => {
                ApiError::new(404, format!("{} not found: {}", entity.to_lowercase(), id))
            }
            other => {
                tracing::error!("Database operation failed: {}", other);
                ApiError::new(500, "database operation failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::ValidationError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::InvalidInput), 400);
        assert_eq!(status_for(ErrorKind::Forbidden), 400);
        assert_eq!(status_for(ErrorKind::Conflict), 400);
        assert_eq!(status_for(ErrorKind::Unauthorized), 401);
        assert_eq!(status_for(ErrorKind::NotFound), 500);
        assert_eq!(status_for(ErrorKind::Internal), 500);
    }

    #[test]
    fn test_conflict_keeps_message() {
        let err: ApiError = SaleError::InsufficientStock {
            product_id: "P".to_string(),
            available: 2,
            requested: 3,
        }
        .into();
        assert_eq!(err.status, 400);
        assert_eq!(err.message(), "insufficient stock for product P");
    }

    #[test]
    fn test_internal_hides_cause() {
        let err: ApiError = SaleError::internal("disk I/O error at page 7").into();
        assert_eq!(err.status, 500);
        assert_eq!(err.message(), INTERNAL_MESSAGE);
    }

    #[test]
    fn test_body_shape() {
        let err: ApiError = SaleError::from(ValidationError::Empty {
            field: "items".to_string(),
        })
        .into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "error": true, "message": "items must not be empty" })
        );
    }

    #[test]
    fn test_db_not_found_on_reads() {
        let err: ApiError = DbError::not_found("Notification", "n-1").into();
        assert_eq!(err.status, 404);
        assert_eq!(err.message(), "notification not found: n-1");
    }
}
