//! # API Error Type
//!
//! Unified error type for the session boundary.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in VitaCart                               │
//! │                                                                         │
//! │  Frontend                    Rust Backend                               │
//! │  ────────                    ────────────                               │
//! │                                                                         │
//! │  issueCommand(APPLY_PROMOTION)                                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  CartSession::issue_command                                      │  │
//! │  │  Result<CartSummary, ApiError>                                   │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Core Error? ── CoreError::PromotionNotApplicable ──┐           │  │
//! │  │         │                                           ▼           │  │
//! │  │  Success ─────────────────────────────────────── ApiError ────► │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  catch (e) {                                                            │
//! │    // e.message = "Promotion code 'SAVE20' is not applicable: expired"  │
//! │    // e.code = "PROMOTION_ERROR"                                        │
//! │  }                                                                      │
//! │                                                                         │
//! │  NOTE: StoreError never becomes an ApiError on save - persistence      │
//! │  failures are logged and swallowed so a dead disk can't block a cart.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use vitacart_core::CoreError;
use vitacart_store::StoreError;

use crate::checkout::CheckoutError;

/// API error returned across the session boundary.
///
/// ## Serialization
/// This is what the frontend receives when an operation fails:
/// ```json
/// {
///   "code": "PROMOTION_ERROR",
///   "message": "Promotion code 'SAVE20' is not applicable: expired"
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
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Cart operation failed
    CartError,

    /// Promotion code rejected (unknown or expired)
    PromotionError,

    /// Checkout preconditions not met or gateway rejection
    CheckoutError,

    /// Persistence failed in a context where it cannot be swallowed
    StorageError,

    /// Internal error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a checkout error.
    pub fn checkout(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CheckoutError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::CartTooLarge { .. } | CoreError::QuantityTooLarge { .. } => {
                ApiError::new(ErrorCode::CartError, err.to_string())
            }
            CoreError::PromotionNotApplicable { .. } => {
                ApiError::new(ErrorCode::PromotionError, err.to_string())
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

/// Converts store errors to API errors.
///
/// Only reached on paths where persistence failure must surface (explicit
/// store maintenance); the command path logs and swallows instead.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Store operation failed: {}", err);
        ApiError::new(ErrorCode::StorageError, "Persistence operation failed")
    }
}

/// Converts checkout gateway errors to API errors.
impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::new(ErrorCode::CheckoutError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vitacart_core::ValidationError;

    #[test]
    fn test_promotion_error_code() {
        let err: ApiError = CoreError::PromotionNotApplicable {
            code: "SAVE20".to_string(),
            reason: "expired".to_string(),
        }
        .into();

        assert_eq!(err.code, ErrorCode::PromotionError);
        assert!(err.message.contains("SAVE20"));
    }

    #[test]
    fn test_validation_error_code() {
        let err: ApiError = CoreError::Validation(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        })
        .into();

        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_serialized_shape() {
        let err = ApiError::not_found("Product", "p-9");
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: p-9");
    }
}
