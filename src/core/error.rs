//! Typed error handling for accountlink
//!
//! Callers of the generic controller see exactly three signals, all carried
//! by [`ControllerError`] with a numeric status:
//!
//! - [`ControllerError::Conflict`] (400): ambiguous identity/payload overlap,
//!   malformed identity or payload
//! - [`ControllerError::Forbidden`] (403): a policy denial
//! - [`ControllerError::NotFound`] (404): the composite key does not exist
//!
//! [`ApiError`] wraps these together with provider, storage and internal
//! failures so every operation returns one error type.
//!
//! # Example
//!
//! ```rust,ignore
//! match controller.read(&ids, &Fields::empty()).await {
//!     Ok(account) => println!("{}", serde_json::to_string(&account)?),
//!     Err(ApiError::Controller(ControllerError::NotFound { key, .. })) => {
//!         println!("no account {}", key);
//!     }
//!     Err(e) => eprintln!("{} ({})", e, e.status_code()),
//! }
//! ```

use crate::core::auth::Operation;
use crate::providers::ProviderError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for accountlink
#[derive(Debug)]
pub enum ApiError {
    /// Generic controller signals (400/403/404)
    Controller(ControllerError),

    /// Provider adapter failures (OAuth refresh, proxying, profile ingestion)
    Provider(ProviderError),

    /// Persistence store failures
    Storage(StorageError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Controller(e) => write!(f, "{}", e),
            ApiError::Provider(e) => write!(f, "{}", e),
            ApiError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Controller(e) => Some(e),
            ApiError::Provider(e) => Some(e),
            ApiError::Storage(e) => Some(e),
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Controller(e) => e.status_code(),
            ApiError::Provider(e) => e.status_code(),
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Controller(e) => e.error_code(),
            ApiError::Provider(e) => e.error_code(),
            ApiError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Whether this is a policy denial
    pub fn is_forbidden(&self) -> bool {
        matches!(self, ApiError::Controller(ControllerError::Forbidden { .. }))
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Controller(ControllerError::NotFound { entity_type, key }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "key": key
                }))
            }
            ApiError::Controller(ControllerError::Forbidden { operation, .. }) => {
                Some(serde_json::json!({ "operation": operation.as_str() }))
            }
            ApiError::Provider(ProviderError::Upstream { provider, .. }) => {
                Some(serde_json::json!({ "provider": provider }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Controller Errors
// =============================================================================

/// The caller-facing signals of the generic controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// Ambiguous or malformed identity/payload (400)
    Conflict { message: String },

    /// Policy denial for any operation kind (403)
    Forbidden {
        operation: Operation,
        message: String,
    },

    /// The composite key does not exist (404)
    NotFound { entity_type: String, key: String },
}

impl ControllerError {
    pub fn forbidden(operation: Operation, message: impl Into<String>) -> Self {
        ControllerError::Forbidden {
            operation,
            message: message.into(),
        }
    }

    pub fn unknown_field(entity_type: &str, field: &str) -> Self {
        ControllerError::Conflict {
            message: format!("{} has no field {}", entity_type, field),
        }
    }

    pub fn invalid_value(entity_type: &str, field: &str, reason: impl fmt::Display) -> Self {
        ControllerError::Conflict {
            message: format!("invalid value for {}.{}: {}", entity_type, field, reason),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ControllerError::Conflict { .. } => StatusCode::BAD_REQUEST,
            ControllerError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ControllerError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ControllerError::Conflict { .. } => "CONFLICT",
            ControllerError::Forbidden { .. } => "FORBIDDEN",
            ControllerError::NotFound { .. } => "NOT_FOUND",
        }
    }
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::Conflict { message } => write!(f, "{}", message),
            ControllerError::Forbidden { operation, message } => {
                write!(f, "Forbidden to {}: {}", operation, message)
            }
            ControllerError::NotFound { entity_type, key } => {
                write!(f, "{} {} not found", entity_type, key)
            }
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        ApiError::Controller(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to the persistence store
#[derive(Debug)]
pub enum StorageError {
    /// The backend failed to execute an operation
    Backend { message: String },

    /// A stored row could not be turned back into an entity
    Corrupt {
        collection: String,
        message: String,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Backend { message } => write!(f, "Storage error: {}", message),
            StorageError::Corrupt {
                collection,
                message,
            } => write!(f, "Corrupt {} row: {}", collection, message),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err)
    }
}

/// Store implementations report failures through anyhow
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Storage(StorageError::Backend {
            message: err.to_string(),
        })
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        ApiError::Provider(err)
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for accountlink operations
pub type ApiResult<T> = Result<T, ApiError>;
