//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Errors return correct HTTP status codes
//! - Error responses are properly formatted
//! - Error conversions work correctly
//! - Error matching allows clients to handle specific cases

use accountlink::core::StorageError;
use accountlink::prelude::*;
use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;

// =============================================================================
// HTTP Status Code Tests
// =============================================================================

mod status_code_tests {
    use super::*;

    #[test]
    fn test_conflict_returns_400() {
        let err = ApiError::Controller(ControllerError::Conflict {
            message: "same".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_forbidden_returns_403_for_every_operation() {
        for operation in [
            Operation::Create,
            Operation::Read,
            Operation::Update,
            Operation::Delete,
            Operation::Query,
        ] {
            let err = ApiError::Controller(ControllerError::forbidden(operation, "no"));
            assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
            assert!(err.is_forbidden());
        }
    }

    #[test]
    fn test_not_found_returns_404() {
        let err = ApiError::Controller(ControllerError::NotFound {
            entity_type: "account".to_string(),
            key: "('1', 'soundcloud')".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_storage_errors_return_500() {
        let err = ApiError::Storage(StorageError::Corrupt {
            collection: "account".to_string(),
            message: "bad row".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_invalid_token_response_returns_502() {
        let err = ApiError::from(ProviderError::invalid_token_response(
            "youtube",
            "expires_in out of range",
        ));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), "INVALID_TOKEN_RESPONSE");
    }
}

// =============================================================================
// Conversion Tests
// =============================================================================

mod conversion_tests {
    use super::*;

    #[test]
    fn test_merge_conflict_converts_to_api_error() {
        let ids = attributes! { "a" => 1i64, "same" => "x" };
        let kw = attributes! { "same" => "y" };
        let err: ApiError = merge(&ids, &kw).unwrap_err().into();
        assert_eq!(err.error_code(), "CONFLICT");
    }

    #[test]
    fn test_anyhow_converts_to_storage_error() {
        let err: ApiError = anyhow::anyhow!("lock poisoned").into();
        assert!(matches!(err, ApiError::Storage(StorageError::Backend { .. })));
        assert_eq!(err.to_string(), "Storage error: lock poisoned");
    }

    #[test]
    fn test_provider_error_converts() {
        let err: ApiError = ProviderError::Unsupported {
            provider: "myspace".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "UNSUPPORTED_PROVIDER");
    }
}

// =============================================================================
// Response Format Tests
// =============================================================================

mod response_tests {
    use super::*;

    #[test]
    fn test_not_found_response_details() {
        let err = ApiError::Controller(ControllerError::NotFound {
            entity_type: "user".to_string(),
            key: "(3)".to_string(),
        });
        let response = err.to_response();
        assert_eq!(response.code, "NOT_FOUND");
        assert_eq!(response.message, "user (3) not found");
        assert_eq!(
            response.details,
            Some(serde_json::json!({ "entity_type": "user", "key": "(3)" }))
        );
    }

    #[test]
    fn test_forbidden_response_names_operation() {
        let err = ApiError::Controller(ControllerError::forbidden(Operation::Update, "not yours"));
        let response = err.to_response();
        assert_eq!(response.message, "Forbidden to update: not yours");
        assert_eq!(
            response.details,
            Some(serde_json::json!({ "operation": "update" }))
        );
    }

    #[test]
    fn test_conflict_response_has_no_details() {
        let err = ApiError::Controller(ControllerError::Conflict {
            message: "ambiguous".to_string(),
        });
        let json = serde_json::to_value(err.to_response()).unwrap();
        assert_eq!(json, serde_json::json!({ "code": "CONFLICT", "message": "ambiguous" }));
    }

    #[tokio::test]
    async fn test_into_response() {
        let err = ApiError::Controller(ControllerError::NotFound {
            entity_type: "account".to_string(),
            key: "('1', 'youtube')".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
    }
}

// =============================================================================
// Error Matching Tests
// =============================================================================

mod matching_tests {
    use super::*;

    fn describe(err: &ApiError) -> &'static str {
        match err {
            ApiError::Controller(ControllerError::Conflict { .. }) => "fix your request",
            ApiError::Controller(ControllerError::Forbidden { .. }) => "ask for access",
            ApiError::Controller(ControllerError::NotFound { .. }) => "nothing there",
            ApiError::Provider(_) => "provider trouble",
            _ => "try later",
        }
    }

    #[test]
    fn test_clients_can_match_specific_cases() {
        let forbidden = ApiError::from(ControllerError::forbidden(Operation::Delete, "no"));
        assert_eq!(describe(&forbidden), "ask for access");

        let missing = ApiError::from(ProviderError::MissingAccount {
            provider: "youtube".to_string(),
        });
        assert_eq!(describe(&missing), "provider trouble");

        let storage = ApiError::from(anyhow::anyhow!("disk full"));
        assert_eq!(describe(&storage), "try later");
    }
}
