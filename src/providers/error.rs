//! Provider adapter errors

use axum::http::StatusCode;
use thiserror::Error;

/// Failures of the OAuth provider adapters
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unsupported provider: {provider}")]
    Unsupported { provider: String },

    #[error("Cannot proxy without a linked {provider} account")]
    MissingAccount { provider: String },

    #[error("The linked {provider} account has no refresh token")]
    MissingRefreshToken { provider: String },

    #[error("Provider {provider} is not configured")]
    NotConfigured { provider: String },

    #[error("{provider} request failed: {source}")]
    Upstream {
        provider: String,
        source: reqwest::Error,
    },

    #[error("Invalid {provider} profile: {message}")]
    InvalidProfile { provider: String, message: String },

    #[error("Invalid {provider} token response: {message}")]
    InvalidTokenResponse { provider: String, message: String },
}

impl ProviderError {
    pub fn upstream(provider: &str, source: reqwest::Error) -> Self {
        ProviderError::Upstream {
            provider: provider.to_string(),
            source,
        }
    }

    pub fn invalid_profile(provider: &str, message: impl Into<String>) -> Self {
        ProviderError::InvalidProfile {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_token_response(provider: &str, message: impl Into<String>) -> Self {
        ProviderError::InvalidTokenResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Upstream failures keep the provider's status when it sent one
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProviderError::Unsupported { .. }
            | ProviderError::MissingAccount { .. }
            | ProviderError::MissingRefreshToken { .. } => StatusCode::BAD_REQUEST,
            ProviderError::NotConfigured { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProviderError::Upstream { source, .. } => source
                .status()
                .and_then(|status| StatusCode::from_u16(status.as_u16()).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ProviderError::InvalidProfile { .. } | ProviderError::InvalidTokenResponse { .. } => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ProviderError::Unsupported { .. } => "UNSUPPORTED_PROVIDER",
            ProviderError::MissingAccount { .. } => "MISSING_ACCOUNT",
            ProviderError::MissingRefreshToken { .. } => "MISSING_REFRESH_TOKEN",
            ProviderError::NotConfigured { .. } => "PROVIDER_NOT_CONFIGURED",
            ProviderError::Upstream { .. } => "UPSTREAM_ERROR",
            ProviderError::InvalidProfile { .. } => "INVALID_PROFILE",
            ProviderError::InvalidTokenResponse { .. } => "INVALID_TOKEN_RESPONSE",
        }
    }
}
