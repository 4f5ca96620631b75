//! OAuth provider adapters
//!
//! Each supported provider is a [`ProviderKind`] carrying a static
//! [`ProviderSpec`]: the constants that differ between providers plus three
//! strategy functions (profile normaliser, profile mapper, request decorator).
//! A single [`AuthAdapter`] drives token refresh, proxying and profile
//! ingestion for any of them.

pub mod adapter;
pub mod error;
pub mod soundcloud;
pub mod youtube;

pub use adapter::{AuthAdapter, REFRESH_THRESHOLD_SECS};
pub use error::ProviderError;

use crate::config::AppConfig;
use crate::core::auth::AuthContext;
use crate::core::error::ApiResult;
use crate::core::store::Store;
use crate::entities::Account;
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// An outbound request to be proxied to a provider API
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub params: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Default for ProxyRequest {
    fn default() -> Self {
        Self {
            method: Method::GET,
            params: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl ProxyRequest {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first query parameter called `name`
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Turns a raw profile response into the single profile object
pub type NormalizeProfile = fn(&str, Value) -> Result<Value, ProviderError>;

/// Copies provider-specific profile attributes onto the linked account
pub type MapProfile = fn(&Value, &mut Account);

/// Adds provider-specific parameters or headers to a proxied request
pub type DecorateRequest = fn(&mut ProxyRequest, &AuthContext);

/// Everything that differs between providers
pub struct ProviderSpec {
    pub id: &'static str,
    pub api_base_url: &'static str,
    pub token_url: &'static str,
    /// Query parameter carrying the access token
    pub token_param: &'static str,
    /// Query parameter carrying the OAuth client id
    pub client_key_param: &'static str,
    pub normalize_profile: NormalizeProfile,
    pub map_profile: MapProfile,
    pub decorate_request: DecorateRequest,
}

impl fmt::Debug for ProviderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSpec")
            .field("id", &self.id)
            .field("api_base_url", &self.api_base_url)
            .field("token_url", &self.token_url)
            .field("token_param", &self.token_param)
            .field("client_key_param", &self.client_key_param)
            .finish_non_exhaustive()
    }
}

/// Unwraps nothing, for providers answering with the profile object itself
pub fn profile_as_is(_provider: &str, profile: Value) -> Result<Value, ProviderError> {
    Ok(profile)
}

/// Adds nothing
pub fn no_decoration(_request: &mut ProxyRequest, _current_user: &AuthContext) {}

/// The supported external providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Soundcloud,
    Youtube,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Soundcloud, ProviderKind::Youtube];

    pub fn from_id(provider_id: &str) -> Result<Self, ProviderError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == provider_id)
            .ok_or_else(|| ProviderError::Unsupported {
                provider: provider_id.to_string(),
            })
    }

    pub fn id(&self) -> &'static str {
        self.spec().id
    }

    pub fn spec(&self) -> &'static ProviderSpec {
        match self {
            ProviderKind::Soundcloud => &soundcloud::SPEC,
            ProviderKind::Youtube => &youtube::SPEC,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Build the adapter for `provider_id` on behalf of `current_user`.
///
/// Fails with [`ProviderError::Unsupported`] for unknown providers and
/// [`ProviderError::NotConfigured`] when `config` has no credentials for it.
pub async fn create_adapter(
    provider_id: &str,
    config: &AppConfig,
    store: Arc<dyn Store>,
    current_user: AuthContext,
) -> ApiResult<AuthAdapter> {
    let kind = ProviderKind::from_id(provider_id)?;
    let settings = config.provider(kind.id())?.clone();
    AuthAdapter::connect(kind, settings, store, current_user).await
}
