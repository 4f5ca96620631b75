//! The OAuth account adapter shared by every provider

use super::{ProviderError, ProviderKind, ProviderSpec, ProxyRequest};
use crate::attributes;
use crate::config::ProviderSettings;
use crate::core::auth::{AuthContext, Operation};
use crate::core::error::{ApiResult, ControllerError};
use crate::core::store::{self, Store};
use crate::entities::{Account, PLATFORM_PROVIDER, Provider};
use chrono::{DateTime, FixedOffset, Offset, TimeDelta, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Tokens expiring within this many seconds are refreshed before use
pub const REFRESH_THRESHOLD_SECS: i64 = 60;

/// Token endpoint answer to a refresh grant
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Maintains one caller's OAuth relationship with one provider
pub struct AuthAdapter {
    kind: ProviderKind,
    settings: ProviderSettings,
    store: Arc<dyn Store>,
    current_user: AuthContext,
    http: reqwest::Client,
    account: Option<Account>,
}

impl AuthAdapter {
    /// Create the adapter, loading the caller's linked account if there is one
    pub async fn connect(
        kind: ProviderKind,
        settings: ProviderSettings,
        store: Arc<dyn Store>,
        current_user: AuthContext,
    ) -> ApiResult<Self> {
        let account = match current_user.account_id(kind.id()) {
            Some(account_id) => {
                let key = attributes! { "id" => account_id, "provider_id" => kind.id() };
                store::load::<Account>(store.as_ref(), &key).await?
            }
            None => None,
        };

        tracing::debug!(provider = kind.id(), linked = account.is_some(), "adapter connected");

        Ok(Self {
            kind,
            settings,
            store,
            current_user,
            http: reqwest::Client::new(),
            account,
        })
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    fn spec(&self) -> &'static ProviderSpec {
        self.kind.spec()
    }

    fn provider_id(&self) -> &'static str {
        self.kind.id()
    }

    fn api_base_url(&self) -> &str {
        self.settings
            .api_base_url
            .as_deref()
            .unwrap_or(self.spec().api_base_url)
    }

    fn token_url(&self) -> &str {
        self.settings
            .token_url
            .as_deref()
            .unwrap_or(self.spec().token_url)
    }

    fn missing_account(&self) -> ProviderError {
        ProviderError::MissingAccount {
            provider: self.provider_id().to_string(),
        }
    }

    /// Whether the access token expires within [`REFRESH_THRESHOLD_SECS`].
    ///
    /// Accounts without a known expiration are never refreshed.
    pub fn should_refresh(&self) -> bool {
        self.account
            .as_ref()
            .and_then(|account| account.token_expiration)
            .is_some_and(|expiration| {
                let now = Utc::now().with_timezone(expiration.offset());
                expiration - now < TimeDelta::seconds(REFRESH_THRESHOLD_SECS)
            })
    }

    /// Exchange the stored refresh token for a new access token and commit it
    pub async fn refresh(&mut self) -> ApiResult<()> {
        let provider = self.provider_id();
        let mut account = self.account.clone().ok_or_else(|| self.missing_account())?;
        let refresh_token =
            account
                .refresh_token
                .clone()
                .ok_or_else(|| ProviderError::MissingRefreshToken {
                    provider: provider.to_string(),
                })?;

        tracing::info!(provider, account = %account.id, "refreshing access token");

        let form = [
            ("client_id", self.settings.key.as_str()),
            ("client_secret", self.settings.secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let access: TokenResponse = self
            .http
            .post(self.token_url())
            .form(&form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ProviderError::upstream(provider, e))?
            .json()
            .await
            .map_err(|e| ProviderError::upstream(provider, e))?;

        account.access_token = Some(access.access_token);
        if let Some(refresh_token) = access.refresh_token.filter(|t| !t.is_empty()) {
            account.refresh_token = Some(refresh_token);
        }
        if let Some(expires_in) = access.expires_in {
            let expiration = expiration_after(account.token_expiration, expires_in)
                .ok_or_else(|| {
                    ProviderError::invalid_token_response(
                        provider,
                        format!("expires_in {} is out of range", expires_in),
                    )
                })?;
            account.token_expiration = Some(expiration);
        }

        store::stage(self.store.as_ref(), &account).await?;
        self.store.commit().await?;
        self.account = Some(account);
        Ok(())
    }

    /// Proxy an authenticated request to `path` under the provider's API.
    ///
    /// A token close to expiry is refreshed first, and the refresh completes
    /// before the proxied request is sent. Non-success upstream statuses are
    /// returned as [`ProviderError::Upstream`].
    pub async fn fetch(&mut self, path: &str, request: ProxyRequest) -> ApiResult<reqwest::Response> {
        if self.account.is_none() {
            return Err(self.missing_account().into());
        }
        if self.should_refresh() {
            self.refresh().await?;
        }

        let provider = self.provider_id();
        let spec = self.spec();
        let mut request = request;
        (spec.decorate_request)(&mut request, &self.current_user);

        let access_token = self
            .account
            .as_ref()
            .and_then(|account| account.access_token.clone())
            .unwrap_or_default();
        let client_id = self.client_id().await?;
        request.params.push((spec.token_param.to_string(), access_token));
        request.params.push((spec.client_key_param.to_string(), client_id));

        let url = format!(
            "{}/{}",
            self.api_base_url().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        tracing::debug!(provider, method = %request.method, %url, "proxying request");

        let mut builder = self
            .http
            .request(request.method, url)
            .query(&request.params)
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ProviderError::upstream(provider, e))?;
        Ok(response)
    }

    /// The OAuth client id registered for this provider, falling back to the configured key
    async fn client_id(&self) -> ApiResult<String> {
        let key = attributes! { "id" => self.provider_id() };
        match store::load::<Provider>(self.store.as_ref(), &key).await? {
            Some(provider) => Ok(provider
                .client_id
                .unwrap_or_else(|| self.settings.key.clone())),
            None => Err(ControllerError::NotFound {
                entity_type: "provider".to_string(),
                key: format!("('{}')", self.provider_id()),
            }
            .into()),
        }
    }

    /// Link or refresh the account described by a provider profile.
    ///
    /// The account is created for the current user when it does not exist
    /// yet. The caller's platform account picks up the title and image if it
    /// has none of its own. Everything is committed together.
    pub async fn update_account(&mut self, profile: Value) -> ApiResult<Account> {
        let provider = self.provider_id();
        let spec = self.spec();
        let profile = (spec.normalize_profile)(provider, profile)?;
        let account_id = profile_id(provider, &profile)?;

        let key = attributes! { "id" => account_id.as_str(), "provider_id" => provider };
        let mut account = match store::load::<Account>(self.store.as_ref(), &key).await? {
            Some(account) => account,
            None => {
                let user_id = self.current_user.user_id().ok_or_else(|| {
                    ControllerError::forbidden(
                        Operation::Create,
                        format!("cannot link a {} account without a user", provider),
                    )
                })?;
                tracing::info!(provider, account = %account_id, user_id, "linking new account");
                Account::new(account_id.as_str(), provider, Some(user_id))
            }
        };

        (spec.map_profile)(&profile, &mut account);
        store::stage(self.store.as_ref(), &account).await?;

        self.backfill_platform_profile(&account).await?;

        self.store.commit().await?;
        self.account = Some(account.clone());
        Ok(account)
    }

    async fn backfill_platform_profile(&self, account: &Account) -> ApiResult<()> {
        let Some(platform_id) = self.current_user.account_id(PLATFORM_PROVIDER) else {
            return Ok(());
        };
        let key = attributes! { "id" => platform_id, "provider_id" => PLATFORM_PROVIDER };
        let Some(mut platform) = store::load::<Account>(self.store.as_ref(), &key).await? else {
            tracing::warn!(account = platform_id, "platform account missing, nothing to back-fill");
            return Ok(());
        };

        let mut changed = false;
        if platform.title.as_deref().is_none_or(str::is_empty) {
            platform.title = account.title.clone();
            changed = true;
        }
        if platform.image.as_ref().is_none_or(|image| image.is_empty()) {
            platform.image = account.image.clone();
            changed = true;
        }
        if changed {
            store::stage(self.store.as_ref(), &platform).await?;
        }
        Ok(())
    }
}

/// Provider account ids may arrive as numbers or strings
fn profile_id(provider: &str, profile: &Value) -> Result<String, ProviderError> {
    match profile.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(ProviderError::invalid_profile(provider, "missing id")),
    }
}

/// "Now" in the offset of the previous expiration (UTC without one), plus `expires_in` seconds.
///
/// `None` when the result is not a representable timestamp.
fn expiration_after(
    previous: Option<DateTime<FixedOffset>>,
    expires_in: i64,
) -> Option<DateTime<FixedOffset>> {
    let offset = previous.map_or(Utc.fix(), |expiration| *expiration.offset());
    let lifetime = TimeDelta::try_seconds(expires_in)?;
    Utc::now()
        .with_timezone(&offset)
        .checked_add_signed(lifetime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_id() {
        assert_eq!(profile_id("soundcloud", &json!({ "id": 42 })).unwrap(), "42");
        assert_eq!(profile_id("youtube", &json!({ "id": "UC1" })).unwrap(), "UC1");
        assert!(profile_id("youtube", &json!({ "snippet": {} })).is_err());
    }

    #[test]
    fn test_expiration_keeps_previous_offset() {
        let previous = DateTime::parse_from_rfc3339("2020-01-01T00:00:00+02:00").unwrap();
        let expiration = expiration_after(Some(previous), 3600).unwrap();
        assert_eq!(expiration.offset().local_minus_utc(), 7200);

        let remaining = expiration - Utc::now().with_timezone(expiration.offset());
        assert!(remaining > TimeDelta::seconds(3590));
        assert!(remaining <= TimeDelta::seconds(3600));
    }

    #[test]
    fn test_expiration_defaults_to_utc() {
        let expiration = expiration_after(None, 60).unwrap();
        assert_eq!(expiration.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_expiration_out_of_range() {
        assert!(expiration_after(None, i64::MAX / 10).is_none());
        assert!(expiration_after(None, i64::MAX).is_none());
        assert!(expiration_after(None, 400_000 * 365 * 24 * 3600).is_none());
    }
}
