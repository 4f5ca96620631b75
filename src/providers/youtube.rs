//! YouTube (Google data API v3)

use super::{ProviderError, ProviderSpec, ProxyRequest};
use crate::core::auth::AuthContext;
use crate::entities::{Account, Image};
use reqwest::header::{HeaderValue, REFERER};
use serde_json::Value;

pub const PROVIDER_ID: &str = "youtube";

/// Sent as `Referer` on every proxied request
pub const REFERER_URL: &str = "https://api.cloud-player.io";

pub static SPEC: ProviderSpec = ProviderSpec {
    id: PROVIDER_ID,
    api_base_url: "https://www.googleapis.com/youtube/v3",
    token_url: "https://www.googleapis.com/oauth2/v4/token",
    token_param: "access_token",
    client_key_param: "key",
    normalize_profile,
    map_profile,
    decorate_request,
};

/// Channel listings wrap the profile in `items`; the first one is the caller
pub fn normalize_profile(provider: &str, profile: Value) -> Result<Value, ProviderError> {
    match profile {
        Value::Object(mut listing) => match listing.remove("items") {
            Some(Value::Array(items)) => items
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::invalid_profile(provider, "empty items list")),
            _ => Err(ProviderError::invalid_profile(provider, "missing items list")),
        },
        _ => Err(ProviderError::invalid_profile(provider, "expected an object")),
    }
}

fn thumbnail(thumbnails: Option<&Value>, size: &str) -> Option<String> {
    thumbnails?
        .get(size)?
        .get("url")?
        .as_str()
        .map(str::to_string)
}

pub fn map_profile(profile: &Value, account: &mut Account) {
    let snippet = profile.get("snippet");
    let thumbnails = snippet.and_then(|s| s.get("thumbnails"));
    account.image = Some(Image::new(
        thumbnail(thumbnails, "default"),
        thumbnail(thumbnails, "medium"),
        thumbnail(thumbnails, "high"),
    ));
    account.title = snippet
        .and_then(|s| s.get("title"))
        .and_then(Value::as_str)
        .map(str::to_string);
}

pub fn decorate_request(request: &mut ProxyRequest, current_user: &AuthContext) {
    request.params.push(("prettyPrint".into(), "false".into()));
    if let Some(account_id) = current_user.account_id(PROVIDER_ID) {
        request.params.push(("quotaUser".into(), account_id.to_string()));
    }
    request
        .headers
        .insert(REFERER, HeaderValue::from_static(REFERER_URL));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_unwraps_first_item() {
        let listing = json!({ "items": [{ "id": "UC1" }, { "id": "UC2" }] });
        let profile = normalize_profile(PROVIDER_ID, listing).unwrap();
        assert_eq!(profile, json!({ "id": "UC1" }));
    }

    #[test]
    fn test_normalize_rejects_empty_listing() {
        assert!(normalize_profile(PROVIDER_ID, json!({ "items": [] })).is_err());
        assert!(normalize_profile(PROVIDER_ID, json!({ "id": "UC1" })).is_err());
        assert!(normalize_profile(PROVIDER_ID, json!([])).is_err());
    }

    #[test]
    fn test_map_profile() {
        let mut account = Account::new("UC1", PROVIDER_ID, Some(1));
        let profile = json!({
            "id": "UC1",
            "snippet": {
                "title": "Channel",
                "thumbnails": {
                    "default": { "url": "d.jpg" },
                    "medium": { "url": "m.jpg" },
                    "high": { "url": "h.jpg" }
                }
            }
        });

        map_profile(&profile, &mut account);

        assert_eq!(account.title.as_deref(), Some("Channel"));
        assert_eq!(
            account.image,
            Some(Image::new(
                Some("d.jpg".into()),
                Some("m.jpg".into()),
                Some("h.jpg".into())
            ))
        );
    }

    #[test]
    fn test_decorate_request() {
        let user = AuthContext::user(1).with_account(PROVIDER_ID, "UC1");
        let mut request = ProxyRequest::get();

        decorate_request(&mut request, &user);

        assert_eq!(request.param_value("prettyPrint"), Some("false"));
        assert_eq!(request.param_value("quotaUser"), Some("UC1"));
        assert_eq!(request.headers[REFERER], REFERER_URL);
    }
}
