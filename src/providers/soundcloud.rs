//! SoundCloud

use super::{ProviderSpec, no_decoration, profile_as_is};
use crate::entities::{Account, Image};
use serde_json::Value;

pub const PROVIDER_ID: &str = "soundcloud";

pub static SPEC: ProviderSpec = ProviderSpec {
    id: PROVIDER_ID,
    api_base_url: "https://api.soundcloud.com",
    token_url: "https://api.soundcloud.com/oauth2/token",
    token_param: "oauth_token",
    client_key_param: "client_id",
    normalize_profile: profile_as_is,
    map_profile,
    decorate_request: no_decoration,
};

/// Avatar URLs name their size; `large` is swapped for the bigger renditions
fn avatar_image(avatar_url: &str) -> Image {
    Image::new(
        Some(avatar_url.to_string()),
        Some(avatar_url.replace("large", "t300x300")),
        Some(avatar_url.replace("large", "t500x500")),
    )
}

pub fn map_profile(profile: &Value, account: &mut Account) {
    account.image = profile
        .get("avatar_url")
        .and_then(Value::as_str)
        .map(avatar_image);
    account.title = profile
        .get("username")
        .and_then(Value::as_str)
        .map(str::to_string);
}
