//! Linked provider accounts

use crate::entities::Image;
use crate::impl_entity;
use chrono::{DateTime, FixedOffset};

/// Provider id of the platform-level account every user has
pub const PLATFORM_PROVIDER: &str = "cloudplayer";

impl_entity!(
    /// One user's account at one provider, including its OAuth tokens
    Account,
    "account",
    key: [id, provider_id],
    public: [id, provider_id, user_id, title, image],
    mutable: [title, image],
    filterable: [id, provider_id, user_id, title],
    owner: user_id,
    {
        /// Account id at the provider
        id: String,
        provider_id: String,
        /// Owning platform user
        user_id: Option<i64>,
        title: Option<String>,
        image: Option<Image>,
        access_token: Option<String>,
        refresh_token: Option<String>,
        token_expiration: Option<DateTime<FixedOffset>>,
    }
);

impl Account {
    pub fn new(id: impl Into<String>, provider_id: impl Into<String>, user_id: Option<i64>) -> Self {
        Self {
            id: id.into(),
            provider_id: provider_id.into(),
            user_id,
            ..Default::default()
        }
    }

    pub fn is_platform_account(&self) -> bool {
        self.provider_id == PLATFORM_PROVIDER
    }
}
