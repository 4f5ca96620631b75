//! Platform users

use crate::impl_entity;
use chrono::{DateTime, FixedOffset, Utc};

impl_entity!(
    /// A platform user; provider accounts point at it through `user_id`
    User,
    "user",
    key: [id],
    public: [id],
    mutable: [],
    filterable: [],
    owner: id,
    {
        id: i64,
        created: Option<DateTime<FixedOffset>>,
        updated: Option<DateTime<FixedOffset>>,
    }
);

impl User {
    /// A user stamped as created and updated now
    pub fn new(id: i64) -> Self {
        let now = Utc::now().fixed_offset();
        Self {
            id,
            created: Some(now),
            updated: Some(now),
        }
    }
}
