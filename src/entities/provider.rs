//! OAuth providers

use crate::impl_entity;

impl_entity!(
    /// A supported provider and the public client id registered with it
    Provider,
    "provider",
    key: [id],
    public: [id, client_id, title],
    mutable: [],
    filterable: [id],
    {
        id: String,
        /// Sent along with every proxied request
        client_id: Option<String>,
        title: Option<String>,
    }
);

impl Provider {
    pub fn new(id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            client_id: Some(client_id.into()),
            title: None,
        }
    }
}
