//! Configuration loading and management

use crate::core::auth::AuthPolicy;
use crate::core::policy::AccessPolicy;
use crate::providers::ProviderError;
use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// OAuth client credentials for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// OAuth client id
    pub key: String,

    /// OAuth client secret
    pub secret: String,

    /// Overrides the provider's API base URL
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Overrides the provider's token endpoint
    #[serde(default)]
    pub token_url: Option<String>,
}

impl ProviderSettings {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            api_base_url: None,
            token_url: None,
        }
    }
}

/// Authorization rules for one entity collection
///
/// Each value is a policy expression such as `"owner"` or
/// `"authenticated | public"`, see [`AuthPolicy::parse_policy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityAuthConfig {
    #[serde(default = "default_create")]
    pub create: String,

    #[serde(default = "default_read")]
    pub read: String,

    #[serde(default = "default_owner")]
    pub update: String,

    #[serde(default = "default_owner")]
    pub delete: String,

    #[serde(default = "default_query")]
    pub query: String,
}

fn default_create() -> String {
    "authenticated".to_string()
}

fn default_read() -> String {
    "public".to_string()
}

fn default_owner() -> String {
    "owner".to_string()
}

fn default_query() -> String {
    "authenticated".to_string()
}

impl Default for EntityAuthConfig {
    fn default() -> Self {
        Self {
            create: default_create(),
            read: default_read(),
            update: default_owner(),
            delete: default_owner(),
            query: default_query(),
        }
    }
}

impl EntityAuthConfig {
    pub fn to_access_policy(&self) -> AccessPolicy {
        AccessPolicy {
            create: AuthPolicy::parse_policy(&self.create),
            read: AuthPolicy::parse_policy(&self.read),
            update: AuthPolicy::parse_policy(&self.update),
            delete: AuthPolicy::parse_policy(&self.delete),
            query: AuthPolicy::parse_policy(&self.query),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// provider id -> credentials
    #[serde(default)]
    pub providers: IndexMap<String, ProviderSettings>,

    /// entity collection -> authorization rules
    #[serde(default)]
    pub policies: HashMap<String, EntityAuthConfig>,
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Credentials for `provider_id`
    pub fn provider(&self, provider_id: &str) -> Result<&ProviderSettings, ProviderError> {
        self.providers
            .get(provider_id)
            .ok_or_else(|| ProviderError::NotConfigured {
                provider: provider_id.to_string(),
            })
    }

    /// Rules for `collection`, falling back to the default rules
    pub fn access_policy(&self, collection: &str) -> AccessPolicy {
        self.policies
            .get(collection)
            .map(EntityAuthConfig::to_access_policy)
            .unwrap_or_default()
    }
}
