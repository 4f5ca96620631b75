//! Acting identities and rule-based authorization
//!
//! Provides the acting identity handed to every controller and the rule
//! language used by [`AccessPolicy`](crate::core::policy::AccessPolicy):
//! - Anonymous or authenticated callers
//! - Owner-based access
//! - Composite rules

use indexmap::IndexMap;
use std::fmt;

/// The identity on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq)]
pub enum AuthContext {
    /// Authenticated platform user with their linked provider accounts
    User {
        user_id: i64,
        /// provider id -> account id (e.g. "cloudplayer" -> "42")
        accounts: IndexMap<String, String>,
    },

    /// No authentication
    Anonymous,
}

impl AuthContext {
    pub fn user(user_id: i64) -> Self {
        AuthContext::User {
            user_id,
            accounts: IndexMap::new(),
        }
    }

    /// Record the caller's account id at a provider
    pub fn with_account(mut self, provider_id: &str, account_id: &str) -> Self {
        if let AuthContext::User { accounts, .. } = &mut self {
            accounts.insert(provider_id.to_string(), account_id.to_string());
        }
        self
    }

    /// Get user_id if available
    pub fn user_id(&self) -> Option<i64> {
        match self {
            AuthContext::User { user_id, .. } => Some(*user_id),
            AuthContext::Anonymous => None,
        }
    }

    /// The caller's account id at `provider_id`
    pub fn account_id(&self, provider_id: &str) -> Option<&str> {
        match self {
            AuthContext::User { accounts, .. } => accounts.get(provider_id).map(String::as_str),
            AuthContext::Anonymous => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, AuthContext::Anonymous)
    }

    /// Whether the caller is the given owner
    pub fn owns(&self, owner_id: Option<i64>) -> bool {
        matches!((self.user_id(), owner_id), (Some(me), Some(owner)) if me == owner)
    }
}

/// The operation kinds a policy is consulted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Query,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Query => "query",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization rule for an operation
#[derive(Debug, Clone)]
pub enum AuthPolicy {
    /// Public access (no auth required)
    Public,

    /// Any authenticated user
    Authenticated,

    /// Owner of the entity only
    Owner,

    /// Nobody, not even the owner
    Nobody,

    /// Combination of policies (AND)
    And(Vec<AuthPolicy>),

    /// Combination of policies (OR)
    Or(Vec<AuthPolicy>),

    /// Custom policy function over the caller and the entity owner
    Custom(fn(&AuthContext, Option<i64>) -> bool),
}

impl AuthPolicy {
    /// Check if the caller satisfies this rule for an entity owned by `owner_id`
    pub fn check(&self, context: &AuthContext, owner_id: Option<i64>) -> bool {
        match self {
            AuthPolicy::Public => true,

            AuthPolicy::Authenticated => !context.is_anonymous(),

            AuthPolicy::Owner => context.owns(owner_id),

            AuthPolicy::Nobody => false,

            AuthPolicy::And(policies) => policies.iter().all(|p| p.check(context, owner_id)),

            AuthPolicy::Or(policies) => policies.iter().any(|p| p.check(context, owner_id)),

            AuthPolicy::Custom(f) => f(context, owner_id),
        }
    }

    /// Parse policy from string (for YAML config)
    pub fn parse_policy(s: &str) -> Self {
        match s {
            "public" => AuthPolicy::Public,
            "authenticated" => AuthPolicy::Authenticated,
            "owner" => AuthPolicy::Owner,
            "nobody" => AuthPolicy::Nobody,
            s if s.contains('|') => {
                AuthPolicy::Or(s.split('|').map(|p| Self::parse_policy(p.trim())).collect())
            }
            s if s.contains('&') => {
                AuthPolicy::And(s.split('&').map(|p| Self::parse_policy(p.trim())).collect())
            }
            unknown => {
                tracing::warn!(policy = unknown, "unknown policy, falling back to authenticated");
                AuthPolicy::Authenticated
            }
        }
    }
}
