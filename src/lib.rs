//! # accountlink
//!
//! Generic, field-authorized CRUD over composite-keyed entities, plus OAuth
//! account linking for external music providers.
//!
//! ## Features
//!
//! - **Generic Controller**: one [`Controller`](controller::Controller) serves every entity type
//! - **Per-Field Authorization**: every operation asks a [`PolicyGateway`](core::PolicyGateway)
//!   about exactly the fields it touches
//! - **Conflict-Safe Identities**: identity and payload mappings may not disagree
//! - **Field Projection**: reads return only the permitted subset of the requested fields
//! - **Unit of Work Stores**: nothing is committed until an operation is fully authorized
//! - **Provider Adapters**: token refresh, authenticated proxying and profile ingestion for
//!   SoundCloud and YouTube
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use accountlink::prelude::*;
//! use std::sync::Arc;
//!
//! let store = InMemoryStore::new();
//! let controller: Controller<Account> = Controller::new(
//!     Arc::new(store.session()),
//!     AuthContext::user(7).with_account("cloudplayer", "7"),
//!     Arc::new(AccessPolicy::default()),
//! );
//!
//! let ids = attributes! { "id" => "abc", "provider_id" => "soundcloud" };
//! let account = controller
//!     .create(&ids, &attributes! { "user_id" => 7i64, "title" => "foo" }, &Fields::empty())
//!     .await?;
//! println!("{}", serde_json::to_string(&account)?);
//! ```

pub mod config;
pub mod controller;
pub mod core;
pub mod entities;
pub mod providers;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        AccessPolicy, ApiError, ApiResult, Attributes, AuthContext, AuthPolicy, ControllerError,
        Entity, EntitySchema, FieldType, FieldValue, Fields, Identity, Operation, PolicyGateway,
        Predicate, Projection, Query, Store, eject, merge,
    };

    // === Macros ===
    pub use crate::{attributes, impl_entity};

    // === Controller ===
    pub use crate::controller::Controller;

    // === Entities ===
    pub use crate::entities::{Account, Image, PLATFORM_PROVIDER, Provider, User};

    // === Providers ===
    pub use crate::providers::{
        AuthAdapter, ProviderError, ProviderKind, ProxyRequest, create_adapter,
    };

    // === Storage ===
    pub use crate::storage::{InMemorySession, InMemoryStore};

    // === Config ===
    pub use crate::config::{AppConfig, EntityAuthConfig, ProviderSettings};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, FixedOffset, Utc};
    pub use serde::{Deserialize, Serialize};
}
