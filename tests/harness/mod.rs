//! Shared test harness for controller and provider testing
//!
//! Provides `RecordingPolicy`, a `PolicyGateway` that records every decision
//! it is asked for and denies on demand, plus fixtures for seeding a store.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod harness;
//! use harness::*;
//! ```

#![allow(dead_code)]

use accountlink::attributes;
use accountlink::controller::Controller;
use accountlink::core::auth::{AuthContext, Operation};
use accountlink::core::entity::{Entity, EntitySchema};
use accountlink::core::error::{ApiResult, ControllerError};
use accountlink::core::field::Attributes;
use accountlink::core::fields::Fields;
use accountlink::core::policy::PolicyGateway;
use accountlink::core::store::{self, Store};
use accountlink::entities::{Account, PLATFORM_PROVIDER, Provider, User};
use accountlink::storage::InMemoryStore;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Install a tracing subscriber honouring `RUST_LOG`, once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// RecordingPolicy
// ---------------------------------------------------------------------------

/// One decision requested from the policy gateway
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyCall {
    pub operation: Operation,
    /// Field names (or raw query names) the decision was scoped to
    pub fields: Vec<String>,
    /// Attributes of the entity (or the before-state)
    pub before: Option<Attributes>,
    /// Attributes of the after-state, for update and delete
    pub after: Option<Attributes>,
}

/// Allows everything unless told otherwise, and remembers what it was asked
#[derive(Default)]
pub struct RecordingPolicy {
    calls: Mutex<Vec<PolicyCall>>,
    denied: Mutex<HashSet<Operation>>,
    /// Reads of entities whose `id` is listed here are denied
    denied_ids: Mutex<HashSet<String>>,
    /// Reads are narrowed to these fields when set
    readable: Mutex<Option<Fields>>,
}

impl RecordingPolicy {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn deny(&self, operation: Operation) {
        self.denied.lock().unwrap().insert(operation);
    }

    pub fn deny_read_of(&self, id: &str) {
        self.denied_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn narrow_reads_to(&self, fields: &[&str]) {
        *self.readable.lock().unwrap() = Some(Fields::from(fields));
    }

    pub fn calls(&self) -> Vec<PolicyCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, operation: Operation) -> Vec<PolicyCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation == operation)
            .collect()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.calls().iter().map(|call| call.operation).collect()
    }

    fn record(
        &self,
        operation: Operation,
        fields: Vec<String>,
        before: Option<Attributes>,
        after: Option<Attributes>,
    ) -> ApiResult<()> {
        self.calls.lock().unwrap().push(PolicyCall {
            operation,
            fields,
            before,
            after,
        });
        if self.denied.lock().unwrap().contains(&operation) {
            return Err(ControllerError::forbidden(operation, "denied by test policy").into());
        }
        Ok(())
    }
}

fn names(fields: &Fields) -> Vec<String> {
    fields.iter().map(str::to_string).collect()
}

#[async_trait]
impl<E: Entity> PolicyGateway<E> for RecordingPolicy {
    async fn grant_create(&self, _actor: &AuthContext, entity: &E, fields: &Fields) -> ApiResult<()> {
        self.record(Operation::Create, names(fields), Some(entity.attributes()), None)
    }

    async fn grant_read(&self, _actor: &AuthContext, entity: &E, fields: &Fields) -> ApiResult<Fields> {
        self.record(Operation::Read, names(fields), Some(entity.attributes()), None)?;

        let id = entity.field_value("id").and_then(|v| v.as_string().map(str::to_string));
        if id.is_some_and(|id| self.denied_ids.lock().unwrap().contains(&id)) {
            return Err(ControllerError::forbidden(Operation::Read, "entity hidden").into());
        }

        Ok(match &*self.readable.lock().unwrap() {
            Some(readable) => fields.intersection(readable),
            None => fields.clone(),
        })
    }

    async fn grant_update(
        &self,
        _actor: &AuthContext,
        before: &E,
        after: &E,
        fields: &Fields,
    ) -> ApiResult<()> {
        self.record(
            Operation::Update,
            names(fields),
            Some(before.attributes()),
            Some(after.attributes()),
        )
    }

    async fn grant_delete(&self, _actor: &AuthContext, before: &E, after: &E) -> ApiResult<()> {
        self.record(
            Operation::Delete,
            Vec::new(),
            Some(before.attributes()),
            Some(after.attributes()),
        )
    }

    async fn grant_query(
        &self,
        _actor: &AuthContext,
        _schema: &'static EntitySchema,
        kw: &Attributes,
    ) -> ApiResult<()> {
        self.record(Operation::Query, kw.keys().cloned().collect(), None, None)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A store, a fresh session on it, and a recording policy
pub struct Fixture {
    pub store: InMemoryStore,
    pub session: Arc<dyn Store>,
    pub policy: Arc<RecordingPolicy>,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let store = InMemoryStore::new();
        let session: Arc<dyn Store> = Arc::new(store.session());
        Self {
            store,
            session,
            policy: RecordingPolicy::new(),
        }
    }

    /// A controller acting as `current_user` over this fixture's session
    pub fn controller<E: Entity>(&self, current_user: AuthContext) -> Controller<E> {
        Controller::new(self.session.clone(), current_user, self.policy.clone())
    }

    /// Persist `entity` directly, bypassing the controller
    pub async fn seed<E: Entity>(&self, entity: &E) {
        store::stage(self.session.as_ref(), entity).await.unwrap();
        self.session.commit().await.unwrap();
    }

    /// Read back a committed entity through a fresh session
    pub async fn committed<E: Entity>(&self, ids: &Attributes) -> Option<E> {
        let session = self.store.session();
        store::load::<E>(&session, ids).await.unwrap()
    }
}

pub fn account_ids(id: &str, provider_id: &str) -> Attributes {
    attributes! { "id" => id, "provider_id" => provider_id }
}

pub fn account(id: &str, provider_id: &str, user_id: i64, title: &str) -> Account {
    Account {
        title: Some(title.to_string()),
        ..Account::new(id, provider_id, Some(user_id))
    }
}

/// A platform user together with their platform account
pub async fn seed_user(fixture: &Fixture, user_id: i64) -> AuthContext {
    fixture.seed(&User::new(user_id)).await;
    let platform_id = user_id.to_string();
    fixture
        .seed(&Account::new(platform_id.as_str(), PLATFORM_PROVIDER, Some(user_id)))
        .await;
    AuthContext::user(user_id).with_account(PLATFORM_PROVIDER, &platform_id)
}

pub async fn seed_provider(fixture: &Fixture, id: &str, client_id: &str) {
    fixture.seed(&Provider::new(id, client_id)).await;
}
