//! The generic resource controller
//!
//! One [`Controller`] drives create/read/update/delete/query/search for a
//! single entity type `E`. Every operation:
//!
//! 1. validates the identity and payload mappings
//! 2. fetches or builds the entity through the [`Store`]
//! 3. asks the [`PolicyGateway`] for a decision scoped to the touched fields
//! 4. commits, then projects the result through a read-style check
//!
//! Commits happen last, so an operation abandoned midway leaves nothing
//! behind in the store.

use crate::core::auth::{AuthContext, Operation};
use crate::core::entity::Entity;
use crate::core::error::{ApiResult, ControllerError};
use crate::core::field::{Attributes, Identity};
use crate::core::fields::{Fields, Projection};
use crate::core::merge::{eject, merge};
use crate::core::policy::PolicyGateway;
use crate::core::query::{Predicate, Query};
use crate::core::store::{self, Store};
use std::sync::Arc;

/// Generic CRUD over entities of type `E` on behalf of one caller
pub struct Controller<E: Entity> {
    store: Arc<dyn Store>,
    current_user: AuthContext,
    policy: Arc<dyn PolicyGateway<E>>,
}

impl<E: Entity> Clone for Controller<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            current_user: self.current_user.clone(),
            policy: self.policy.clone(),
        }
    }
}

fn describe_key(identity: &Identity) -> String {
    let parts: Vec<String> = identity.values().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}

impl<E: Entity> Controller<E> {
    pub fn new(
        store: Arc<dyn Store>,
        current_user: AuthContext,
        policy: Arc<dyn PolicyGateway<E>>,
    ) -> Self {
        Self {
            store,
            current_user,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn current_user(&self) -> &AuthContext {
        &self.current_user
    }

    fn entity_name() -> &'static str {
        E::schema().name
    }

    /// Create an entity from `ids` and `kw`, then read it back through `fields`.
    ///
    /// A denial after the entity was staged rolls the staging back, so nothing
    /// is committed.
    pub async fn create(
        &self,
        ids: &Identity,
        kw: &Attributes,
        fields: &Fields,
    ) -> ApiResult<Projection<E>> {
        let identity = E::schema().identity(ids)?;
        let params = merge(&identity, kw)?;
        tracing::debug!(entity = Self::entity_name(), key = %describe_key(&identity), "create");

        if store::load::<E>(self.store.as_ref(), &identity).await?.is_some() {
            return Err(ControllerError::Conflict {
                message: format!(
                    "{} {} already exists",
                    Self::entity_name(),
                    describe_key(&identity)
                ),
            }
            .into());
        }

        let entity = E::from_attributes(&params)?;
        store::stage(self.store.as_ref(), &entity).await?;

        let touched: Fields = params.keys().cloned().collect();
        if let Err(err) = self
            .policy
            .grant_create(&self.current_user, &entity, &touched)
            .await
        {
            tracing::warn!(entity = Self::entity_name(), error = %err, "create denied");
            self.store.rollback().await?;
            return Err(err);
        }
        self.store.commit().await?;

        self.authorize_read(entity, fields).await
    }

    /// Read one entity, projected through the fields the policy permits
    pub async fn read(&self, ids: &Identity, fields: &Fields) -> ApiResult<Projection<E>> {
        let entity = self.fetch(ids).await?;
        self.authorize_read(entity, fields).await
    }

    /// Apply the mutable attributes of `kw`, then read the result back through `fields`
    pub async fn update(
        &self,
        ids: &Identity,
        kw: &Attributes,
        fields: &Fields,
    ) -> ApiResult<Projection<E>> {
        let before = self.fetch(ids).await?;
        let payload = eject(&before.identity(), kw)?;

        let schema = E::schema();
        let immutable: Vec<&str> = payload
            .keys()
            .map(String::as_str)
            .filter(|name| !schema.is_mutable(name))
            .collect();
        if !immutable.is_empty() {
            return Err(ControllerError::forbidden(
                Operation::Update,
                format!("{} fields are not mutable: {}", schema.name, immutable.join(", ")),
            )
            .into());
        }

        let mut after = before.clone();
        for (name, value) in &payload {
            after.assign(name, value.clone())?;
        }

        let touched: Fields = payload
            .keys()
            .filter(|name| before.field_value(name) != after.field_value(name))
            .cloned()
            .collect();
        if let Err(err) = self
            .policy
            .grant_update(&self.current_user, &before, &after, &touched)
            .await
        {
            tracing::warn!(entity = schema.name, fields = %touched, error = %err, "update denied");
            return Err(err);
        }

        store::stage(self.store.as_ref(), &after).await?;
        self.store.commit().await?;
        tracing::debug!(entity = schema.name, key = %describe_key(&after.identity()), fields = %touched, "updated");

        self.authorize_read(after, fields).await
    }

    /// Permanently remove one entity
    pub async fn delete(&self, ids: &Identity) -> ApiResult<()> {
        let entity = self.fetch(ids).await?;

        if let Err(err) = self
            .policy
            .grant_delete(&self.current_user, &entity, &entity)
            .await
        {
            tracing::warn!(entity = Self::entity_name(), error = %err, "delete denied");
            return Err(err);
        }

        store::unstage(self.store.as_ref(), &entity).await?;
        self.store.commit().await?;
        tracing::debug!(entity = Self::entity_name(), key = %describe_key(&entity.identity()), "deleted");
        Ok(())
    }

    /// Build an equality query over the filterable names of `ids` and `kw`.
    ///
    /// Names that are not filterable do not become predicates. The query is
    /// returned unexecuted.
    pub async fn query(&self, ids: &Identity, kw: &Attributes) -> ApiResult<Query<E>> {
        let schema = E::schema();
        let query = ids
            .iter()
            .chain(kw.iter())
            .filter(|(name, _)| schema.is_filterable(name))
            .fold(Query::new(), |query, (name, value)| {
                query.filter(Predicate::equals(name.clone(), value.clone()))
            });

        if let Err(err) = self
            .policy
            .grant_query(&self.current_user, schema, kw)
            .await
        {
            tracing::warn!(entity = schema.name, error = %err, "query denied");
            return Err(err);
        }

        tracing::debug!(entity = schema.name, query = %query, "query");
        Ok(query)
    }

    /// Execute the query for `ids` and `kw` and read every result.
    ///
    /// Results the policy denies are skipped; the rest keep store order.
    pub async fn search(
        &self,
        ids: &Identity,
        kw: &Attributes,
        fields: &Fields,
    ) -> ApiResult<Vec<Projection<E>>> {
        let query = self.query(ids, kw).await?;
        let entities = query.fetch_all(self.store.as_ref()).await?;

        let mut results = Vec::with_capacity(entities.len());
        for entity in entities {
            match self.authorize_read(entity, fields).await {
                Ok(projection) => results.push(projection),
                Err(err) if err.is_forbidden() => {
                    tracing::debug!(entity = Self::entity_name(), error = %err, "search result skipped");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(results)
    }

    async fn fetch(&self, ids: &Identity) -> ApiResult<E> {
        let identity = E::schema().identity(ids)?;
        match store::load::<E>(self.store.as_ref(), &identity).await? {
            Some(entity) => Ok(entity),
            None => Err(ControllerError::NotFound {
                entity_type: Self::entity_name().to_string(),
                key: describe_key(&identity),
            }
            .into()),
        }
    }

    async fn authorize_read(&self, entity: E, fields: &Fields) -> ApiResult<Projection<E>> {
        let requested = fields.clone().or_default_to(E::schema().public_fields());
        let permitted = self
            .policy
            .grant_read(&self.current_user, &entity, &requested)
            .await?;
        Ok(Projection::new(entity, permitted))
    }
}
