//! The persistence store contract
//!
//! Stores deal in rows (attribute maps) keyed by collection name and
//! composite identity, so one store serves every entity type. Mutations are
//! staged until [`Store::commit`]; [`Store::rollback`] discards them.

use crate::core::entity::Entity;
use crate::core::error::{ApiResult, StorageError};
use crate::core::field::{Attributes, Identity};
use crate::core::query::Predicate;
use anyhow::Result;
use async_trait::async_trait;

/// A stored entity as an attribute map
pub type Row = Attributes;

/// Unit-of-work access to persisted rows
#[async_trait]
pub trait Store: Send + Sync {
    /// Get a row by composite key, seeing this unit of work's staged changes
    async fn get(&self, collection: &str, key: &Identity) -> Result<Option<Row>>;

    /// Stage an insert-or-replace of the row under `key`
    async fn add(&self, collection: &str, key: Identity, row: Row) -> Result<()>;

    /// Stage the removal of the row under `key`
    async fn delete(&self, collection: &str, key: &Identity) -> Result<()>;

    /// Make staged changes durable
    async fn commit(&self) -> Result<()>;

    /// Discard staged changes
    async fn rollback(&self) -> Result<()>;

    /// Rows matching every predicate, in store order
    async fn select(&self, collection: &str, predicates: &[Predicate]) -> Result<Vec<Row>>;
}

/// Turn a stored row back into an entity
pub fn entity_from_row<E: Entity>(row: &Row) -> ApiResult<E> {
    E::from_attributes(row).map_err(|e| {
        StorageError::Corrupt {
            collection: E::schema().name.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Fetch and decode an entity by composite key
pub async fn load<E: Entity>(store: &dyn Store, key: &Identity) -> ApiResult<Option<E>> {
    match store.get(E::schema().name, key).await? {
        Some(row) => entity_from_row(&row).map(Some),
        None => Ok(None),
    }
}

/// Stage an entity for insert-or-replace
pub async fn stage<E: Entity>(store: &dyn Store, entity: &E) -> ApiResult<()> {
    store
        .add(E::schema().name, entity.identity(), entity.attributes())
        .await?;
    Ok(())
}

/// Stage an entity for removal
pub async fn unstage<E: Entity>(store: &dyn Store, entity: &E) -> ApiResult<()> {
    store.delete(E::schema().name, &entity.identity()).await?;
    Ok(())
}
