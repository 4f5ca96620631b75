//! Equality-filtered queries over one entity collection

use crate::core::entity::Entity;
use crate::core::error::ApiResult;
use crate::core::field::{Attributes, FieldValue};
use crate::core::store::{Store, entity_from_row};
use std::fmt;
use std::marker::PhantomData;

/// `field = value`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub value: FieldValue,
}

impl Predicate {
    pub fn equals(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// A missing attribute only matches `Null`
    pub fn matches(&self, row: &Attributes) -> bool {
        match row.get(&self.field) {
            Some(value) => value == &self.value,
            None => self.value.is_null(),
        }
    }
}

/// A constructed, not yet executed query for entities of type `E`.
///
/// Predicates are combined with AND.
#[derive(Debug, Clone)]
pub struct Query<E> {
    predicates: Vec<Predicate>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Query<E> {
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
            _entity: PhantomData,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn collection(&self) -> &'static str {
        E::schema().name
    }

    pub fn matches(&self, row: &Attributes) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }

    /// Execute against `store`, preserving store order
    pub async fn fetch_all(&self, store: &dyn Store) -> ApiResult<Vec<E>> {
        let rows = store.select(self.collection(), &self.predicates).await?;
        rows.iter().map(entity_from_row::<E>).collect()
    }
}

impl<E: Entity> Default for Query<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> fmt::Display for Query<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses: Vec<String> = self
            .predicates
            .iter()
            .map(|p| format!("{}.{} = {}", self.collection(), p.field, p.value))
            .collect();
        write!(f, "{}", clauses.join(" AND "))
    }
}
