//! Entity traits defining the core abstraction for all persisted types

use crate::core::error::ControllerError;
use crate::core::field::{Attributes, FieldValue, Identity};
use crate::core::fields::Fields;

/// Static classification of an entity type's attributes.
///
/// Every entity type declares one schema. The controller consults it
/// generically:
/// - `key`: the composite identity, immutable after creation
/// - `public`: exposed to a caller when no projection is requested
/// - `mutable`: settable through update payloads
/// - `filterable`: usable as an equality predicate in queries
#[derive(Debug)]
pub struct EntitySchema {
    /// Collection name (e.g. "account")
    pub name: &'static str,
    pub key: &'static [&'static str],
    pub fields: &'static [&'static str],
    pub public: &'static [&'static str],
    pub mutable: &'static [&'static str],
    pub filterable: &'static [&'static str],
}

impl EntitySchema {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains(&name)
    }

    pub fn is_key(&self, name: &str) -> bool {
        self.key.contains(&name)
    }

    pub fn is_public(&self, name: &str) -> bool {
        self.public.contains(&name)
    }

    pub fn is_mutable(&self, name: &str) -> bool {
        self.mutable.contains(&name)
    }

    pub fn is_filterable(&self, name: &str) -> bool {
        self.filterable.contains(&name)
    }

    pub fn all_fields(&self) -> Fields {
        Fields::new(self.fields.iter().copied())
    }

    pub fn public_fields(&self) -> Fields {
        Fields::new(self.public.iter().copied())
    }

    pub fn mutable_fields(&self) -> Fields {
        Fields::new(self.mutable.iter().copied())
    }

    /// Check that `ids` names exactly the composite key and reorder it
    /// into key declaration order.
    pub fn identity(&self, ids: &Identity) -> Result<Identity, ControllerError> {
        let matches_shape =
            ids.len() == self.key.len() && self.key.iter().all(|k| ids.contains_key(*k));
        if !matches_shape {
            let given: Vec<&str> = ids.keys().map(String::as_str).collect();
            return Err(ControllerError::Conflict {
                message: format!(
                    "identity ({}) does not match the {} key ({})",
                    given.join(", "),
                    self.name,
                    self.key.join(", ")
                ),
            });
        }

        Ok(self
            .key
            .iter()
            .map(|k| (k.to_string(), ids[*k].clone()))
            .collect())
    }
}

/// Ownership of an entity, as far as policies are concerned
pub trait OwnerId {
    fn owner_id(&self) -> Option<i64>;
}

impl OwnerId for i64 {
    fn owner_id(&self) -> Option<i64> {
        Some(*self)
    }
}

impl OwnerId for Option<i64> {
    fn owner_id(&self) -> Option<i64> {
        *self
    }
}

/// Base trait for all persisted entities.
///
/// Implementations are usually generated with [`impl_entity!`](crate::impl_entity),
/// which derives the schema and a per-field getter/setter table.
pub trait Entity: Clone + Send + Sync + 'static {
    /// The declared classification of this entity type
    fn schema() -> &'static EntitySchema;

    /// Get the value of a declared attribute
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Set a declared attribute
    ///
    /// Fails with a 400 conflict on undeclared names or mistyped values.
    fn assign(&mut self, field: &str, value: FieldValue) -> Result<(), ControllerError>;

    /// An instance with every attribute at its default
    fn blank() -> Self;

    /// The user owning this entity, if any
    fn owner_id(&self) -> Option<i64> {
        None
    }

    /// The composite key, in declaration order
    fn identity(&self) -> Identity {
        Self::schema()
            .key
            .iter()
            .map(|k| (k.to_string(), self.field_value(k).unwrap_or(FieldValue::Null)))
            .collect()
    }

    /// Every declared attribute, in declaration order
    fn attributes(&self) -> Attributes {
        Self::schema()
            .fields
            .iter()
            .map(|k| (k.to_string(), self.field_value(k).unwrap_or(FieldValue::Null)))
            .collect()
    }

    /// Build an instance from an attribute mapping, defaulting the rest
    fn from_attributes(attributes: &Attributes) -> Result<Self, ControllerError> {
        let mut entity = Self::blank();
        for (name, value) in attributes {
            entity.assign(name, value.clone())?;
        }
        Ok(entity)
    }
}
