//! Field projections
//!
//! A [`Fields`] set names the attributes a caller wants to see, or the
//! attributes an operation touches when it is checked against a policy.
//! An empty set means "unspecified": the controller substitutes the
//! entity's public attributes.

use crate::core::entity::Entity;
use crate::core::field::Attributes;
use indexmap::IndexSet;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// An ordered set of attribute names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(IndexSet<String>);

impl Fields {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// The unspecified projection
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Names present in both sets, in `self`'s order
    pub fn intersection(&self, other: &Fields) -> Fields {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    /// Names of `self` missing from `other`
    pub fn difference(&self, other: &Fields) -> Fields {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    pub fn is_subset(&self, other: &Fields) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Fall back to `default` when the projection is unspecified
    pub fn or_default_to(self, default: Fields) -> Fields {
        if self.is_empty() { default } else { self }
    }

    /// Copy the named attributes out of `entity`
    ///
    /// Names the entity does not declare are skipped.
    pub fn project<E: Entity>(&self, entity: &E) -> Attributes {
        self.iter()
            .filter_map(|name| {
                entity
                    .field_value(name)
                    .map(|value| (name.to_string(), value))
            })
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Fields {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<&[&str]> for Fields {
    fn from(names: &[&str]) -> Self {
        Self::new(names.iter().copied())
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a String;
    type IntoIter = indexmap::set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::fmt::Display for Fields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// An entity paired with the fields a caller may see
///
/// Serializes as the projected attribute map only.
#[derive(Debug, Clone)]
pub struct Projection<E> {
    entity: E,
    fields: Fields,
}

impl<E: Entity> Projection<E> {
    pub fn new(entity: E, fields: Fields) -> Self {
        Self { entity, fields }
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_entity(self) -> E {
        self.entity
    }

    /// The caller-facing attribute map
    pub fn attributes(&self) -> Attributes {
        self.fields.project(&self.entity)
    }
}

impl<E: Entity> Serialize for Projection<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let attributes = self.attributes();
        let mut map = serializer.serialize_map(Some(attributes.len()))?;
        for (name, value) in &attributes {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Account;

    #[test]
    fn test_fields_deduplicate_and_keep_order() {
        let fields = Fields::new(["title", "id", "title"]);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.iter().collect::<Vec<_>>(), vec!["title", "id"]);
    }

    #[test]
    fn test_intersection_narrows() {
        let requested = Fields::new(["id", "title", "access_token"]);
        let permitted = Fields::new(["title", "id", "image"]);
        let narrowed = requested.intersection(&permitted);
        assert_eq!(narrowed, Fields::new(["id", "title"]));
    }

    #[test]
    fn test_difference_and_subset() {
        let a = Fields::new(["a", "b"]);
        let b = Fields::new(["a", "b", "c"]);
        assert!(a.is_subset(&b));
        assert!(!b.is_subset(&a));
        assert_eq!(b.difference(&a), Fields::new(["c"]));
    }

    #[test]
    fn test_unspecified_projection_uses_default() {
        let fields = Fields::empty().or_default_to(Fields::new(["id"]));
        assert_eq!(fields, Fields::new(["id"]));

        let fields = Fields::new(["title"]).or_default_to(Fields::new(["id"]));
        assert_eq!(fields, Fields::new(["title"]));
    }

    #[test]
    fn test_project_copies_only_named_attributes() {
        let account = Account {
            id: "42".into(),
            provider_id: "soundcloud".into(),
            title: Some("foo".into()),
            access_token: Some("secret".into()),
            ..Default::default()
        };
        let projected = Fields::new(["id", "title", "not_a_field"]).project(&account);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected["id"].as_string(), Some("42"));
        assert_eq!(projected["title"].as_string(), Some("foo"));
        assert!(!projected.contains_key("access_token"));
    }

    #[test]
    fn test_projection_serializes_projected_map() {
        let account = Account {
            id: "42".into(),
            provider_id: "soundcloud".into(),
            access_token: Some("secret".into()),
            ..Default::default()
        };
        let projection = Projection::new(account, Fields::new(["id", "provider_id"]));
        let json = serde_json::to_value(&projection).expect("serialize should succeed");
        assert_eq!(
            json,
            serde_json::json!({"id": "42", "provider_id": "soundcloud"})
        );
    }
}
