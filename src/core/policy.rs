//! The policy gateway contract and a rule-based implementation

use crate::core::auth::{AuthContext, AuthPolicy, Operation};
use crate::core::entity::{Entity, EntitySchema};
use crate::core::error::{ApiResult, ControllerError};
use crate::core::field::Attributes;
use crate::core::fields::Fields;
use async_trait::async_trait;

/// Authorization authority consulted by the controller for every operation.
///
/// A denial is reported as [`ControllerError::Forbidden`]. Gateways backed by
/// remote services may also surface their own failures through
/// [`ApiError`](crate::core::error::ApiError).
#[async_trait]
pub trait PolicyGateway<E: Entity>: Send + Sync {
    /// May `actor` create `entity`, touching `fields`?
    async fn grant_create(&self, actor: &AuthContext, entity: &E, fields: &Fields)
    -> ApiResult<()>;

    /// May `actor` read `fields` of `entity`? Returns the permitted subset.
    async fn grant_read(&self, actor: &AuthContext, entity: &E, fields: &Fields)
    -> ApiResult<Fields>;

    /// May `actor` change `fields`, turning `before` into `after`?
    async fn grant_update(
        &self,
        actor: &AuthContext,
        before: &E,
        after: &E,
        fields: &Fields,
    ) -> ApiResult<()>;

    /// May `actor` delete the entity? There is no after-state, so `before`
    /// and `after` are the same entity.
    async fn grant_delete(&self, actor: &AuthContext, before: &E, after: &E) -> ApiResult<()>;

    /// May `actor` query the collection with the raw predicate map `kw`?
    async fn grant_query(
        &self,
        actor: &AuthContext,
        schema: &'static EntitySchema,
        kw: &Attributes,
    ) -> ApiResult<()>;
}

/// Per-operation rules evaluated against the caller and the entity owner.
///
/// On top of the rules:
/// - reads by anyone but the owner are narrowed to the public attributes
/// - updates may not change the composite identity
/// - queries may only name filterable attributes
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    pub create: AuthPolicy,
    pub read: AuthPolicy,
    pub update: AuthPolicy,
    pub delete: AuthPolicy,
    pub query: AuthPolicy,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            create: AuthPolicy::Authenticated,
            read: AuthPolicy::Public,
            update: AuthPolicy::Owner,
            delete: AuthPolicy::Owner,
            query: AuthPolicy::Authenticated,
        }
    }
}

impl AccessPolicy {
    fn rule(&self, operation: Operation) -> &AuthPolicy {
        match operation {
            Operation::Create => &self.create,
            Operation::Read => &self.read,
            Operation::Update => &self.update,
            Operation::Delete => &self.delete,
            Operation::Query => &self.query,
        }
    }

    fn require(
        &self,
        operation: Operation,
        actor: &AuthContext,
        owner_id: Option<i64>,
    ) -> Result<(), ControllerError> {
        if self.rule(operation).check(actor, owner_id) {
            Ok(())
        } else {
            Err(ControllerError::forbidden(
                operation,
                format!("{:?} rule not satisfied", self.rule(operation)),
            ))
        }
    }
}

#[async_trait]
impl<E: Entity> PolicyGateway<E> for AccessPolicy {
    async fn grant_create(
        &self,
        actor: &AuthContext,
        entity: &E,
        _fields: &Fields,
    ) -> ApiResult<()> {
        Ok(self.require(Operation::Create, actor, entity.owner_id())?)
    }

    async fn grant_read(
        &self,
        actor: &AuthContext,
        entity: &E,
        fields: &Fields,
    ) -> ApiResult<Fields> {
        let owner_id = entity.owner_id();
        self.require(Operation::Read, actor, owner_id)?;

        let schema = E::schema();
        let visible = if actor.owns(owner_id) {
            schema.all_fields()
        } else {
            schema.public_fields()
        };
        Ok(fields.intersection(&visible))
    }

    async fn grant_update(
        &self,
        actor: &AuthContext,
        before: &E,
        after: &E,
        _fields: &Fields,
    ) -> ApiResult<()> {
        self.require(Operation::Update, actor, before.owner_id())?;
        if before.identity() != after.identity() {
            return Err(ControllerError::forbidden(
                Operation::Update,
                format!("{} identity cannot change", E::schema().name),
            )
            .into());
        }
        Ok(())
    }

    async fn grant_delete(&self, actor: &AuthContext, before: &E, _after: &E) -> ApiResult<()> {
        Ok(self.require(Operation::Delete, actor, before.owner_id())?)
    }

    async fn grant_query(
        &self,
        actor: &AuthContext,
        schema: &'static EntitySchema,
        kw: &Attributes,
    ) -> ApiResult<()> {
        self.require(Operation::Query, actor, None)?;
        let rejected: Vec<&str> = kw
            .keys()
            .map(String::as_str)
            .filter(|name| !schema.is_filterable(name))
            .collect();
        if !rejected.is_empty() {
            return Err(ControllerError::forbidden(
                Operation::Query,
                format!("cannot filter {} by {}", schema.name, rejected.join(", ")),
            )
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes;
    use crate::entities::Account;

    fn account(owner: i64) -> Account {
        Account {
            id: "1".into(),
            provider_id: "soundcloud".into(),
            user_id: Some(owner),
            title: Some("foo".into()),
            access_token: Some("secret".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_owner_reads_everything_requested() {
        let policy = AccessPolicy::default();
        let fields = Fields::new(["title", "access_token"]);
        let granted =
            PolicyGateway::<Account>::grant_read(&policy, &AuthContext::user(1), &account(1), &fields)
                .await
                .unwrap();
        assert_eq!(granted, fields);
    }

    #[tokio::test]
    async fn test_others_read_public_subset() {
        let policy = AccessPolicy::default();
        let fields = Fields::new(["title", "access_token"]);
        let granted =
            PolicyGateway::<Account>::grant_read(&policy, &AuthContext::user(2), &account(1), &fields)
                .await
                .unwrap();
        assert_eq!(granted, Fields::new(["title"]));
    }

    #[tokio::test]
    async fn test_update_denies_non_owner() {
        let policy = AccessPolicy::default();
        let before = account(1);
        let err = policy
            .grant_update(&AuthContext::user(2), &before, &before, &Fields::new(["title"]))
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
    }

    #[tokio::test]
    async fn test_update_denies_identity_transition() {
        let policy = AccessPolicy::default();
        let before = account(1);
        let mut after = before.clone();
        after.provider_id = "youtube".into();
        let err = policy
            .grant_update(&AuthContext::user(1), &before, &after, &Fields::new(["provider_id"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("identity"));
    }

    #[tokio::test]
    async fn test_delete_owner_only() {
        let policy = AccessPolicy::default();
        let entity = account(1);
        assert!(policy.grant_delete(&AuthContext::user(1), &entity, &entity).await.is_ok());
        assert!(policy.grant_delete(&AuthContext::Anonymous, &entity, &entity).await.is_err());
    }

    #[tokio::test]
    async fn test_query_rejects_unfilterable_names() {
        let policy = AccessPolicy::default();
        let actor = AuthContext::user(1);
        let ok = attributes! { "title" => "foo" };
        assert!(
            PolicyGateway::<Account>::grant_query(&policy, &actor, Account::schema(), &ok)
                .await
                .is_ok()
        );

        let broad = attributes! { "access_token" => "x" };
        let err = PolicyGateway::<Account>::grant_query(&policy, &actor, Account::schema(), &broad)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("access_token"));
    }

    #[tokio::test]
    async fn test_anonymous_cannot_create_by_default() {
        let policy = AccessPolicy::default();
        let err = policy
            .grant_create(&AuthContext::Anonymous, &account(1), &Fields::new(["id"]))
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 403);
    }
}
