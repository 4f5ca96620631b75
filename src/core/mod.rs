//! Core module containing the fundamental traits and types of the controller

pub mod auth;
pub mod entity;
pub mod error;
pub mod field;
pub mod fields;
pub mod merge;
pub mod policy;
pub mod query;
pub mod store;

pub use auth::{AuthContext, AuthPolicy, Operation};
pub use entity::{Entity, EntitySchema};
pub use error::{ApiError, ApiResult, ControllerError, ErrorResponse, StorageError};
pub use field::{Attributes, FieldType, FieldValue, Identity};
pub use fields::{Fields, Projection};
pub use merge::{eject, merge};
pub use policy::{AccessPolicy, PolicyGateway};
pub use query::{Predicate, Query};
pub use store::{Row, Store};
