//! Concrete entity types managed by the controller

pub mod account;
pub mod image;
pub mod macros;
pub mod provider;
pub mod user;

pub use account::{Account, PLATFORM_PROVIDER};
pub use image::Image;
pub use provider::Provider;
pub use user::User;
