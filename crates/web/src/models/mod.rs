//! Domain models for storefinder.

pub mod session;
pub mod store;
pub mod user;

pub use session::CurrentUser;
pub use store::{Location, Store, StoreAuthor, StoreForm, StoreInput, TAG_CHOICES, TagCount};
pub use user::User;
