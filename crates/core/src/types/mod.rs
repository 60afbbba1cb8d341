//! Core types for Storefinder.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod avatar;
pub mod email;
pub mod geo;
pub mod id;
pub mod slug;

pub use avatar::avatar_url;
pub use email::{Email, EmailError};
pub use geo::{BoundingBox, GeoError, GeoPoint};
pub use id::*;
pub use slug::Slug;
