//! Business logic services for storefinder.
//!
//! # Services
//!
//! - `auth` - Registration, password login, profile updates, password resets
//! - `email` - Transactional email (password reset links)
//! - `uploads` - Store photo validation, resizing, and storage

pub mod auth;
pub mod email;
pub mod uploads;
