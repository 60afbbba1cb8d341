//! Storefinder Core - Shared types library.
//!
//! This crate provides common types used across all Storefinder components:
//! - `web` - The public store directory site
//! - `cli` - Command-line tools for migrations, users and sample data
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, slugs and coordinates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
