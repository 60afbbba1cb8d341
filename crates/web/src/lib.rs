//! Storefinder web application library.
//!
//! The binary in `main.rs` wires these modules into an axum server; the CLI
//! reuses the repositories and services for migrations and seeding.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
