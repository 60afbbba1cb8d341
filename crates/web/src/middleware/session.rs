//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions, with the
//! session cookie signed by the configured session secret.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tower_sessions::cookie::{Key, KeyError};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefinderConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "sf_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Session layer type with a signed cookie.
pub type StorefinderSessionLayer = SessionManagerLayer<PostgresStore, SignedCookie>;

/// Create the session layer with `PostgreSQL` store.
///
/// # Arguments
///
/// * `pool` - `PostgreSQL` connection pool
/// * `config` - Application configuration (for session secret)
///
/// # Errors
///
/// Returns `KeyError` if the session secret is too short to sign cookies.
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefinderConfig,
) -> Result<StorefinderSessionLayer, KeyError> {
    // The tower_sessions.session table is created by migration
    let store = PostgresStore::new(pool.clone());
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
