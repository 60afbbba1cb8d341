//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;

/// Connection string variables, in lookup order.
const DATABASE_URL_VARS: [&str; 2] = ["STOREFINDER_DATABASE_URL", "DATABASE_URL"];

/// Errors shared by commands that talk to the database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Neither connection string variable is set.
    #[error("Missing environment variable: STOREFINDER_DATABASE_URL (or DATABASE_URL)")]
    MissingUrl,

    /// Connecting failed.
    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),
}

/// Load `.env` and connect to the Storefinder database.
pub async fn connect() -> Result<PgPool, DatabaseError> {
    dotenvy::dotenv().ok();

    let url = DATABASE_URL_VARS
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .map(SecretString::from)
        .ok_or(DatabaseError::MissingUrl)?;

    tracing::info!("Connecting to database...");
    Ok(storefinder_web::db::create_pool(&url).await?)
}
