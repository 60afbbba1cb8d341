//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! sf-cli migrate
//! ```
//!
//! # Migration Files
//!
//! Migrations live in `crates/web/migrations/` and are embedded at compile
//! time:
//! ```text
//! migrations/
//! ├── 20250101000001_create_users.sql
//! ├── 20250101000002_create_stores.sql
//! ├── 20250101000003_create_hearts.sql
//! └── 20250101000004_create_sessions.sql
//! ```

use thiserror::Error;

use super::{DatabaseError, connect};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../web/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
