//! User repository for database operations.
//!
//! This module provides database access for users, their password reset
//! tokens, and the stores they have hearted.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storefinder_core::{Email, StoreId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::user::User;

const USER_COLUMNS: &str = "id, email, name, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Create a new user with email, name, and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (email, name, password_hash)
             VALUES ($1, $2, $3)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        User::try_from(row)
    }

    /// Get a user and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let password_hash = row.password_hash;
        let user = User::try_from(row.user)?;
        Ok(Some((user, password_hash)))
    }

    /// Replace a user's name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the email belongs to another user.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET name = $2, email = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    /// Store a password reset token for a user, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_reset_token(
        &self,
        id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users
             SET reset_password_token = $2, reset_password_expires = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Find the user holding a reset token that has not yet expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_reset_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE reset_password_token = $1 AND reset_password_expires > NOW()"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Set a new password hash and clear the reset token.
    ///
    /// Only succeeds while the token is still valid; the token check and
    /// the update happen in one statement, so a token can be used once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reset_password(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users
             SET password_hash = $2,
                 reset_password_token = NULL,
                 reset_password_expires = NULL,
                 updated_at = NOW()
             WHERE reset_password_token = $1 AND reset_password_expires > NOW()
             RETURNING {USER_COLUMNS}"
        ))
        .bind(token)
        .bind(password_hash)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// IDs of the stores a user has hearted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn heart_ids(&self, id: UserId) -> Result<Vec<StoreId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, StoreId>(
            "SELECT store_id FROM hearts WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }

    /// Heart a store if it isn't hearted yet, otherwise remove the heart.
    ///
    /// Returns whether the store is hearted afterwards.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    pub async fn toggle_heart(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<bool, RepositoryError> {
        let removed = sqlx::query("DELETE FROM hearts WHERE user_id = $1 AND store_id = $2")
            .bind(user_id)
            .bind(store_id)
            .execute(self.pool)
            .await?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO hearts (user_id, store_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(store_id)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(true)
    }
}
