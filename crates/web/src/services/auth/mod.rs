//! Authentication service.
//!
//! Provides password registration and login, profile updates, and the
//! password reset flow.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;
use tracing::instrument;

use storefinder_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Random bytes in a password reset token (hex encoded in links).
const RESET_TOKEN_BYTES: usize = 20;

/// How long a password reset link stays valid, in hours.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Registration form fields, as submitted.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Authentication service.
///
/// Handles user registration, login, and password resets.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` with every failing field's message.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip_all)]
    pub async fn register(&self, form: &Registration) -> Result<User, AuthError> {
        let (name, email) = validate_registration(form).map_err(AuthError::Validation)?;
        let password_hash = hash_password(&form.password)?;

        let user = self
            .users
            .create_with_password(&email, &name, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip_all)]
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Change a user's display name and email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the name is blank or the email invalid.
    /// Returns `AuthError::UserAlreadyExists` if another account uses the email.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        name: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        let mut errors = Vec::new();
        let name = name.trim();
        if name.is_empty() {
            errors.push("You must supply a name!".to_owned());
        }
        let email = Email::parse(email);
        if email.is_err() {
            errors.push("That Email is not valid!".to_owned());
        }
        let email = match email {
            Ok(email) if errors.is_empty() => email,
            _ => return Err(AuthError::Validation(errors)),
        };

        self.users
            .update_profile(user_id, name, &email)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Issue a password reset token for the account with `email`.
    ///
    /// Returns `None` for unknown or malformed emails. Callers must respond
    /// the same way in both cases so accounts can't be enumerated.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    #[instrument(skip_all)]
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };
        let Some(user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };

        let token = generate_reset_token();
        self.users
            .set_reset_token(user.id, &token, Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS))
            .await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");
        Ok(Some((user, token)))
    }

    /// Look up the user for a reset token that hasn't expired.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` if the token is unknown or expired.
    pub async fn validate_reset_token(&self, token: &str) -> Result<User, AuthError> {
        self.users
            .get_by_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidResetToken)
    }

    /// Set a new password using a reset token, consuming the token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::InvalidResetToken` if the token is unknown or expired.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User, AuthError> {
        if password != password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(password)?;

        let password_hash = hash_password(password)?;
        let user = self
            .users
            .reset_password(token, &password_hash)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(user)
    }
}

/// Validate registration fields, collecting every failure.
fn validate_registration(form: &Registration) -> Result<(String, Email), Vec<String>> {
    let mut errors = Vec::new();

    let name = form.name.trim();
    if name.is_empty() {
        errors.push("You must supply a name!".to_owned());
    }

    let email = match Email::parse(&form.email) {
        Ok(email) => Some(email),
        Err(_) => {
            errors.push("That Email is not valid!".to_owned());
            None
        }
    };

    if form.password.is_empty() {
        errors.push("Password cannot be blank!".to_owned());
    } else if let Err(AuthError::WeakPassword(msg)) = validate_password(&form.password) {
        errors.push(msg);
    }

    if form.password_confirm.is_empty() {
        errors.push("Confirmed Password cannot be blank!".to_owned());
    } else if form.password_confirm != form.password {
        errors.push("Oops! Your passwords do not match".to_owned());
    }

    match email {
        Some(email) if errors.is_empty() => Ok((name.to_owned(), email)),
        _ => Err(errors),
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Generate a random, URL-safe password reset token.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration {
            name: " Wes ".to_owned(),
            email: " Wes@Example.com ".to_owned(),
            password: "correct horse".to_owned(),
            password_confirm: "correct horse".to_owned(),
        }
    }

    #[test]
    fn test_validate_registration_normalizes() {
        let (name, email) = validate_registration(&registration()).unwrap();
        assert_eq!(name, "Wes");
        assert_eq!(email.as_str(), "wes@example.com");
    }

    #[test]
    fn test_validate_registration_collects_errors() {
        let errors = validate_registration(&Registration::default()).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "You must supply a name!".to_owned(),
                "That Email is not valid!".to_owned(),
                "Password cannot be blank!".to_owned(),
                "Confirmed Password cannot be blank!".to_owned(),
            ]
        );
    }

    #[test]
    fn test_validate_registration_mismatch() {
        let mut form = registration();
        form.password_confirm = "something else".to_owned();
        let errors = validate_registration(&form).unwrap_err();
        assert_eq!(errors, vec!["Oops! Your passwords do not match".to_owned()]);
    }

    #[test]
    fn test_validate_registration_short_password() {
        let mut form = registration();
        form.password = "short".to_owned();
        form.password_confirm = "short".to_owned();
        let errors = validate_registration(&form).unwrap_err();
        assert_eq!(errors, vec!["Password must be at least 8 characters".to_owned()]);
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2hunter2", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_reset_token_is_hex_and_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), RESET_TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
