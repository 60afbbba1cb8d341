//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! SF_USER_PASSWORD=correct-horse sf-cli user create -e wes@example.com -n "Wes"
//! ```
//!
//! The password comes from the environment so it stays out of shell history.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use storefinder_core::UserId;
use storefinder_web::services::auth::{AuthError, AuthService, Registration};

use super::{DatabaseError, connect};

/// Environment variable holding the new user's password.
pub const PASSWORD_VAR: &str = "SF_USER_PASSWORD";

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Password variable is missing.
    #[error("Missing environment variable: {PASSWORD_VAR}")]
    MissingPassword,

    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Registration was rejected.
    #[error("{}", describe(.0))]
    Auth(#[from] AuthError),
}

fn describe(error: &AuthError) -> String {
    match error {
        AuthError::Validation(errors) => errors.join("; "),
        AuthError::UserAlreadyExists => "A user with that email already exists".to_owned(),
        other => other.to_string(),
    }
}

/// Create a user with the same validation as the registration form.
///
/// # Errors
///
/// Returns an error if the password is unset, a field is invalid, the email
/// is taken, or the database fails.
pub async fn create_user(email: &str, name: &str) -> Result<UserId, UserError> {
    dotenvy::dotenv().ok();

    let password = std::env::var(PASSWORD_VAR)
        .map(SecretString::from)
        .map_err(|_| UserError::MissingPassword)?;

    let pool = connect().await?;

    let registration = Registration {
        name: name.to_owned(),
        email: email.to_owned(),
        password: password.expose_secret().to_owned(),
        password_confirm: password.expose_secret().to_owned(),
    };
    let user = AuthService::new(&pool).register(&registration).await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}
