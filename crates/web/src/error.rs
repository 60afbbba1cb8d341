//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sentry::integrations::tracing::EventFilter;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::email::{EmailError, OUTBOX_LOG_TARGET};
use crate::services::uploads::UploadError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Sending email failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Storing an uploaded photo failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User may not act on this resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Email(_) => StatusCode::BAD_GATEWAY,
            Self::Upload(err) => match err {
                UploadError::NotAnImage
                | UploadError::UnsupportedFormat(_)
                | UploadError::Image(_) => StatusCode::BAD_REQUEST,
                UploadError::Io(_) | UploadError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::Validation(_)
                | AuthError::PasswordMismatch
                | AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Email(_) => "Failed to send email".to_string(),
            Self::Upload(err) => match err {
                UploadError::NotAnImage => err.to_string(),
                UploadError::UnsupportedFormat(_) | UploadError::Image(_) => {
                    "That image could not be read".to_string()
                }
                UploadError::Io(_) | UploadError::Task(_) => "Internal server error".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::UserNotFound => "User not found".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::Validation(errors) => errors.join("\n"),
                AuthError::PasswordMismatch => "Passwords do not match!".to_string(),
                AuthError::InvalidResetToken => {
                    "Password reset is invalid or has expired".to_string()
                }
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_string()
                }
            },
            Self::Forbidden(msg) => msg.clone(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

impl AppError {
    /// Whether this error is the server's fault (reported to Sentry).
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(RepositoryError::NotFound) => false,
            Self::Database(_) | Self::Internal(_) | Self::Email(_) => true,
            Self::Upload(err) => matches!(err, UploadError::Io(_) | UploadError::Task(_)),
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::PasswordHash),
            _ => false,
        }
    }
}

/// Decide how a tracing event reaches Sentry.
///
/// Errors and warnings become events, info and debug become breadcrumbs.
/// Events on [`OUTBOX_LOG_TARGET`] never leave the process.
#[must_use]
pub fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> EventFilter {
    sentry_filter_for(*metadata.level(), metadata.target())
}

fn sentry_filter_for(level: tracing::Level, target: &str) -> EventFilter {
    if target.starts_with(OUTBOX_LOG_TARGET) {
        return EventFilter::Ignore;
    }

    match level {
        tracing::Level::ERROR | tracing::Level::WARN => EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("stores", "Created store", Some(&[("store_id", "42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("store wes-coffee".to_string());
        assert_eq!(err.to_string(), "Not found: store wes-coffee");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Upload(UploadError::NotAnImage)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidResetToken)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_sentry_filter_levels() {
        use tracing::Level;

        let target = "storefinder_web::routes::stores";
        assert!(sentry_filter_for(Level::ERROR, target).bits() == EventFilter::Event.bits());
        assert!(sentry_filter_for(Level::WARN, target).bits() == EventFilter::Event.bits());
        assert!(sentry_filter_for(Level::INFO, target).bits() == EventFilter::Breadcrumb.bits());
        assert!(sentry_filter_for(Level::TRACE, target).bits() == EventFilter::Ignore.bits());
    }

    #[test]
    fn test_sentry_filter_keeps_reset_links_local() {
        use tracing::Level;

        for level in [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG] {
            assert!(
                sentry_filter_for(level, OUTBOX_LOG_TARGET).bits() == EventFilter::Ignore.bits()
            );
        }
    }

    #[tokio::test]
    async fn test_forbidden_message_is_shown() {
        let response =
            AppError::Forbidden("You must own a store in order to edit it!".to_string())
                .into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"You must own a store in order to edit it!");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::Internal("connection string leaked".to_string()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Internal server error");
    }
}
