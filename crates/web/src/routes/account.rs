//! Account route handlers.
//!
//! Profile editing for the logged-in user, plus the password reset flow
//! (request a link, open it, choose a new password).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use super::auth::log_in;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{Flash, FlashKind, PageContext, RequireAuth, flash, set_current_user};
use crate::services::auth::{AuthError, AuthService};
use crate::services::email::OUTBOX_LOG_TARGET;
use crate::state::AppState;

/// Shown for every forgot-password request, whether or not the account exists.
pub const RESET_SENT_MESSAGE: &str = "You have been emailed a password reset link.";

/// Shown when a reset token is unknown, used, or expired.
pub const RESET_INVALID_MESSAGE: &str = "Password reset is invalid or has expired";

// =============================================================================
// Form Types
// =============================================================================

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    pub name: String,
    pub email: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    #[serde(rename = "password-confirm")]
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub page: PageContext,
    pub name: String,
    pub email: String,
}

/// New-password page template.
#[derive(Template, WebTemplate)]
#[template(path = "reset.html")]
pub struct ResetTemplate {
    pub page: PageContext,
    pub token: String,
}

// =============================================================================
// Profile
// =============================================================================

/// Display the profile form.
pub async fn index(RequireAuth(user): RequireAuth, page: PageContext) -> impl IntoResponse {
    AccountTemplate {
        page,
        name: user.name,
        email: user.email.to_string(),
    }
}

/// Save the profile form and refresh the session copy of the user.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    mut page: PageContext,
    Form(form): Form<AccountForm>,
) -> Result<Response> {
    let errors = match AuthService::new(state.pool())
        .update_profile(user.id, &form.name, &form.email)
        .await
    {
        Ok(updated) => {
            set_current_user(&session, &updated.to_current_user())
                .await
                .map_err(|e| AppError::Internal(format!("Failed to update session: {e}")))?;
            tracing::info!(user_id = %updated.id, "Profile updated");

            flash(&session, FlashKind::Success, "Updated the profile!").await;
            return Ok(Redirect::to("/account").into_response());
        }
        Err(AuthError::Validation(errors)) => errors,
        Err(AuthError::UserAlreadyExists) => {
            vec!["A user with the given email is already registered".to_owned()]
        }
        Err(e) => return Err(e.into()),
    };

    page.flashes.extend(errors.into_iter().map(|message| Flash {
        kind: FlashKind::Error,
        message,
    }));
    Ok(AccountTemplate {
        page,
        name: form.name,
        email: form.email,
    }
    .into_response())
}

// =============================================================================
// Password Reset
// =============================================================================

/// Issue a reset link and email it.
///
/// The response is identical for known and unknown emails. Delivery failures
/// are logged; without SMTP configured the link is logged instead.
pub async fn forgot(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response> {
    let issued = AuthService::new(state.pool())
        .request_password_reset(&form.email)
        .await?;

    if let Some((user, token)) = issued {
        let reset_url = state
            .config()
            .absolute_url(&format!("/account/reset/{token}"))
            .map_err(|e| AppError::Internal(format!("Invalid base URL: {e}")))?;

        match state.email() {
            Some(email) => {
                if let Err(e) = email
                    .send_password_reset(&user.email, &user.name, reset_url.as_str())
                    .await
                {
                    tracing::error!(user_id = %user.id, error = %e, "Failed to send reset email");
                }
            }
            None => {
                tracing::info!(
                    target: OUTBOX_LOG_TARGET,
                    user_id = %user.id,
                    reset_url = %reset_url,
                    "SMTP not configured; password reset link not emailed"
                );
            }
        }
    }

    flash(&session, FlashKind::Success, RESET_SENT_MESSAGE).await;
    Ok(Redirect::to("/login").into_response())
}

/// Display the new-password form for a live token.
pub async fn reset_page(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Path(token): Path<String>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .validate_reset_token(&token)
        .await
    {
        Ok(_) => Ok(ResetTemplate { page, token }.into_response()),
        Err(AuthError::InvalidResetToken) => {
            flash(&session, FlashKind::Error, RESET_INVALID_MESSAGE).await;
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Set the new password, consume the token and log the user in.
pub async fn reset(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response> {
    let back = format!("/account/reset/{token}");

    let user = match AuthService::new(state.pool())
        .reset_password(&token, &form.password, &form.password_confirm)
        .await
    {
        Ok(user) => user,
        Err(AuthError::PasswordMismatch) => {
            flash(&session, FlashKind::Error, "Passwords do not match!").await;
            return Ok(Redirect::to(&back).into_response());
        }
        Err(AuthError::WeakPassword(message)) => {
            flash(&session, FlashKind::Error, message).await;
            return Ok(Redirect::to(&back).into_response());
        }
        Err(AuthError::InvalidResetToken) => {
            flash(&session, FlashKind::Error, RESET_INVALID_MESSAGE).await;
            return Ok(Redirect::to("/login").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    log_in(&session, &user).await?;
    flash(
        &session,
        FlashKind::Success,
        "Nice! Your password has been reset! You are now logged in!",
    )
    .await;
    Ok(Redirect::to("/").into_response())
}
