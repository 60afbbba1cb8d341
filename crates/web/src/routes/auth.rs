//! Authentication route handlers.
//!
//! Login, logout and registration with email and password. Sessions are
//! cookie-backed; a successful login or registration stores a
//! [`CurrentUser`](crate::models::CurrentUser) in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    Flash, FlashKind, PageContext, clear_current_user, flash, set_current_user,
};
use crate::models::User;
use crate::services::auth::{AuthError, AuthService, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "password-confirm")]
    pub password_confirm: String,
}

impl From<RegisterForm> for Registration {
    fn from(form: RegisterForm) -> Self {
        Self {
            name: form.name,
            email: form.email,
            password: form.password,
            password_confirm: form.password_confirm,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template (also hosts the forgot-password form).
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub name: String,
    pub email: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// Put `user` in the session and tag Sentry events with them.
pub(crate) async fn log_in(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &user.to_current_user())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to set session: {e}")))?;

    let user_id = user.id.to_string();
    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "User logged in", Some(&[("user_id", user_id.as_str())]));
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page(page: PageContext) -> impl IntoResponse {
    LoginTemplate { page }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let user = match AuthService::new(state.pool())
        .login_with_password(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Failed login attempt");
            flash(&session, FlashKind::Error, "Failed Login!").await;
            return Ok(Redirect::to("/login").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    log_in(&session, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    flash(&session, FlashKind::Success, "You are now logged in!").await;
    Ok(Redirect::to("/").into_response())
}

/// Log out and return to the store list.
pub async fn logout(session: Session) -> Result<Response> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to clear session: {e}")))?;
    clear_sentry_user();

    flash(&session, FlashKind::Success, "You are now logged out!").await;
    Ok(Redirect::to("/").into_response())
}

/// Display the registration page.
pub async fn register_page(page: PageContext) -> impl IntoResponse {
    RegisterTemplate {
        page,
        name: String::new(),
        email: String::new(),
    }
}

/// Handle registration form submission.
///
/// Validation failures re-render the form with every message and the
/// submitted name and email kept. Success logs the new user in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    mut page: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let (name, email) = (form.name.clone(), form.email.clone());
    let registration = Registration::from(form);

    let errors = match AuthService::new(state.pool()).register(&registration).await {
        Ok(user) => {
            log_in(&session, &user).await?;
            flash(&session, FlashKind::Success, "You are now logged in!").await;
            return Ok(Redirect::to("/").into_response());
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
    Ok(RegisterTemplate { page, name, email }.into_response())
}
