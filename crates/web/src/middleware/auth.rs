//! Authentication middleware and extractors.
//!
//! Provides the extractor for requiring a logged-in user in route handlers.

use axum::{
    Json,
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use super::flash::{FlashKind, flash};
use crate::models::session::{CurrentUser, keys};

/// Message shown when a guest hits a page that needs an account.
pub const LOGIN_REQUIRED_MESSAGE: &str = "Oops you must be logged in to do that!";

/// Extractor that requires an authenticated user.
///
/// If the user is not logged in, HTML requests are redirected to the login
/// page with an error flash and `/api/` requests get a 401 JSON response.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": LOGIN_REQUIRED_MESSAGE })),
            )
                .into_response(),
        }
    }
}

/// Whether the request targets the JSON API.
///
/// Nested routers see the path with their prefix stripped, so the original
/// URI is checked first.
fn is_api_request(parts: &Parts) -> bool {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |OriginalUri(uri)| uri)
        .path()
        .starts_with("/api/")
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_api = is_api_request(parts);

        // Get the session from extensions (set by SessionManagerLayer)
        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(AuthRejection::Unauthorized);
        };

        let user: Option<CurrentUser> = session
            .get(keys::CURRENT_USER)
            .await
            .ok()
            .flatten();

        match user {
            Some(user) => Ok(Self(user)),
            None if is_api => Err(AuthRejection::Unauthorized),
            None => {
                flash(session, FlashKind::Error, LOGIN_REQUIRED_MESSAGE).await;
                Err(AuthRejection::RedirectToLogin)
            }
        }
    }
}

/// Helper to set the current user in the session.
///
/// Cycles the session ID first so a pre-login session ID can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(keys::CURRENT_USER).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::Request,
        routing::{get, post},
    };
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use storefinder_core::{Email, UserId};

    use super::*;
    use crate::middleware::flash::take_flashes;

    fn parts_with_session(path: &str, session: &Session) -> Parts {
        let (mut parts, ()) = Request::builder().uri(path).body(()).unwrap().into_parts();
        parts.extensions.insert(session.clone());
        parts
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn user() -> CurrentUser {
        CurrentUser {
            id: UserId::new(7),
            email: Email::parse("wes@example.com").unwrap(),
            name: "Wes".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_require_auth_redirects_html_with_flash() {
        let session = session();
        let mut parts = parts_with_session("/add", &session);

        let rejection = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, AuthRejection::RedirectToLogin));

        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");

        let flashes = take_flashes(&session).await.unwrap();
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].kind, FlashKind::Error);
        assert_eq!(flashes[0].message, LOGIN_REQUIRED_MESSAGE);
    }

    #[tokio::test]
    async fn test_require_auth_api_returns_401() {
        let session = session();
        let mut parts = parts_with_session("/api/stores/1/heart", &session);

        let rejection = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, AuthRejection::Unauthorized));
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
        assert!(take_flashes(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nested_api_route_returns_401_json() {
        let app = Router::new()
            .nest(
                "/api",
                Router::new().route(
                    "/stores/{id}/heart",
                    post(|RequireAuth(user): RequireAuth| async move { user.name }),
                ),
            )
            .layer(SessionManagerLayer::new(MemoryStore::default()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/stores/1/heart")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get("location").is_none());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], LOGIN_REQUIRED_MESSAGE);
    }

    #[tokio::test]
    async fn test_nested_html_route_redirects_to_login() {
        let app = Router::new()
            .nest(
                "/stores",
                Router::new().route(
                    "/{id}/edit",
                    get(|RequireAuth(user): RequireAuth| async move { user.name }),
                ),
            )
            .layer(SessionManagerLayer::new(MemoryStore::default()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stores/1/edit")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
    }

    #[tokio::test]
    async fn test_require_auth_accepts_logged_in_user() {
        let session = session();
        set_current_user(&session, &user()).await.unwrap();
        let mut parts = parts_with_session("/add", &session);

        let RequireAuth(current) = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .ok()
            .unwrap();
        assert_eq!(current.id, UserId::new(7));
        assert_eq!(current.name, "Wes");
    }

    #[tokio::test]
    async fn test_require_auth_rejects_after_logout() {
        let session = session();
        set_current_user(&session, &user()).await.unwrap();
        clear_current_user(&session).await.unwrap();
        let mut parts = parts_with_session("/hearts", &session);

        let rejection = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, AuthRejection::RedirectToLogin));
    }
}
