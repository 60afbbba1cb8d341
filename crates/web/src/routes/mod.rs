//! HTTP route handlers for storefinder.
//!
//! # Route Structure
//!
//! ```text
//! # Stores
//! GET  /                        - Store list
//! GET  /stores                  - Store list
//! GET  /add                     - New store form (auth)
//! POST /add                     - Create store (auth, multipart)
//! POST /add/{id}                - Update store (owner, multipart)
//! GET  /stores/{id}/edit        - Edit store form (owner)
//! GET  /store/{slug}            - Store page
//! GET  /tags                    - Tag counts with every store
//! GET  /tags/{tag}              - Tag counts with stores carrying the tag
//! GET  /map                     - Map page
//! GET  /hearts                  - Hearted stores (auth)
//!
//! # Auth
//! GET  /login                   - Login page
//! POST /login                   - Login action (rate limited)
//! GET  /register                - Register page
//! POST /register                - Register action (rate limited)
//! GET  /logout                  - Logout action
//! POST /logout                  - Logout action
//!
//! # Account
//! GET  /account                 - Profile form (auth)
//! POST /account                 - Save profile (auth)
//! POST /account/forgot          - Email a reset link (rate limited)
//! GET  /account/reset/{token}   - New password form
//! POST /account/reset/{token}   - Set new password (rate limited)
//!
//! # JSON API (rate limited)
//! GET  /api/search?q=           - Store search
//! GET  /api/stores/near?lat=&lng= - Stores near a point
//! POST /api/stores/{id}/heart   - Toggle heart (auth, 401 JSON)
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod stores;
pub mod tags;
pub mod views;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Largest accepted store form body (the photo dominates).
pub const STORE_FORM_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/stores", get(stores::index))
        .route(
            "/add",
            get(stores::add_page)
                .post(stores::create)
                .layer(DefaultBodyLimit::max(STORE_FORM_BODY_LIMIT)),
        )
        .route(
            "/add/{id}",
            post(stores::update).layer(DefaultBodyLimit::max(STORE_FORM_BODY_LIMIT)),
        )
        .route("/stores/{id}/edit", get(stores::edit_page))
        .route("/store/{slug}", get(stores::show))
        .route("/tags", get(tags::index))
        .route("/tags/{tag}", get(tags::show))
        .route("/map", get(stores::map_page))
        .route("/hearts", get(stores::hearts))
}

/// Create the auth and account routes router.
///
/// Only the credential-handling POSTs are rate limited.
pub fn auth_routes(trust_proxy: bool) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page)
                .merge(post(auth::login).layer(auth_rate_limiter(trust_proxy))),
        )
        .route(
            "/register",
            get(auth::register_page)
                .merge(post(auth::register).layer(auth_rate_limiter(trust_proxy))),
        )
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/account", get(account::index).post(account::update))
        .route(
            "/account/forgot",
            post(account::forgot).layer(auth_rate_limiter(trust_proxy)),
        )
        .route(
            "/account/reset/{token}",
            get(account::reset_page)
                .merge(post(account::reset).layer(auth_rate_limiter(trust_proxy))),
        )
}

/// Create the JSON API routes router.
pub fn api_routes(trust_proxy: bool) -> Router<AppState> {
    Router::new()
        .route("/search", get(api::search))
        .route("/stores/near", get(api::near))
        .route("/stores/{id}/heart", post(api::toggle_heart))
        .route_layer(api_rate_limiter(trust_proxy))
}

/// Create all routes for storefinder.
///
/// `trust_proxy` makes the rate limiters key on proxy client-IP headers.
pub fn routes(trust_proxy: bool) -> Router<AppState> {
    Router::new()
        .merge(store_routes())
        .merge(auth_routes(trust_proxy))
        .nest("/api", api_routes(trust_proxy))
}
