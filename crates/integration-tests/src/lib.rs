//! Shared helpers for Storefinder HTTP integration tests.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the server against a scratch database. The suite
//! # plays the reverse proxy, so the server must trust its client-IP headers.
//! cargo run -p storefinder-cli -- migrate
//! STOREFINDER_TRUST_PROXY=true cargo run -p storefinder-web
//!
//! # Run the ignored integration tests
//! cargo test -p storefinder-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFINDER_TEST_URL` - Server under test (default `http://127.0.0.1:7777`)
//! - `STOREFINDER_DATABASE_URL` / `DATABASE_URL` - Same database as the server,
//!   used to read reset tokens that would normally arrive by email

use reqwest::{
    Client, Response,
    header::{HeaderMap, HeaderValue, LOCATION},
    redirect::Policy,
};
use sqlx::PgPool;
use uuid::Uuid;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFINDER_TEST_URL").unwrap_or_else(|_| "http://127.0.0.1:7777".to_string())
}

/// Absolute URL for a site path.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// Client with its own cookie jar that does not follow redirects, so tests
/// can assert on `Location`.
///
/// Each client claims a distinct `X-Forwarded-For` address so the per-IP
/// rate limit on credential endpoints doesn't throttle the suite. The header
/// only counts when the server runs with `STOREFINDER_TRUST_PROXY=true`.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    let id = Uuid::new_v4();
    let [a, b, c, ..] = id.into_bytes();
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&format!("10.{a}.{b}.{c}")).expect("valid header value"),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// An email address no other test run has used.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// GET a path and return the body (flash messages are drained by this).
///
/// # Panics
///
/// Panics if the request fails.
pub async fn page(client: &Client, path: &str) -> String {
    client
        .get(url(path))
        .send()
        .await
        .expect("Failed to GET page")
        .text()
        .await
        .expect("Failed to read page")
}

/// Register (and so log in) a new user with `client`.
///
/// # Panics
///
/// Panics if the request fails or registration doesn't redirect home.
pub async fn register(client: &Client, name: &str, email: &str, password: &str) {
    let resp = client
        .post(url("/register"))
        .form(&[
            ("name", name),
            ("email", email),
            ("password", password),
            ("password-confirm", password),
        ])
        .send()
        .await
        .expect("Failed to register");

    assert_eq!(location(&resp).as_deref(), Some("/"), "registration failed");
}

/// Connect to the server's database.
///
/// # Panics
///
/// Panics if no database URL is set or the connection fails.
pub async fn db() -> PgPool {
    let url = std::env::var("STOREFINDER_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("STOREFINDER_DATABASE_URL or DATABASE_URL must be set");
    PgPool::connect(&url)
        .await
        .expect("Failed to connect to database")
}
