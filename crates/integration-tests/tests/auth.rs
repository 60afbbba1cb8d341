//! Integration tests for registration, login, logout and auth gating.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (sf-cli migrate)
//! - The web server running (cargo run -p storefinder-web)
//!
//! Run with: cargo test -p storefinder-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::Value;

use storefinder_integration_tests::{client, location, page, register, unique_email, url};

const PASSWORD: &str = "correct-horse-battery";

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_health_endpoints() {
    let client = client();

    let resp = client.get(url("/health")).send().await.expect("health");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("body"), "ok");

    let resp = client.get(url("/health/ready")).send().await.expect("ready");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_register_logs_in() {
    let client = client();
    let email = unique_email("register");

    register(&client, "Tester", &email, PASSWORD).await;

    let home = page(&client, "/").await;
    assert!(home.contains("You are now logged in!"));
    assert!(home.contains("Logout"));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_register_validation_rerenders_form() {
    let client = client();

    let resp = client
        .post(url("/register"))
        .form(&[
            ("name", ""),
            ("email", "not-an-email"),
            ("password", "short"),
            ("password-confirm", "different"),
        ])
        .send()
        .await
        .expect("register");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("body");
    assert!(body.contains("You must supply a name!"));
    assert!(body.contains("That Email is not valid!"));
    assert!(body.contains("Password must be at least 8 characters"));
    assert!(body.contains("not-an-email"), "email should be kept");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_login_logout_round_trip() {
    let email = unique_email("login");
    register(&client(), "Tester", &email, PASSWORD).await;

    let client = client();
    let resp = client
        .post(url("/login"))
        .form(&[("email", email.as_str()), ("password", PASSWORD)])
        .send()
        .await
        .expect("login");
    assert_eq!(location(&resp).as_deref(), Some("/"));

    let resp = client.get(url("/logout")).send().await.expect("logout");
    assert_eq!(location(&resp).as_deref(), Some("/"));

    let home = page(&client, "/").await;
    assert!(home.contains("You are now logged out!"));
    assert!(home.contains("Log In"));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_failed_login_flashes() {
    let client = client();

    let resp = client
        .post(url("/login"))
        .form(&[("email", "nobody@example.com"), ("password", "wrong-password")])
        .send()
        .await
        .expect("login");
    assert_eq!(location(&resp).as_deref(), Some("/login"));

    let login = page(&client, "/login").await;
    assert!(login.contains("Failed Login!"));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_guest_is_redirected_from_protected_pages() {
    let client = client();

    for path in ["/add", "/hearts", "/account"] {
        let resp = client.get(url(path)).send().await.expect("get");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp).as_deref(), Some("/login"), "{path}");
    }

    let login = page(&client, "/login").await;
    assert!(login.contains("Oops you must be logged in to do that!"));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_guest_api_gets_401_json() {
    let resp = client()
        .post(url("/api/stores/1/heart"))
        .send()
        .await
        .expect("heart");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["error"], "Oops you must be logged in to do that!");
}
