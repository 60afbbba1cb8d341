//! Integration tests for the password reset flow.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (sf-cli migrate)
//! - The web server running (cargo run -p storefinder-web)
//! - `STOREFINDER_DATABASE_URL` pointing at the server's database, to read
//!   the token that would normally arrive by email
//!
//! Run with: cargo test -p storefinder-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use sqlx::PgPool;

use storefinder_integration_tests::{client, db, location, page, register, unique_email, url};

const PASSWORD: &str = "correct-horse-battery";
const NEW_PASSWORD: &str = "new-horse-battery";

async fn request_reset(client: &Client, email: &str) {
    let resp = client
        .post(url("/account/forgot"))
        .form(&[("email", email)])
        .send()
        .await
        .expect("forgot");
    assert_eq!(location(&resp).as_deref(), Some("/login"));
}

async fn reset_token(pool: &PgPool, email: &str) -> Option<String> {
    sqlx::query_scalar::<_, Option<String>>(
        "SELECT reset_password_token FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .expect("read token")
}

async fn submit_reset(client: &Client, token: &str, password: &str, confirm: &str) -> String {
    let resp = client
        .post(url(&format!("/account/reset/{token}")))
        .form(&[("password", password), ("password-confirm", confirm)])
        .send()
        .await
        .expect("reset");
    location(&resp).expect("redirect")
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_forgot_does_not_reveal_accounts() {
    let client = client();

    request_reset(&client, &unique_email("nobody")).await;
    let login = page(&client, "/login").await;
    assert!(login.contains("You have been emailed a password reset link."));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_reset_flow_sets_password_and_clears_token() {
    let pool = db().await;
    let email = unique_email("reset");
    register(&client(), "Tester", &email, PASSWORD).await;

    let client = client();
    request_reset(&client, &email).await;
    let token = reset_token(&pool, &email).await.expect("token issued");

    let resp = client
        .get(url(&format!("/account/reset/{token}")))
        .send()
        .await
        .expect("reset page");
    assert_eq!(resp.status(), StatusCode::OK);

    let back = submit_reset(&client, &token, NEW_PASSWORD, "something-else").await;
    assert_eq!(back, format!("/account/reset/{token}"));
    assert!(page(&client, &back).await.contains("Passwords do not match!"));

    let home = submit_reset(&client, &token, NEW_PASSWORD, NEW_PASSWORD).await;
    assert_eq!(home, "/");
    assert!(
        page(&client, "/")
            .await
            .contains("Nice! Your password has been reset! You are now logged in!")
    );

    assert!(reset_token(&pool, &email).await.is_none(), "token cleared");

    // The used token is no longer accepted
    let again = submit_reset(&client, &token, NEW_PASSWORD, NEW_PASSWORD).await;
    assert_eq!(again, "/login");

    // The new password works
    let resp = storefinder_integration_tests::client()
        .post(url("/login"))
        .form(&[("email", email.as_str()), ("password", NEW_PASSWORD)])
        .send()
        .await
        .expect("login");
    assert_eq!(location(&resp).as_deref(), Some("/"));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_expired_token_is_rejected() {
    let pool = db().await;
    let email = unique_email("expired");
    register(&client(), "Tester", &email, PASSWORD).await;

    let client = client();
    request_reset(&client, &email).await;
    let token = reset_token(&pool, &email).await.expect("token issued");

    sqlx::query(
        "UPDATE users SET reset_password_expires = NOW() - INTERVAL '1 minute' WHERE email = $1",
    )
    .bind(&email)
    .execute(&pool)
    .await
    .expect("expire token");

    let resp = client
        .get(url(&format!("/account/reset/{token}")))
        .send()
        .await
        .expect("reset page");
    assert_eq!(location(&resp).as_deref(), Some("/login"));
    assert!(
        page(&client, "/login")
            .await
            .contains("Password reset is invalid or has expired")
    );
}
