//! Shared test infrastructure.
//!
//! Each `#[sqlx::test]` gets a fresh Postgres database with `migrations/` applied;
//! these helpers add users, tokens and an in-process app on top of it.

#![allow(dead_code, unused_macros)]

use std::collections::HashMap;

use serde_json::Value;
use sqlx::PgPool;
use tempfile::TempDir;

use rpms::AppState;
use rpms::auth::password;
use rpms::config::Config;
use rpms::models::token;
use rpms::models::user::{self, NewUser, Role, User};

pub const TEST_PASSWORD: &str = "participantpass";

/// App state backed by `pool`, with attachments stored in a temp dir.
/// Keep the `TempDir` alive for the duration of the test.
pub fn test_state(pool: PgPool) -> (TempDir, AppState) {
    test_state_with(pool, &[])
}

pub fn test_state_with(pool: PgPool, overrides: &[(&str, &str)]) -> (TempDir, AppState) {
    let media = TempDir::new().expect("Failed to create temp dir");
    let mut vars: HashMap<String, String> = HashMap::from([
        ("DATABASE_URL".to_string(), "postgres://unused".to_string()),
        ("MEDIA_ROOT".to_string(), media.path().display().to_string()),
        ("MAX_UPLOAD_BYTES".to_string(), "4096".to_string()),
    ]);
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    let config = Config::from_vars(&vars).expect("test config");
    (media, AppState::new(pool, config))
}

/// Build an initialised test service from an `AppState`.
macro_rules! test_app {
    ($state:expr) => {{
        let state = $state.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(
                    actix_session::SessionMiddleware::builder(
                        actix_session::storage::CookieSessionStore::default(),
                        actix_web::cookie::Key::generate(),
                    )
                    .cookie_secure(false)
                    .build(),
                )
                .configure(move |cfg| state.configure(cfg)),
        )
        .await
    }};
}

pub async fn create_user(pool: &PgPool, username: &str, role: Role) -> User {
    let hash = password::hash_password(TEST_PASSWORD).expect("hash");
    user::create(
        pool,
        &NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            role,
            password_hash: hash,
        },
    )
    .await
    .expect("create user")
}

/// `Authorization` header value for a user.
pub async fn auth_header(pool: &PgPool, user: &User) -> (String, String) {
    let key = token::get_or_create(pool, user.id).await.expect("token");
    ("Authorization".to_string(), format!("Token {key}"))
}

pub fn error_kind(body: &Value) -> &str {
    body["error"].as_str().unwrap_or_default()
}
