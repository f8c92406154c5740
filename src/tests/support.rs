//! Shared fixtures for the endpoint tests: a router over a throwaway
//! SQLite file plus request helpers.

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::NamedTempFile;
use tower::ServiceExt;

use crate::config::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig, StatsConfig};
use crate::state::AppState;

pub fn test_config(db_url: String) -> AppConfig {
    AppConfig {
        server: ServerConfig { host: "127.0.0.1".to_string(), port: 8080 },
        database: DatabaseConfig { url: db_url },
        auth: AuthConfig { secret_key: "test-secret".to_string(), token_expire_minutes: 60 },
        stats: StatsConfig { recent_window_days: 7 },
        security: None,
    }
}

/// Fresh app over a temp-file database. The `NamedTempFile` guard must
/// stay alive for the duration of the test.
pub async fn setup_test_app() -> (axum::Router, AppState, NamedTempFile) {
    let temp_db = NamedTempFile::new().unwrap();
    let db_url = format!("sqlite:{}", temp_db.path().display());

    sqlx::Sqlite::create_database(&db_url).await.unwrap();

    let pool = SqlitePoolOptions::new().max_connections(1).connect(&db_url).await.unwrap();
    crate::db::init_db(&pool).await.unwrap();

    let state = AppState::new(pool, test_config(db_url));
    let app = crate::build_router(state.clone());

    (app, state, temp_db)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    builder.body(Body::empty()).unwrap()
}

pub const TEST_PASSWORD: &str = "a-strong-password";

/// Registers `email` and returns the bearer token from a follow-up login.
pub async fn register_and_login(app: &axum::Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/users",
            None,
            serde_json::json!({ "email": email, "password": TEST_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    login(app, email, TEST_PASSWORD).await.expect("login after registration")
}

/// Runs the OAuth2 password-flow login and returns the token on success.
pub async fn login(app: &axum::Router, email: &str, password: &str) -> Option<String> {
    let form = format!("username={}&password={}", email, password);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();

    if response.status() != StatusCode::OK {
        return None;
    }
    let body = body_json(response).await;
    body["access_token"].as_str().map(|s| s.to_string())
}
