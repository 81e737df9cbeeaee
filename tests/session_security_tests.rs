use std::{collections::HashMap, env};

use accounts_api::{
    config::{ConfigError, SessionConfig},
    factories::UserFactory,
    services::SystemClock,
    test_utils::{create_test_app, test_helpers},
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use serial_test::serial;
use std::sync::Arc;
use tower::ServiceExt;
use tower_sessions::{
    cookie::{Cookie, SameSite},
    Session,
};
use tower_sessions_sqlx_store::SqliteStore;

#[derive(Default)]
struct EnvGuard {
    original: HashMap<String, Option<String>>,
}

impl EnvGuard {
    fn set(&mut self, key: &str, value: impl Into<String>) {
        self.original
            .entry(key.to_string())
            .or_insert_with(|| env::var(key).ok());
        env::set_var(key, value.into());
    }

    fn remove(&mut self, key: &str) {
        self.original
            .entry(key.to_string())
            .or_insert_with(|| env::var(key).ok());
        env::remove_var(key);
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.original.drain() {
            match value {
                Some(v) => env::set_var(&key, v),
                None => env::remove_var(&key),
            }
        }
    }
}

fn parse_cookie(response: &axum::response::Response) -> Cookie<'static> {
    let cookie_header = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie to be issued")
        .to_str()
        .expect("cookie header to be valid ASCII")
        .to_string();

    Cookie::parse(cookie_header).expect("cookie header to parse correctly")
}

#[tokio::test]
#[serial]
async fn session_cookie_flags_are_secure_in_production() {
    let mut env_guard = EnvGuard::default();
    env_guard.set("ENVIRONMENT", "production");
    env_guard.set("FORCE_HTTPS", "true");
    env_guard.set("SESSION_SECRET", STANDARD.encode([42u8; 64]));

    let session_config = SessionConfig::from_env().expect("production config to be valid");

    let pool = test_helpers::create_test_db().await.unwrap();
    let session_store = SqliteStore::new(pool)
        .with_table_name("sessions_test")
        .expect("valid session table name for tests");
    session_store
        .migrate()
        .await
        .expect("session table migration to succeed");

    async fn set_session(session: Session) -> &'static str {
        session.insert("user_id", 1_i64).await.unwrap();
        "ok"
    }

    let app = Router::new()
        .route("/", get(set_session))
        .layer(session_config.create_layer(session_store));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .expect("router to respond");

    let cookie = parse_cookie(&response);
    assert_eq!(cookie.name(), "__Host-accounts-session");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    assert_eq!(cookie.path().unwrap_or("/"), "/");
}

#[tokio::test]
async fn login_issues_http_only_session_cookie() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let app = create_test_app(pool, Arc::new(SystemClock)).await.unwrap();
    let user = UserFactory::new()
        .is_active(true)
        .password("string")
        .create(app.users.as_ref())
        .await
        .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/accounts/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": user.email, "password": "string" }).to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = parse_cookie(&response);
    assert_eq!(cookie.name(), "accounts-session");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
}

#[tokio::test]
async fn failed_login_sets_no_cookie() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let app = create_test_app(pool, Arc::new(SystemClock)).await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/accounts/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "ghost@example.com", "password": "string" }).to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[test]
#[serial]
fn production_requires_https_flag() {
    let mut env_guard = EnvGuard::default();
    env_guard.set("ENVIRONMENT", "production");
    env_guard.remove("FORCE_HTTPS");
    env_guard.set("SESSION_SECRET", "a".repeat(64));

    assert!(matches!(
        SessionConfig::from_env(),
        Err(ConfigError::Insecure(_))
    ));
}

#[test]
#[serial]
fn production_rejects_weak_secrets() {
    let mut env_guard = EnvGuard::default();
    env_guard.set("ENVIRONMENT", "production");
    env_guard.set("FORCE_HTTPS", "true");
    env_guard.set("SESSION_SECRET", "changeme");

    assert!(SessionConfig::from_env().is_err());
}

#[test]
#[serial]
fn production_requires_a_secret() {
    let mut env_guard = EnvGuard::default();
    env_guard.set("ENVIRONMENT", "production");
    env_guard.set("FORCE_HTTPS", "true");
    env_guard.remove("SESSION_SECRET");

    assert!(matches!(
        SessionConfig::from_env(),
        Err(ConfigError::Missing("SESSION_SECRET"))
    ));
}
