//! Shared fixtures for the integration tests.
//!
//! The tests run against a real PostgreSQL database named by
//! `TEST_DATABASE_URL`. Without it every test returns early.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Europe::Berlin;
use fake::{faker::name::en::Name, Fake};
use practice_api::{
    app::{build_router, AppState},
    config::Config,
    services::email::{EmailService, Outbox},
};
use serde_json::Value;
use shared::captcha::{CaptchaSigner, Operator};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration as StdDuration;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_PASSWORD: &str = "focus-and-flow-2024";

/// Connects to `TEST_DATABASE_URL` and applies all migrations.
pub async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(StdDuration::from_secs(30))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    persistence::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

pub fn test_config() -> Config {
    Config::load_for_test(&[]).expect("test config")
}

pub fn create_test_app(pool: PgPool) -> Router {
    let state = AppState::new(test_config(), pool).expect("app state");
    build_router(state)
}

/// An app whose email service records every message instead of sending it.
pub fn create_test_app_with_outbox(pool: PgPool) -> (Router, Outbox) {
    let mut state = AppState::new(test_config(), pool).expect("app state");
    let outbox = Outbox::default();
    state.email = EmailService::in_memory(state.config.email.clone(), outbox.clone());
    (build_router(state), outbox)
}

/// A solved captcha for the test signing key.
pub fn solved_captcha() -> (String, String) {
    let config = test_config();
    let signer = CaptchaSigner::new(
        &config.security.captcha_secret,
        config.security.captcha_ttl_secs,
    );
    let challenge = signer.issue_with(4, Operator::Add, 3, Utc::now().timestamp());
    (challenge.token, "7".to_string())
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.test", prefix, Uuid::new_v4().simple())
}

pub fn fake_name() -> String {
    Name().fake()
}

/// Admin account with known credentials.
pub struct TestAdmin {
    pub id: Uuid,
    pub email: String,
    pub password: String,
}

pub async fn create_admin(pool: &PgPool) -> TestAdmin {
    let email = unique_email("admin");
    let hash = shared::password::hash_password(ADMIN_PASSWORD).expect("hash");
    let user = persistence::repositories::UserRepository::new(pool.clone())
        .create(&email, "Test Admin", &hash)
        .await
        .expect("create admin");
    TestAdmin {
        id: user.id,
        email,
        password: ADMIN_PASSWORD.to_string(),
    }
}

/// Logs in through the API and returns the full login response.
pub async fn login(app: &Router, admin: &TestAdmin) -> Value {
    let response = send(
        app,
        json_request(
            Method::POST,
            "/api/v1/auth/login",
            serde_json::json!({ "email": admin.email, "password": admin.password }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

pub async fn admin_token(app: &Router, pool: &PgPool) -> String {
    let admin = create_admin(pool).await;
    let body = login(app, &admin).await;
    body["tokens"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string()
}

/// Makes every weekday bookable 08:00-20:00 unless the day already has
/// windows. Serialized with an advisory lock across concurrent tests.
pub async fn seed_full_week(pool: &PgPool) {
    let mut tx = pool.begin().await.expect("begin");
    sqlx::query("SELECT pg_advisory_xact_lock(4242)")
        .execute(&mut *tx)
        .await
        .expect("lock");
    sqlx::query(
        r#"
        INSERT INTO availability_windows (day_of_week, start_time, end_time, is_active)
        SELECT d, TIME '08:00', TIME '20:00', TRUE
        FROM generate_series(0, 6) AS d
        WHERE NOT EXISTS (
            SELECT 1 FROM availability_windows w WHERE w.day_of_week = d AND w.is_active
        )
        "#,
    )
    .execute(&mut *tx)
    .await
    .expect("seed availability");
    tx.commit().await.expect("commit");
}

/// A practice-local date `days` ahead. Each test uses its own offset so
/// slots do not collide between concurrently running tests.
pub fn local_date_in(days: i64) -> NaiveDate {
    (Utc::now().with_timezone(&Berlin) + Duration::days(days)).date_naive()
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn authed_json_request(method: Method, uri: &str, token: &str, body: Value) -> Request<Body> {
    let mut request = json_request(method, uri, body);
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    request
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}
