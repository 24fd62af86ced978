use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use lync::create_app;

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    _dir: TempDir,
}

pub async fn setup() -> Result<TestApp> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    std::env::set_var("JWT_SECRET", "test-secret");
    let app = create_app(pool.clone()).await?;

    Ok(TestApp {
        app,
        pool,
        _dir: dir,
    })
}

/// Send a JSON request and return status plus parsed body (Null when empty).
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    payload: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match payload {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();

    let bytes = body::to_bytes(response.into_body(), 10_485_760).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, value))
}

/// Register an account and return (token, user id).
pub async fn register_user(
    app: &Router,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(String, Uuid)> {
    let (status, body) = request(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": password })),
    )
    .await?;

    anyhow::ensure!(
        status == StatusCode::CREATED,
        "registration failed with {status}: {body}"
    );

    let token = body["token"]
        .as_str()
        .context("registration response missing token")?
        .to_string();
    let user_id = body["user"]["id"]
        .as_str()
        .context("registration response missing user id")?
        .parse()?;

    Ok((token, user_id))
}

/// Create an organization through the API and return its slug.
pub async fn create_organization(app: &Router, token: &str, name: &str) -> Result<String> {
    let (status, body) = request(
        app,
        "POST",
        "/organizations",
        Some(token),
        Some(json!({ "name": name })),
    )
    .await?;

    anyhow::ensure!(
        status == StatusCode::CREATED,
        "organization creation failed with {status}: {body}"
    );

    Ok(body["slug"]
        .as_str()
        .context("organization response missing slug")?
        .to_string())
}

/// Insert a membership directly; setup shortcut for tests that are not
/// about the invite flow.
pub async fn add_member(
    pool: &SqlitePool,
    org_slug: &str,
    user_id: Uuid,
    role: &str,
) -> Result<Uuid> {
    let organization_id: Uuid = sqlx::query_scalar("SELECT id FROM organizations WHERE slug = ?")
        .bind(org_slug)
        .fetch_one(pool)
        .await?;

    let member_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO members (id, organization_id, user_id, role, created_at) VALUES (?, ?, ?, ?, datetime('now'))",
    )
    .bind(member_id)
    .bind(organization_id)
    .bind(user_id)
    .bind(role)
    .execute(pool)
    .await?;

    Ok(member_id)
}
