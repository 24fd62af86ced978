use anyhow::Result;
use axum::http::StatusCode;

mod common;

#[tokio::test]
async fn health_endpoint_reports_db_ok() -> Result<()> {
    let test_app = common::setup().await?;

    let (status, body) = common::request(&test_app.app, "GET", "/api/health", None, None).await?;

    assert_eq!(status, StatusCode::OK, "health endpoint did not return 200");
    let db_ok = body.get("db_ok").and_then(|b| b.as_bool()).unwrap_or(false);
    assert!(db_ok, "expected db_ok: true, got: {}", body);

    Ok(())
}
