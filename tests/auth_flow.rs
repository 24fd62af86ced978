use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

mod common;

#[tokio::test]
async fn register_login_me_round_trip() -> Result<()> {
    let test_app = common::setup().await?;
    let app = &test_app.app;

    let (token, user_id) =
        common::register_user(app, "Ada Lovelace", "ada@example.com", "password123").await?;

    let (status, body) = common::request(app, "GET", "/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_str(), Some(user_id.to_string().as_str()));
    assert_eq!(body["email"].as_str(), Some("ada@example.com"));

    let (status, body) = common::request(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());

    Ok(())
}

#[tokio::test]
async fn auth_edge_cases() -> Result<()> {
    let test_app = common::setup().await?;
    let app = &test_app.app;

    // Short password
    let (status, _) = common::request(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Short", "email": "short@example.com", "password": "short" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::register_user(app, "Valid User", "valid@example.com", "password123").await?;

    // Duplicate email
    let (status, _) = common::request(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Other", "email": "valid@example.com", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // Wrong password
    let (status, _) = common::request(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "valid@example.com", "password": "wrongpassword" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Unknown account
    let (status, _) = common::request(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Protected route without token
    let (status, _) = common::request(app, "GET", "/organizations", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn password_recovery_resets_the_password() -> Result<()> {
    let test_app = common::setup().await?;
    let app = &test_app.app;

    common::register_user(app, "Forgetful", "forgetful@example.com", "password123").await?;

    let (status, _) = common::request(
        app,
        "POST",
        "/auth/password/recover",
        None,
        Some(json!({ "email": "forgetful@example.com" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    // Delivery is out-of-band, so read the issued code from storage.
    let code: Uuid = sqlx::query_scalar(
        "SELECT t.id FROM tokens t JOIN users u ON u.id = t.user_id WHERE u.email = ? AND t.token_type = 'PASSWORD_RECOVER'",
    )
    .bind("forgetful@example.com")
    .fetch_one(&test_app.pool)
    .await?;

    let (status, _) = common::request(
        app,
        "POST",
        "/auth/password/reset",
        None,
        Some(json!({ "code": code, "password": "newpassword456" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The code is single-use
    let (status, _) = common::request(
        app,
        "POST",
        "/auth/password/reset",
        None,
        Some(json!({ "code": code, "password": "anotherpassword" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::request(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "forgetful@example.com", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::request(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "forgetful@example.com", "password": "newpassword456" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn recovery_does_not_leak_account_existence() -> Result<()> {
    let test_app = common::setup().await?;

    let (status, _) = common::request(
        &test_app.app,
        "POST",
        "/auth/password/recover",
        None,
        Some(json!({ "email": "ghost@example.com" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    Ok(())
}
