use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

mod common;

async fn organization_id(pool: &SqlitePool, slug: &str) -> Result<Uuid> {
    let id = sqlx::query_scalar("SELECT id FROM organizations WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

#[tokio::test]
async fn personal_events_only_need_authentication() -> Result<()> {
    let test_app = common::setup().await?;
    let app = &test_app.app;

    let (token, user_id) =
        common::register_user(app, "Organizer", "organizer@example.com", "password123").await?;

    let (status, body) = common::request(
        app,
        "POST",
        "/events",
        Some(&token),
        Some(json!({
            "name": "Weekend Fun Run",
            "start_date": "2026-09-12T09:00:00Z"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["event_id"].is_string());

    let (status, body) = common::request(app, "GET", "/events", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["slug"], "weekend-fun-run");
    assert_eq!(body[0]["owner_id"], user_id.to_string());

    Ok(())
}

#[tokio::test]
async fn organization_events_require_admin_rights() -> Result<()> {
    let test_app = common::setup().await?;
    let app = &test_app.app;

    let (owner_token, _) =
        common::register_user(app, "Owner", "owner@example.com", "password123").await?;
    let slug = common::create_organization(app, &owner_token, "Event Club").await?;
    let org_id = organization_id(&test_app.pool, &slug).await?;

    let (member_token, member_user_id) =
        common::register_user(app, "Plain Member", "member@example.com", "password123").await?;
    common::add_member(&test_app.pool, &slug, member_user_id, "MEMBER").await?;

    let (outsider_token, _) =
        common::register_user(app, "Outsider", "outsider@example.com", "password123").await?;

    let payload = json!({
        "name": "Club Championship",
        "start_date": "2026-10-01T10:00:00Z",
        "organization_id": org_id,
    });

    let (status, _) = common::request(
        app,
        "POST",
        "/events",
        Some(&member_token),
        Some(payload.clone()),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::request(
        app,
        "POST",
        "/events",
        Some(&outsider_token),
        Some(payload.clone()),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        common::request(app, "POST", "/events", Some(&owner_token), Some(payload)).await?;
    assert_eq!(status, StatusCode::CREATED);

    Ok(())
}

#[tokio::test]
async fn event_names_must_produce_unique_slugs() -> Result<()> {
    let test_app = common::setup().await?;
    let app = &test_app.app;

    let (token, _) =
        common::register_user(app, "Organizer", "organizer@example.com", "password123").await?;

    let payload = json!({
        "name": "Spring Open",
        "start_date": "2026-04-01T08:00:00Z"
    });

    let (status, _) =
        common::request(app, "POST", "/events", Some(&token), Some(payload.clone())).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::request(app, "POST", "/events", Some(&token), Some(payload)).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    Ok(())
}

#[tokio::test]
async fn organization_events_are_visible_to_members_only() -> Result<()> {
    let test_app = common::setup().await?;
    let app = &test_app.app;

    let (owner_token, _) =
        common::register_user(app, "Owner", "owner@example.com", "password123").await?;
    let slug = common::create_organization(app, &owner_token, "Private Club").await?;
    let org_id = organization_id(&test_app.pool, &slug).await?;

    let (status, _) = common::request(
        app,
        "POST",
        "/events",
        Some(&owner_token),
        Some(json!({
            "name": "Members Gala",
            "start_date": "2026-11-20T18:00:00Z",
            "organization_id": org_id,
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (member_token, member_user_id) =
        common::register_user(app, "Plain Member", "member@example.com", "password123").await?;
    common::add_member(&test_app.pool, &slug, member_user_id, "MEMBER").await?;

    let (status, body) =
        common::request(app, "GET", "/events/members-gala", Some(&member_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Members Gala");

    let (outsider_token, _) =
        common::register_user(app, "Outsider", "outsider@example.com", "password123").await?;

    let (status, _) = common::request(
        app,
        "GET",
        "/events/members-gala",
        Some(&outsider_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}
