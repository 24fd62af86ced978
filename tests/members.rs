use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
async fn admin_lists_and_updates_member_roles() -> Result<()> {
    let test_app = common::setup().await?;
    let app = &test_app.app;

    let (owner_token, _) =
        common::register_user(app, "Owner", "owner@example.com", "password123").await?;
    let slug = common::create_organization(app, &owner_token, "Roster Club").await?;

    let (_, member_user_id) =
        common::register_user(app, "Plain Member", "member@example.com", "password123").await?;
    let member_id = common::add_member(&test_app.pool, &slug, member_user_id, "MEMBER").await?;

    let (status, body) = common::request(
        app,
        "GET",
        &format!("/organizations/{slug}/members"),
        Some(&owner_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let (status, _) = common::request(
        app,
        "PUT",
        &format!("/organizations/{slug}/members/{member_id}"),
        Some(&owner_token),
        Some(json!({ "role": "ADMIN" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let role: String = sqlx::query_scalar("SELECT role FROM members WHERE id = ?")
        .bind(member_id)
        .fetch_one(&test_app.pool)
        .await?;
    assert_eq!(role, "ADMIN");

    Ok(())
}

#[tokio::test]
async fn plain_members_cannot_manage_the_roster() -> Result<()> {
    let test_app = common::setup().await?;
    let app = &test_app.app;

    let (owner_token, _) =
        common::register_user(app, "Owner", "owner@example.com", "password123").await?;
    let slug = common::create_organization(app, &owner_token, "Locked Club").await?;

    let (member_token, member_user_id) =
        common::register_user(app, "Plain Member", "member@example.com", "password123").await?;
    let member_id = common::add_member(&test_app.pool, &slug, member_user_id, "MEMBER").await?;

    let (_, other_user_id) =
        common::register_user(app, "Other", "other@example.com", "password123").await?;
    let other_member_id =
        common::add_member(&test_app.pool, &slug, other_user_id, "MEMBER").await?;

    // A MEMBER may read user profiles but not mutate memberships
    let (status, _) = common::request(
        app,
        "GET",
        &format!("/organizations/{slug}/members"),
        Some(&member_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::request(
        app,
        "PUT",
        &format!("/organizations/{slug}/members/{other_member_id}"),
        Some(&member_token),
        Some(json!({ "role": "ADMIN" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::request(
        app,
        "DELETE",
        &format!("/organizations/{slug}/members/{member_id}"),
        Some(&member_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn the_owner_membership_is_untouchable() -> Result<()> {
    let test_app = common::setup().await?;
    let app = &test_app.app;

    let (owner_token, owner_id) =
        common::register_user(app, "Owner", "owner@example.com", "password123").await?;
    let slug = common::create_organization(app, &owner_token, "Founder Club").await?;

    let (admin_token, admin_user_id) =
        common::register_user(app, "Second Admin", "admin@example.com", "password123").await?;
    common::add_member(&test_app.pool, &slug, admin_user_id, "ADMIN").await?;

    let owner_member_id: uuid::Uuid = sqlx::query_scalar(
        "SELECT id FROM members WHERE user_id = ? AND organization_id = (SELECT id FROM organizations WHERE slug = ?)",
    )
    .bind(owner_id)
    .bind(&slug)
    .fetch_one(&test_app.pool)
    .await?;

    let (status, _) = common::request(
        app,
        "PUT",
        &format!("/organizations/{slug}/members/{owner_member_id}"),
        Some(&admin_token),
        Some(json!({ "role": "MEMBER" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::request(
        app,
        "DELETE",
        &format!("/organizations/{slug}/members/{owner_member_id}"),
        Some(&admin_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn admin_removes_a_member() -> Result<()> {
    let test_app = common::setup().await?;
    let app = &test_app.app;

    let (owner_token, _) =
        common::register_user(app, "Owner", "owner@example.com", "password123").await?;
    let slug = common::create_organization(app, &owner_token, "Trim Club").await?;

    let (_, member_user_id) =
        common::register_user(app, "Leaver", "leaver@example.com", "password123").await?;
    let member_id = common::add_member(&test_app.pool, &slug, member_user_id, "MEMBER").await?;

    let (status, _) = common::request(
        app,
        "DELETE",
        &format!("/organizations/{slug}/members/{member_id}"),
        Some(&owner_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM members WHERE id = ?")
        .bind(member_id)
        .fetch_one(&test_app.pool)
        .await?;
    assert_eq!(remaining, 0);

    Ok(())
}
