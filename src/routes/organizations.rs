use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{ensure_allowed, resolve_membership, Action, Subject};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::member::Membership;
use crate::models::organization::{
    DbOrganization, DbOrganizationWithRole, Organization, OrganizationCreateRequest,
    OrganizationSummary, OrganizationUpdateRequest, TransferOwnershipRequest,
};
use crate::utils::{create_slug, utc_now};

#[utoipa::path(
    post,
    path = "/organizations",
    tag = "Organizations",
    request_body = OrganizationCreateRequest,
    responses(
        (status = 201, description = "Organization created", body = Organization),
        (status = 409, description = "Slug or domain already taken")
    )
)]
pub async fn create_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<OrganizationCreateRequest>,
) -> AppResult<(StatusCode, Json<Organization>)> {
    let slug = create_slug(&payload.name);
    if slug.is_empty() {
        return Err(AppError::bad_request("organization name must contain letters or digits"));
    }

    ensure_slug_available(&state.pool, &slug, None).await?;
    if let Some(domain) = payload.domain.as_deref() {
        ensure_domain_available(&state.pool, domain, None).await?;
    }

    let organization_id = Uuid::new_v4();
    let now = utc_now();

    let mut tx = state.pool.begin().await?;

    sqlx::query(
        "INSERT INTO organizations (id, name, slug, domain, should_attach_users_by_domain, avatar_url, owner_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(organization_id)
    .bind(&payload.name)
    .bind(&slug)
    .bind(&payload.domain)
    .bind(payload.should_attach_users_by_domain)
    .bind(&payload.avatar_url)
    .bind(auth.user_id)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    // The creator owns the organization and joins it as an admin.
    sqlx::query(
        "INSERT INTO members (id, organization_id, user_id, role, created_at) VALUES (?, ?, ?, 'ADMIN', ?)",
    )
    .bind(Uuid::new_v4())
    .bind(organization_id)
    .bind(auth.user_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let organization = fetch_organization(&state.pool, &slug).await?;
    Ok((StatusCode::CREATED, Json(organization.try_into()?)))
}

#[utoipa::path(
    get,
    path = "/organizations",
    tag = "Organizations",
    responses((status = 200, description = "Organizations the caller belongs to", body = [OrganizationSummary]))
)]
pub async fn list_organizations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<OrganizationSummary>>> {
    let rows = sqlx::query_as::<_, DbOrganizationWithRole>(
        "SELECT o.id, o.name, o.slug, o.avatar_url, o.owner_id, m.role \
         FROM organizations o JOIN members m ON m.organization_id = o.id \
         WHERE m.user_id = ? ORDER BY o.created_at DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    let organizations: Vec<OrganizationSummary> = rows
        .into_iter()
        .map(OrganizationSummary::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(organizations))
}

#[utoipa::path(
    get,
    path = "/organizations/{slug}",
    tag = "Organizations",
    params(("slug" = String, Path, description = "Organization slug")),
    responses((status = 200, description = "Organization detail", body = Organization))
)]
pub async fn get_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<Organization>> {
    let ctx = resolve_membership(&state.pool, auth.user_id, &slug).await?;
    Ok(Json(ctx.organization.try_into()?))
}

#[utoipa::path(
    get,
    path = "/organizations/{slug}/membership",
    tag = "Organizations",
    params(("slug" = String, Path, description = "Organization slug")),
    responses((status = 200, description = "Caller's membership", body = Membership))
)]
pub async fn get_membership(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<Membership>> {
    let ctx = resolve_membership(&state.pool, auth.user_id, &slug).await?;
    Ok(Json(ctx.membership.try_into()?))
}

#[utoipa::path(
    put,
    path = "/organizations/{slug}",
    tag = "Organizations",
    params(("slug" = String, Path, description = "Organization slug")),
    request_body = OrganizationUpdateRequest,
    responses(
        (status = 200, description = "Organization updated", body = Organization),
        (status = 403, description = "Not allowed to update this organization")
    )
)]
pub async fn update_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
    Json(payload): Json<OrganizationUpdateRequest>,
) -> AppResult<Json<Organization>> {
    let ctx = resolve_membership(&state.pool, auth.user_id, &slug).await?;
    let ability = ctx.ability()?;

    ensure_allowed(
        &ability,
        Action::Update,
        Subject::Organization,
        Some(&ctx.organization_attrs()),
        "you're not allowed to update this organization",
    )?;

    let mut organization = ctx.organization;

    if let Some(name) = payload.name.as_ref() {
        organization.name = name.clone();
    }
    if let Some(domain) = payload.domain.as_ref() {
        ensure_domain_available(&state.pool, domain, Some(organization.id)).await?;
        organization.domain = Some(domain.clone());
    }
    if let Some(should_attach) = payload.should_attach_users_by_domain {
        organization.should_attach_users_by_domain = should_attach;
    }
    if payload.avatar_url.is_some() {
        organization.avatar_url = payload.avatar_url.clone();
    }

    let now = utc_now();

    sqlx::query(
        "UPDATE organizations SET name = ?, domain = ?, should_attach_users_by_domain = ?, avatar_url = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&organization.name)
    .bind(&organization.domain)
    .bind(organization.should_attach_users_by_domain)
    .bind(&organization.avatar_url)
    .bind(now)
    .bind(organization.id)
    .execute(&state.pool)
    .await?;

    organization.updated_at = now;
    Ok(Json(organization.try_into()?))
}

#[utoipa::path(
    delete,
    path = "/organizations/{slug}",
    tag = "Organizations",
    params(("slug" = String, Path, description = "Organization slug")),
    responses(
        (status = 204, description = "Organization shut down"),
        (status = 403, description = "Not allowed to shut down this organization")
    )
)]
pub async fn shutdown_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    let ctx = resolve_membership(&state.pool, auth.user_id, &slug).await?;
    let ability = ctx.ability()?;

    ensure_allowed(
        &ability,
        Action::Delete,
        Subject::Organization,
        Some(&ctx.organization_attrs()),
        "you're not allowed to shutdown this organization",
    )?;

    sqlx::query("DELETE FROM organizations WHERE id = ?")
        .bind(ctx.organization.id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/organizations/{slug}/owner",
    tag = "Organizations",
    params(("slug" = String, Path, description = "Organization slug")),
    request_body = TransferOwnershipRequest,
    responses(
        (status = 204, description = "Ownership transferred"),
        (status = 400, description = "Target is not a member"),
        (status = 403, description = "Not allowed to transfer this organization")
    )
)]
pub async fn transfer_ownership(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
    Json(payload): Json<TransferOwnershipRequest>,
) -> AppResult<StatusCode> {
    let ctx = resolve_membership(&state.pool, auth.user_id, &slug).await?;
    let ability = ctx.ability()?;

    ensure_allowed(
        &ability,
        Action::TransferOwnership,
        Subject::Organization,
        Some(&ctx.organization_attrs()),
        "you're not allowed to transfer ownership of this organization",
    )?;

    let target_member_id: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM members WHERE organization_id = ? AND user_id = ?",
    )
    .bind(ctx.organization.id)
    .bind(payload.transfer_to_user_id)
    .fetch_optional(&state.pool)
    .await?;

    let target_member_id = target_member_id.ok_or_else(|| {
        AppError::bad_request("target user is not a member of this organization")
    })?;

    let now = utc_now();
    let mut tx = state.pool.begin().await?;

    sqlx::query("UPDATE members SET role = 'ADMIN' WHERE id = ?")
        .bind(target_member_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE organizations SET owner_id = ?, updated_at = ? WHERE id = ?")
        .bind(payload.transfer_to_user_id)
        .bind(now)
        .bind(ctx.organization.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_slug_available(
    pool: &SqlitePool,
    slug: &str,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM organizations WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    match existing {
        Some(id) if Some(id) != exclude => Err(AppError::conflict("organization slug already taken")),
        _ => Ok(()),
    }
}

async fn ensure_domain_available(
    pool: &SqlitePool,
    domain: &str,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM organizations WHERE domain = ?")
        .bind(domain)
        .fetch_optional(pool)
        .await?;

    match existing {
        Some(id) if Some(id) != exclude => {
            Err(AppError::conflict("another organization already claims this domain"))
        }
        _ => Ok(()),
    }
}

async fn fetch_organization(pool: &SqlitePool, slug: &str) -> AppResult<DbOrganization> {
    sqlx::query_as::<_, DbOrganization>(
        "SELECT id, name, slug, domain, should_attach_users_by_domain, avatar_url, owner_id, created_at, updated_at FROM organizations WHERE slug = ?",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("organization not found"))
}
