use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{ensure_allowed, resolve_membership, Action, OrgContext, Subject};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::member::{DbMember, DbMemberWithUser, Member, UpdateMemberRoleRequest};

#[utoipa::path(
    get,
    path = "/organizations/{slug}/members",
    tag = "Members",
    params(("slug" = String, Path, description = "Organization slug")),
    responses(
        (status = 200, description = "Organization members", body = [Member]),
        (status = 403, description = "Not allowed to list members")
    )
)]
pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<Vec<Member>>> {
    let ctx = resolve_membership(&state.pool, auth.user_id, &slug).await?;
    let ability = ctx.ability()?;

    ensure_allowed(
        &ability,
        Action::Get,
        Subject::User,
        None,
        "you're not allowed to see organization members",
    )?;

    let rows = sqlx::query_as::<_, DbMemberWithUser>(
        "SELECT m.id, m.user_id, m.role, u.name, u.email, u.avatar_url \
         FROM members m JOIN users u ON u.id = m.user_id \
         WHERE m.organization_id = ? ORDER BY m.role ASC, u.name ASC",
    )
    .bind(ctx.organization.id)
    .fetch_all(&state.pool)
    .await?;

    let members: Vec<Member> = rows
        .into_iter()
        .map(Member::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(members))
}

#[utoipa::path(
    put,
    path = "/organizations/{slug}/members/{member_id}",
    tag = "Members",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("member_id" = Uuid, Path, description = "Member id")
    ),
    request_body = UpdateMemberRoleRequest,
    responses(
        (status = 204, description = "Role updated"),
        (status = 403, description = "Not allowed to update member roles")
    )
)]
pub async fn update_member_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((slug, member_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateMemberRoleRequest>,
) -> AppResult<StatusCode> {
    let ctx = resolve_membership(&state.pool, auth.user_id, &slug).await?;
    let ability = ctx.ability()?;

    ensure_allowed(
        &ability,
        Action::Update,
        Subject::User,
        None,
        "you're not allowed to update member roles",
    )?;

    let target = fetch_member(&state, &ctx, member_id).await?;

    // The owner's membership is off-limits; ownership moves only through the
    // transfer endpoint.
    if target.user_id == ctx.organization.owner_id {
        return Err(AppError::forbidden(
            "the organization owner's role cannot be changed",
        ));
    }

    sqlx::query("UPDATE members SET role = ? WHERE id = ?")
        .bind(payload.role.as_str())
        .bind(target.id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/organizations/{slug}/members/{member_id}",
    tag = "Members",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("member_id" = Uuid, Path, description = "Member id")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 403, description = "Not allowed to remove members")
    )
)]
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((slug, member_id)): Path<(String, Uuid)>,
) -> AppResult<StatusCode> {
    let ctx = resolve_membership(&state.pool, auth.user_id, &slug).await?;
    let ability = ctx.ability()?;

    ensure_allowed(
        &ability,
        Action::Delete,
        Subject::User,
        None,
        "you're not allowed to remove members",
    )?;

    let target = fetch_member(&state, &ctx, member_id).await?;

    if target.user_id == ctx.organization.owner_id {
        return Err(AppError::forbidden(
            "the organization owner cannot be removed",
        ));
    }

    sqlx::query("DELETE FROM members WHERE id = ?")
        .bind(target.id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_member(
    state: &AppState,
    ctx: &OrgContext,
    member_id: Uuid,
) -> AppResult<DbMember> {
    sqlx::query_as::<_, DbMember>(
        "SELECT id, organization_id, user_id, role, created_at FROM members WHERE id = ? AND organization_id = ?",
    )
    .bind(member_id)
    .bind(ctx.organization.id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("member not found"))
}
