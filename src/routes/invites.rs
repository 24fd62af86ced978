use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{ensure_allowed, resolve_membership, Action, Subject};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::invite::{
    DbMemberInvite, DbMemberInviteDetailed, InviteCreateRequest, InviteCreatedResponse,
    MemberInvite,
};
use crate::routes::auth::fetch_user_by_id;
use crate::utils::{email_domain, utc_now};

const DETAILED_INVITE_QUERY: &str =
    "SELECT i.id, i.email, i.role, i.created_at, i.author_id, \
            u.name AS author_name, u.avatar_url AS author_avatar_url, \
            o.name AS organization_name \
     FROM member_invites i \
     LEFT JOIN users u ON u.id = i.author_id \
     JOIN organizations o ON o.id = i.organization_id";

#[utoipa::path(
    post,
    path = "/organizations/{slug}/member-invites",
    tag = "Member invites",
    params(("slug" = String, Path, description = "Organization slug")),
    request_body = InviteCreateRequest,
    responses(
        (status = 201, description = "Invite created", body = InviteCreatedResponse),
        (status = 400, description = "Invite not applicable"),
        (status = 403, description = "Not allowed to create invites")
    )
)]
pub async fn create_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
    Json(payload): Json<InviteCreateRequest>,
) -> AppResult<(StatusCode, Json<InviteCreatedResponse>)> {
    let ctx = resolve_membership(&state.pool, auth.user_id, &slug).await?;
    let ability = ctx.ability()?;

    ensure_allowed(
        &ability,
        Action::Create,
        Subject::Invite,
        None,
        "you're not allowed to create new invites",
    )?;

    let organization = &ctx.organization;

    if organization.should_attach_users_by_domain {
        if let (Some(org_domain), Some(domain)) =
            (organization.domain.as_deref(), email_domain(&payload.email))
        {
            if org_domain == domain {
                return Err(AppError::bad_request(format!(
                    "users with the {domain} domain join your organization automatically on sign-up"
                )));
            }
        }
    }

    let duplicate: i64 = sqlx::query_scalar(
        "SELECT COUNT(1) FROM member_invites WHERE email = ? AND organization_id = ?",
    )
    .bind(&payload.email)
    .bind(organization.id)
    .fetch_one(&state.pool)
    .await?;

    if duplicate > 0 {
        return Err(AppError::bad_request(
            "another invite with the same e-mail already exists",
        ));
    }

    let already_member: i64 = sqlx::query_scalar(
        "SELECT COUNT(1) FROM members m JOIN users u ON u.id = m.user_id WHERE m.organization_id = ? AND u.email = ?",
    )
    .bind(organization.id)
    .bind(&payload.email)
    .fetch_one(&state.pool)
    .await?;

    if already_member > 0 {
        return Err(AppError::bad_request(
            "another member with this e-mail already belongs to your organization",
        ));
    }

    let invite_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO member_invites (id, email, role, organization_id, author_id, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(invite_id)
    .bind(&payload.email)
    .bind(payload.role.as_str())
    .bind(organization.id)
    .bind(auth.user_id)
    .bind(utc_now())
    .execute(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(InviteCreatedResponse { invite_id }),
    ))
}

#[utoipa::path(
    get,
    path = "/organizations/{slug}/member-invites",
    tag = "Member invites",
    params(("slug" = String, Path, description = "Organization slug")),
    responses(
        (status = 200, description = "Organization invites", body = [MemberInvite]),
        (status = 403, description = "Not allowed to list invites")
    )
)]
pub async fn list_invites(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<Vec<MemberInvite>>> {
    let ctx = resolve_membership(&state.pool, auth.user_id, &slug).await?;
    let ability = ctx.ability()?;

    ensure_allowed(
        &ability,
        Action::Get,
        Subject::Invite,
        None,
        "you're not allowed to see organization invites",
    )?;

    let sql = format!("{DETAILED_INVITE_QUERY} WHERE i.organization_id = ? ORDER BY i.created_at DESC");
    let rows = sqlx::query_as::<_, DbMemberInviteDetailed>(&sql)
        .bind(ctx.organization.id)
        .fetch_all(&state.pool)
        .await?;

    let invites: Vec<MemberInvite> = rows
        .into_iter()
        .map(MemberInvite::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(invites))
}

#[utoipa::path(
    get,
    path = "/member-invites/{invite_id}",
    tag = "Member invites",
    params(("invite_id" = Uuid, Path, description = "Invite id")),
    responses(
        (status = 200, description = "Invite detail", body = MemberInvite),
        (status = 404, description = "Invite not found")
    )
)]
pub async fn get_invite(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(invite_id): Path<Uuid>,
) -> AppResult<Json<MemberInvite>> {
    let sql = format!("{DETAILED_INVITE_QUERY} WHERE i.id = ?");
    let row = sqlx::query_as::<_, DbMemberInviteDetailed>(&sql)
        .bind(invite_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::not_found("invite not found"))?;

    Ok(Json(row.try_into()?))
}

#[utoipa::path(
    post,
    path = "/member-invites/{invite_id}/accept",
    tag = "Member invites",
    params(("invite_id" = Uuid, Path, description = "Invite id")),
    responses(
        (status = 204, description = "Invite accepted"),
        (status = 400, description = "Invite invalid for this user")
    )
)]
pub async fn accept_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invite_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let invite = fetch_invite_for_user(&state.pool, invite_id, auth.user_id).await?;

    let mut tx = state.pool.begin().await?;

    sqlx::query(
        "INSERT INTO members (id, organization_id, user_id, role, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(invite.organization_id)
    .bind(auth.user_id)
    .bind(&invite.role)
    .bind(utc_now())
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM member_invites WHERE id = ?")
        .bind(invite.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/member-invites/{invite_id}/reject",
    tag = "Member invites",
    params(("invite_id" = Uuid, Path, description = "Invite id")),
    responses(
        (status = 204, description = "Invite rejected"),
        (status = 400, description = "Invite invalid for this user")
    )
)]
pub async fn reject_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invite_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let invite = fetch_invite_for_user(&state.pool, invite_id, auth.user_id).await?;

    sqlx::query("DELETE FROM member_invites WHERE id = ?")
        .bind(invite.id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/organizations/{slug}/member-invites/{invite_id}",
    tag = "Member invites",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("invite_id" = Uuid, Path, description = "Invite id")
    ),
    responses(
        (status = 204, description = "Invite revoked"),
        (status = 403, description = "Not allowed to delete invites")
    )
)]
pub async fn revoke_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((slug, invite_id)): Path<(String, Uuid)>,
) -> AppResult<StatusCode> {
    let ctx = resolve_membership(&state.pool, auth.user_id, &slug).await?;
    let ability = ctx.ability()?;

    ensure_allowed(
        &ability,
        Action::Delete,
        Subject::Invite,
        None,
        "you're not allowed to delete an invite",
    )?;

    let affected = sqlx::query("DELETE FROM member_invites WHERE id = ? AND organization_id = ?")
        .bind(invite_id)
        .bind(ctx.organization.id)
        .execute(&state.pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("invite not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/pending-member-invites",
    tag = "Member invites",
    responses((status = 200, description = "Invites pending for the caller", body = [MemberInvite]))
)]
pub async fn list_pending_invites(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<MemberInvite>>> {
    let user = fetch_user_by_id(&state.pool, auth.user_id).await?;

    let sql = format!("{DETAILED_INVITE_QUERY} WHERE i.email = ? ORDER BY i.created_at DESC");
    let rows = sqlx::query_as::<_, DbMemberInviteDetailed>(&sql)
        .bind(&user.email)
        .fetch_all(&state.pool)
        .await?;

    let invites: Vec<MemberInvite> = rows
        .into_iter()
        .map(MemberInvite::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(invites))
}

/// Load an invite and check it targets the acting user's e-mail.
async fn fetch_invite_for_user(
    pool: &SqlitePool,
    invite_id: Uuid,
    user_id: Uuid,
) -> AppResult<DbMemberInvite> {
    let invite = sqlx::query_as::<_, DbMemberInvite>(
        "SELECT id, email, role, organization_id, author_id, created_at FROM member_invites WHERE id = ?",
    )
    .bind(invite_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::bad_request("invite not found or expired"))?;

    let user = fetch_user_by_id(pool, user_id).await?;

    if user.email != invite.email {
        return Err(AppError::bad_request("this invite belongs to another user"));
    }

    Ok(invite)
}
