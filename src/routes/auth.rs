use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Duration;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::user::{
    AuthResponse, DbUser, LoginRequest, PasswordRecoverRequest, PasswordResetRequest,
    RegisterRequest, User,
};
use crate::utils::{email_domain, hash_password, utc_now, verify_password};

const PASSWORD_RECOVER: &str = "PASSWORD_RECOVER";

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    ensure_email_available(&state.pool, &payload.email).await?;

    let password_hash = hash_password(&payload.password)?;
    let now = utc_now();
    let user_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO users (id, name, email, avatar_url, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(Option::<String>::None)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    attach_user_by_domain(&state.pool, user_id, &payload.email).await?;

    let db_user = fetch_user_by_id(&state.pool, user_id).await?;
    let user: User = db_user.try_into()?;
    let token = state.jwt.encode(user.id)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let db_user = sqlx::query_as::<_, DbUser>(
        "SELECT id, name, email, avatar_url, password_hash, created_at, updated_at FROM users WHERE email = ?",
    )
    .bind(&payload.email)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

    let password_ok = verify_password(&payload.password, &db_user.password_hash)?;
    if !password_ok {
        return Err(AppError::unauthorized("invalid credentials"));
    }

    let token = state.jwt.encode(db_user.id)?;
    let user: User = db_user.try_into()?;

    Ok(Json(AuthResponse { token, user }))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses((status = 200, description = "Current user", body = User))
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<User>> {
    let db_user = fetch_user_by_id(&state.pool, auth.user_id).await?;
    let user: User = db_user.try_into()?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/auth/password/recover",
    tag = "Auth",
    request_body = PasswordRecoverRequest,
    responses((status = 201, description = "Recovery requested"))
)]
pub async fn request_password_recover(
    State(state): State<AppState>,
    Json(payload): Json<PasswordRecoverRequest>,
) -> AppResult<StatusCode> {
    let user = sqlx::query_as::<_, DbUser>(
        "SELECT id, name, email, avatar_url, password_hash, created_at, updated_at FROM users WHERE email = ?",
    )
    .bind(&payload.email)
    .fetch_optional(&state.pool)
    .await?;

    // Always answer 201 so the endpoint cannot be used to enumerate accounts.
    let Some(user) = user else {
        return Ok(StatusCode::CREATED);
    };

    sqlx::query("DELETE FROM tokens WHERE user_id = ? AND token_type = ?")
        .bind(user.id)
        .bind(PASSWORD_RECOVER)
        .execute(&state.pool)
        .await?;

    let code = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO tokens (id, token_type, user_id, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(code)
    .bind(PASSWORD_RECOVER)
    .bind(user.id)
    .bind(now + Duration::hours(1))
    .bind(now)
    .execute(&state.pool)
    .await?;

    // Mail delivery is handled out-of-band; surface the code for operators.
    tracing::info!(user_id = %user.id, %code, "password recovery token issued");

    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    post,
    path = "/auth/password/reset",
    tag = "Auth",
    request_body = PasswordResetRequest,
    responses(
        (status = 204, description = "Password updated"),
        (status = 401, description = "Invalid or expired code")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> AppResult<StatusCode> {
    let user_id: Option<Uuid> = sqlx::query_scalar(
        "SELECT user_id FROM tokens WHERE id = ? AND token_type = ? AND expires_at > ?",
    )
    .bind(payload.code)
    .bind(PASSWORD_RECOVER)
    .bind(utc_now())
    .fetch_optional(&state.pool)
    .await?;

    let user_id = user_id.ok_or_else(|| AppError::unauthorized("invalid or expired code"))?;

    let password_hash = hash_password(&payload.password)?;
    let now = utc_now();

    let mut tx = state.pool.begin().await?;

    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM tokens WHERE user_id = ? AND token_type = ?")
        .bind(user_id)
        .bind(PASSWORD_RECOVER)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Attach a fresh account to the organization claiming its e-mail domain,
/// when that organization opted into domain auto-join.
async fn attach_user_by_domain(pool: &SqlitePool, user_id: Uuid, email: &str) -> AppResult<()> {
    let Some(domain) = email_domain(email) else {
        return Ok(());
    };

    let organization_id: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM organizations WHERE domain = ? AND should_attach_users_by_domain = 1",
    )
    .bind(domain)
    .fetch_optional(pool)
    .await?;

    if let Some(organization_id) = organization_id {
        sqlx::query(
            "INSERT INTO members (id, organization_id, user_id, role, created_at) VALUES (?, ?, ?, 'MEMBER', ?)",
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(user_id)
        .bind(utc_now())
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn ensure_email_available(pool: &SqlitePool, email: &str) -> AppResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await?;

    if count > 0 {
        return Err(AppError::conflict("email already in use"));
    }

    Ok(())
}

pub(crate) async fn fetch_user_by_id(pool: &SqlitePool, user_id: Uuid) -> AppResult<DbUser> {
    sqlx::query_as::<_, DbUser>(
        "SELECT id, name, email, avatar_url, password_hash, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("user not found"))
}
