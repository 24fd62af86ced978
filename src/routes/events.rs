use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{ensure_allowed, resolve_membership_by_id, Action, Subject};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::event::{DbEvent, Event, EventCreateRequest, EventCreatedResponse};
use crate::utils::{create_slug, utc_now};

#[utoipa::path(
    post,
    path = "/events",
    tag = "Events",
    request_body = EventCreateRequest,
    responses(
        (status = 201, description = "Event created", body = EventCreatedResponse),
        (status = 403, description = "Not allowed to create events for this organization")
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<EventCreateRequest>,
) -> AppResult<(StatusCode, Json<EventCreatedResponse>)> {
    // Events owned by an organization require membership with event-creation
    // rights there; personal events only need an authenticated owner.
    if let Some(organization_id) = payload.organization_id {
        let ctx = resolve_membership_by_id(&state.pool, auth.user_id, organization_id).await?;
        let ability = ctx.ability()?;

        ensure_allowed(
            &ability,
            Action::Create,
            Subject::Event,
            None,
            "you're not allowed to create events for this organization",
        )?;
    }

    let slug = create_slug(&payload.name);
    if slug.is_empty() {
        return Err(AppError::bad_request("event name must contain letters or digits"));
    }

    let taken: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM events WHERE slug = ?")
        .bind(&slug)
        .fetch_one(&state.pool)
        .await?;

    if taken > 0 {
        return Err(AppError::conflict("an event with this name already exists"));
    }

    let event_id = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO events (id, name, slug, description, start_date, end_date, owner_id, organization_id, sport_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(event_id)
    .bind(&payload.name)
    .bind(&slug)
    .bind(&payload.description)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(auth.user_id)
    .bind(payload.organization_id)
    .bind(payload.sport_id)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(EventCreatedResponse { event_id })))
}

#[utoipa::path(
    get,
    path = "/events",
    tag = "Events",
    responses((status = 200, description = "Events the caller owns", body = [Event]))
)]
pub async fn list_events(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Event>>> {
    let rows = sqlx::query_as::<_, DbEvent>(
        "SELECT id, name, slug, description, start_date, end_date, owner_id, organization_id, sport_id, created_at, updated_at FROM events WHERE owner_id = ? ORDER BY start_date ASC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    let events: Vec<Event> = rows
        .into_iter()
        .map(Event::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(events))
}

#[utoipa::path(
    get,
    path = "/events/{slug}",
    tag = "Events",
    params(("slug" = String, Path, description = "Event slug")),
    responses(
        (status = 200, description = "Event detail", body = Event),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<Event>> {
    let event = sqlx::query_as::<_, DbEvent>(
        "SELECT id, name, slug, description, start_date, end_date, owner_id, organization_id, sport_id, created_at, updated_at FROM events WHERE slug = ?",
    )
    .bind(&slug)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("event not found"))?;

    if event.owner_id != auth.user_id {
        let visible = match event.organization_id {
            Some(organization_id) => {
                let member: i64 = sqlx::query_scalar(
                    "SELECT COUNT(1) FROM members WHERE organization_id = ? AND user_id = ?",
                )
                .bind(organization_id)
                .bind(auth.user_id)
                .fetch_one(&state.pool)
                .await?;
                member > 0
            }
            None => false,
        };

        if !visible {
            return Err(AppError::not_found("event not found"));
        }
    }

    Ok(Json(event.try_into()?))
}
