use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub owner_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub sport_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbEvent {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub owner_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub sport_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbEvent> for Event {
    type Error = AppError;

    fn try_from(value: DbEvent) -> Result<Self, Self::Error> {
        Ok(Event {
            id: value.id,
            name: value.name,
            slug: value.slug,
            description: value.description,
            start_date: value.start_date,
            end_date: value.end_date,
            owner_id: value.owner_id,
            organization_id: value.organization_id,
            sport_id: value.sport_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EventCreateRequest {
    #[schema(example = "Summer Football Championship")]
    pub name: String,
    #[schema(example = "Annual summer football tournament")]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub sport_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventCreatedResponse {
    pub event_id: Uuid,
}
