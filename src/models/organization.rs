use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::member::MemberRole;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
    pub should_attach_users_by_domain: bool,
    pub avatar_url: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbOrganization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
    pub should_attach_users_by_domain: bool,
    pub avatar_url: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbOrganization> for Organization {
    type Error = AppError;

    fn try_from(value: DbOrganization) -> Result<Self, Self::Error> {
        Ok(Organization {
            id: value.id,
            name: value.name,
            slug: value.slug,
            domain: value.domain,
            should_attach_users_by_domain: value.should_attach_users_by_domain,
            avatar_url: value.avatar_url,
            owner_id: value.owner_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// Organization row joined with the caller's membership role.
#[derive(Debug, Clone, FromRow)]
pub struct DbOrganizationWithRole {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub avatar_url: Option<String>,
    pub owner_id: Uuid,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrganizationSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub avatar_url: Option<String>,
    pub owner_id: Uuid,
    pub role: MemberRole,
}

impl TryFrom<DbOrganizationWithRole> for OrganizationSummary {
    type Error = AppError;

    fn try_from(value: DbOrganizationWithRole) -> Result<Self, Self::Error> {
        Ok(OrganizationSummary {
            id: value.id,
            name: value.name,
            slug: value.slug,
            avatar_url: value.avatar_url,
            owner_id: value.owner_id,
            role: value.role.parse()?,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrganizationCreateRequest {
    #[schema(example = "Lync Sports Club")]
    pub name: String,
    #[schema(example = "lyncsports.com")]
    pub domain: Option<String>,
    #[serde(default)]
    pub should_attach_users_by_domain: bool,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrganizationUpdateRequest {
    #[schema(example = "Lync Sports Club")]
    pub name: Option<String>,
    #[schema(example = "lyncsports.com")]
    pub domain: Option<String>,
    pub should_attach_users_by_domain: Option<bool>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferOwnershipRequest {
    pub transfer_to_user_id: Uuid,
}
