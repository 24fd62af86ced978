use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::member::MemberRole;

#[derive(Debug, Clone, FromRow)]
pub struct DbMemberInvite {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub organization_id: Uuid,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Invite joined with author and organization details for listings.
#[derive(Debug, Clone, FromRow)]
pub struct DbMemberInviteDetailed {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub author_avatar_url: Option<String>,
    pub organization_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InviteAuthor {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberInvite {
    pub id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
    pub author: Option<InviteAuthor>,
    pub organization_name: String,
}

impl TryFrom<DbMemberInviteDetailed> for MemberInvite {
    type Error = AppError;

    fn try_from(value: DbMemberInviteDetailed) -> Result<Self, Self::Error> {
        let author = match (value.author_id, value.author_name) {
            (Some(id), Some(name)) => Some(InviteAuthor {
                id,
                name,
                avatar_url: value.author_avatar_url,
            }),
            _ => None,
        };

        Ok(MemberInvite {
            id: value.id,
            email: value.email,
            role: value.role.parse()?,
            created_at: value.created_at,
            author,
            organization_name: value.organization_name,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InviteCreateRequest {
    #[schema(example = "jane.smith@example.com")]
    pub email: String,
    #[schema(example = "MEMBER")]
    pub role: MemberRole,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InviteCreatedResponse {
    pub invite_id: Uuid,
}
