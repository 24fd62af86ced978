use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// Role of a user inside a single organization. The same user can hold a
/// different role in every organization they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "ADMIN",
            MemberRole::Member => "MEMBER",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = AppError;

    /// Role strings come from storage; a value outside the enumeration means
    /// the deployment is broken, not that the user lacks permissions.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ADMIN" => Ok(MemberRole::Admin),
            "MEMBER" => Ok(MemberRole::Member),
            other => Err(AppError::configuration(format!(
                "unknown member role: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbMember {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Member joined with the user row, as returned by the members listing.
#[derive(Debug, Clone, FromRow)]
pub struct DbMemberWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Member {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl TryFrom<DbMemberWithUser> for Member {
    type Error = AppError;

    fn try_from(value: DbMemberWithUser) -> Result<Self, Self::Error> {
        Ok(Member {
            id: value.id,
            user_id: value.user_id,
            role: value.role.parse()?,
            name: value.name,
            email: value.email,
            avatar_url: value.avatar_url,
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Membership {
    pub id: Uuid,
    pub role: MemberRole,
    pub user_id: Uuid,
    pub organization_id: Uuid,
}

impl TryFrom<DbMember> for Membership {
    type Error = AppError;

    fn try_from(value: DbMember) -> Result<Self, Self::Error> {
        Ok(Membership {
            id: value.id,
            role: value.role.parse()?,
            user_id: value.user_id,
            organization_id: value.organization_id,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMemberRoleRequest {
    #[schema(example = "ADMIN")]
    pub role: MemberRole,
}
