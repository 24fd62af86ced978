use sqlx::SqlitePool;
use uuid::Uuid;

use super::ability::{build_ability, Ability};
use super::rules::ResourceAttrs;
use super::subject::{Action, Subject};
use crate::errors::{AppError, AppResult};
use crate::models::member::DbMember;
use crate::models::organization::DbOrganization;

/// The caller's standing inside one organization: the organization row plus
/// their membership. Resolved once per request, before any permission check.
#[derive(Debug, Clone)]
pub struct OrgContext {
    pub organization: DbOrganization,
    pub membership: DbMember,
}

impl OrgContext {
    /// Build the ability for this membership. Fails with a configuration
    /// error if the stored role is outside the enumeration.
    pub fn ability(&self) -> AppResult<Ability> {
        build_ability(self.membership.user_id, &self.membership.role)
    }

    /// Attributes of the organization itself, for ownership-gated checks.
    pub fn organization_attrs(&self) -> ResourceAttrs {
        ResourceAttrs::owned_by(self.organization.owner_id)
    }
}

/// Resolve the acting user's membership in the organization named by `slug`.
/// A missing organization is 404; an existing organization the user does not
/// belong to is an authorization failure.
pub async fn resolve_membership(
    pool: &SqlitePool,
    user_id: Uuid,
    slug: &str,
) -> AppResult<OrgContext> {
    let organization = sqlx::query_as::<_, DbOrganization>(
        "SELECT id, name, slug, domain, should_attach_users_by_domain, avatar_url, owner_id, created_at, updated_at FROM organizations WHERE slug = ?",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("organization not found"))?;

    let membership = sqlx::query_as::<_, DbMember>(
        "SELECT id, organization_id, user_id, role, created_at FROM members WHERE organization_id = ? AND user_id = ?",
    )
    .bind(organization.id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::forbidden("you're not a member of this organization"))?;

    Ok(OrgContext {
        organization,
        membership,
    })
}

/// Same resolution as [`resolve_membership`], for routes that carry the
/// organization id instead of its slug.
pub async fn resolve_membership_by_id(
    pool: &SqlitePool,
    user_id: Uuid,
    organization_id: Uuid,
) -> AppResult<OrgContext> {
    let organization = sqlx::query_as::<_, DbOrganization>(
        "SELECT id, name, slug, domain, should_attach_users_by_domain, avatar_url, owner_id, created_at, updated_at FROM organizations WHERE id = ?",
    )
    .bind(organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("organization not found"))?;

    let membership = sqlx::query_as::<_, DbMember>(
        "SELECT id, organization_id, user_id, role, created_at FROM members WHERE organization_id = ? AND user_id = ?",
    )
    .bind(organization.id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::forbidden("you're not a member of this organization"))?;

    Ok(OrgContext {
        organization,
        membership,
    })
}

/// Abort with 403 unless the ability allows `action` on `subject`. All role
/// logic lives in the rule table; this only converts the boolean answer.
pub fn ensure_allowed(
    ability: &Ability,
    action: Action,
    subject: Subject,
    instance: Option<&ResourceAttrs>,
    denial_message: &str,
) -> AppResult<()> {
    if ability.cannot(action, subject, instance)? {
        return Err(AppError::forbidden(denial_message));
    }

    Ok(())
}
