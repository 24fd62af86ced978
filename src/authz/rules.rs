use uuid::Uuid;

use super::subject::{Action, Subject};
use crate::models::member::MemberRole;

/// The user a permission question is asked about: their id plus the role
/// they hold in the organization under consideration. The same person gets
/// a different `ActingUser` per organization.
#[derive(Debug, Clone, Copy)]
pub struct ActingUser {
    pub id: Uuid,
    pub role: MemberRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

/// Attributes a resource instance exposes to conditional grants. The caller
/// loads these before asking; conditions never touch storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceAttrs {
    pub owner_id: Option<Uuid>,
}

impl ResourceAttrs {
    pub fn owned_by(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
        }
    }
}

/// Pure predicate over (instance attributes, acting user).
pub type Condition = fn(&ResourceAttrs, &ActingUser) -> bool;

/// A single grant: effect + action set + subject, optionally narrowed by a
/// condition. Rules are evaluated in declaration order and the last matching
/// rule wins, so order inside `rules_for` is a correctness contract.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub effect: Effect,
    pub actions: &'static [Action],
    pub subject: Subject,
    pub condition: Option<Condition>,
}

impl Rule {
    pub fn matches(&self, action: Action, subject: Subject) -> bool {
        let subject_match = self.subject == Subject::All || self.subject == subject;
        let action_match =
            self.actions.contains(&Action::Manage) || self.actions.contains(&action);
        subject_match && action_match
    }
}

const ORGANIZATION_OWNER_ACTIONS: &[Action] =
    &[Action::TransferOwnership, Action::Update, Action::Delete];

fn instance_owned_by_user(instance: &ResourceAttrs, user: &ActingUser) -> bool {
    instance.owner_id == Some(user.id)
}

/// Ordered grant rules for a role.
///
/// Each role follows the same two-tier pattern: coarse grants and denies
/// first, ownership-conditioned overrides second. An admin manages
/// everything, but may only update, delete, or transfer an organization they
/// personally own; a plain member may only read user profiles.
///
/// The match is total over `MemberRole`, so a role without rules cannot
/// compile. Unknown role *strings* from storage are rejected earlier, when
/// the gate parses them.
pub fn rules_for(user: &ActingUser) -> Vec<Rule> {
    match user.role {
        MemberRole::Admin => vec![
            Rule {
                effect: Effect::Allow,
                actions: &[Action::Manage],
                subject: Subject::All,
                condition: None,
            },
            Rule {
                effect: Effect::Deny,
                actions: ORGANIZATION_OWNER_ACTIONS,
                subject: Subject::Organization,
                condition: None,
            },
            Rule {
                effect: Effect::Allow,
                actions: ORGANIZATION_OWNER_ACTIONS,
                subject: Subject::Organization,
                condition: Some(instance_owned_by_user),
            },
        ],
        MemberRole::Member => vec![Rule {
            effect: Effect::Allow,
            actions: &[Action::Get],
            subject: Subject::User,
            condition: None,
        }],
    }
}
