use uuid::Uuid;

use super::rules::{rules_for, ActingUser, Effect, ResourceAttrs, Rule};
use super::subject::{Action, Subject};
use crate::errors::{AppError, AppResult};
use crate::models::member::MemberRole;

/// The evaluated permission set for one (user, role) pair.
///
/// Construction is a pure function of its inputs, so an `Ability` is built
/// per request and discarded; it holds no shared state and performs no I/O.
#[derive(Debug, Clone)]
pub struct Ability {
    user: ActingUser,
    rules: Vec<Rule>,
}

impl Ability {
    pub fn new(user_id: Uuid, role: MemberRole) -> Self {
        let user = ActingUser { id: user_id, role };
        let rules = rules_for(&user);
        Self { user, rules }
    }

    /// Whether the user may perform `action` on `subject`.
    ///
    /// Matching rules are evaluated in declaration order and the last one
    /// whose condition holds decides; no matching rule means deny. Passing
    /// no instance skips conditional rules, so callers must load the
    /// resource attributes for ownership-gated checks.
    ///
    /// An action/subject pair outside the catalog is a programming error
    /// and fails hard instead of quietly denying.
    pub fn can(
        &self,
        action: Action,
        subject: Subject,
        instance: Option<&ResourceAttrs>,
    ) -> AppResult<bool> {
        if !subject.supports(action) {
            return Err(AppError::internal(format!(
                "action '{action}' is not defined for subject '{subject}'"
            )));
        }

        let allowed = evaluate(&self.rules, &self.user, action, subject, instance);

        tracing::debug!(
            user_id = %self.user.id,
            role = %self.user.role,
            action = %action,
            subject = %subject,
            allowed,
            "ability check"
        );

        Ok(allowed)
    }

    /// Exact logical complement of [`Ability::can`].
    pub fn cannot(
        &self,
        action: Action,
        subject: Subject,
        instance: Option<&ResourceAttrs>,
    ) -> AppResult<bool> {
        Ok(!self.can(action, subject, instance)?)
    }
}

/// Last-matching-rule-wins interpreter over an ordered rule list.
fn evaluate(
    rules: &[Rule],
    user: &ActingUser,
    action: Action,
    subject: Subject,
    instance: Option<&ResourceAttrs>,
) -> bool {
    let mut verdict = None;

    for rule in rules.iter().filter(|rule| rule.matches(action, subject)) {
        match (rule.condition, instance) {
            (None, _) => verdict = Some(rule.effect),
            (Some(condition), Some(attrs)) if condition(attrs, user) => {
                verdict = Some(rule.effect)
            }
            // Unsatisfied (or unevaluable) condition: the rule is skipped.
            _ => {}
        }
    }

    matches!(verdict, Some(Effect::Allow))
}

/// Build the ability for a user given the role string loaded from storage.
/// A role outside the enumeration is a configuration error, never a silently
/// empty permission set.
pub fn build_ability(user_id: Uuid, role: &str) -> AppResult<Ability> {
    let role: MemberRole = role.parse()?;
    Ok(Ability::new(user_id, role))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> (Uuid, Ability) {
        let user_id = Uuid::new_v4();
        (user_id, Ability::new(user_id, MemberRole::Admin))
    }

    fn member() -> Ability {
        Ability::new(Uuid::new_v4(), MemberRole::Member)
    }

    #[test]
    fn admin_may_mutate_owned_organization() {
        let (user_id, ability) = admin();
        let owned = ResourceAttrs::owned_by(user_id);

        for action in [Action::Update, Action::Delete, Action::TransferOwnership] {
            assert!(ability
                .can(action, Subject::Organization, Some(&owned))
                .unwrap());
        }
    }

    #[test]
    fn admin_may_not_mutate_foreign_organization() {
        let (_, ability) = admin();
        let foreign = ResourceAttrs::owned_by(Uuid::new_v4());

        for action in [Action::Update, Action::Delete, Action::TransferOwnership] {
            assert!(ability
                .cannot(action, Subject::Organization, Some(&foreign))
                .unwrap());
        }
    }

    #[test]
    fn admin_manages_everything_else_without_an_instance() {
        let (_, ability) = admin();

        assert!(ability.can(Action::Create, Subject::Invite, None).unwrap());
        assert!(ability.can(Action::Delete, Subject::Member, None).unwrap());
        assert!(ability.can(Action::Update, Subject::Event, None).unwrap());
        assert!(ability.can(Action::Get, Subject::Organization, None).unwrap());
    }

    #[test]
    fn member_may_only_read_user_profiles() {
        let ability = member();
        let any = ResourceAttrs::owned_by(Uuid::new_v4());

        assert!(ability.can(Action::Get, Subject::User, None).unwrap());
        assert!(ability
            .cannot(Action::Update, Subject::Organization, Some(&any))
            .unwrap());
        assert!(ability.cannot(Action::Delete, Subject::Invite, None).unwrap());
        assert!(ability.cannot(Action::Create, Subject::Event, None).unwrap());
    }

    #[test]
    fn can_and_cannot_are_complements() {
        let (user_id, ability) = admin();
        let owned = ResourceAttrs::owned_by(user_id);
        let foreign = ResourceAttrs::owned_by(Uuid::new_v4());

        for (action, subject, instance) in [
            (Action::Update, Subject::Organization, Some(&owned)),
            (Action::Update, Subject::Organization, Some(&foreign)),
            (Action::Create, Subject::Invite, None),
            (Action::Get, Subject::User, None),
        ] {
            let can = ability.can(action, subject, instance).unwrap();
            let cannot = ability.cannot(action, subject, instance).unwrap();
            assert_ne!(can, cannot);
        }
    }

    #[test]
    fn conditional_rules_are_skipped_without_an_instance() {
        // Without the loaded organization the ownership carve-out cannot
        // fire, so the blanket deny stands even for the actual owner.
        let (_, ability) = admin();
        assert!(ability
            .cannot(Action::Update, Subject::Organization, None)
            .unwrap());
    }

    #[test]
    fn later_rules_override_earlier_ones() {
        // Pin the emission order: moving the conditional allow ahead of the
        // blanket deny must flip the owned-organization outcome.
        let user = ActingUser {
            id: Uuid::new_v4(),
            role: MemberRole::Admin,
        };
        let owned = ResourceAttrs::owned_by(user.id);

        let documented = rules_for(&user);
        assert!(evaluate(
            &documented,
            &user,
            Action::Update,
            Subject::Organization,
            Some(&owned)
        ));

        let mut reordered = documented;
        reordered.swap(1, 2);
        assert!(!evaluate(
            &reordered,
            &user,
            Action::Update,
            Subject::Organization,
            Some(&owned)
        ));
    }

    #[test]
    fn every_role_string_in_the_enumeration_builds() {
        let user_id = Uuid::new_v4();
        for role in ["ADMIN", "MEMBER"] {
            build_ability(user_id, role).unwrap();
        }
    }

    #[test]
    fn unknown_role_is_a_configuration_error() {
        let err = build_ability(Uuid::new_v4(), "SUPERUSER").unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn undefined_action_subject_pair_fails_hard() {
        let (_, ability) = admin();
        let err = ability
            .can(Action::TransferOwnership, Subject::Invite, None)
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
