use std::fmt;

/// Resource kinds permissions apply to. `All` is the wildcard pseudo-subject
/// used by grant rules; it is never a valid query subject on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    User,
    Organization,
    Invite,
    Member,
    Team,
    Event,
    All,
}

/// Verbs applicable to subjects. `Manage` is the wildcard matching every
/// action a subject supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Manage,
    Get,
    Create,
    Update,
    Delete,
    TransferOwnership,
}

impl Subject {
    /// The closed action set for this subject, `Manage` excluded.
    pub fn actions(&self) -> &'static [Action] {
        use Action::*;

        match self {
            Subject::User => &[Get, Update, Delete],
            Subject::Organization => &[Get, Update, Delete, TransferOwnership],
            Subject::Invite => &[Get, Create, Delete],
            Subject::Member => &[Get, Update, Delete],
            Subject::Team => &[Get, Create, Update, Delete],
            Subject::Event => &[Get, Create, Update, Delete],
            Subject::All => &[],
        }
    }

    /// Whether `action` is defined for this subject. Querying an unsupported
    /// pair is a caller bug, surfaced as a hard error by the evaluator.
    pub fn supports(&self, action: Action) -> bool {
        matches!(action, Action::Manage) || self.actions().contains(&action)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subject::User => "User",
            Subject::Organization => "Organization",
            Subject::Invite => "Invite",
            Subject::Member => "Member",
            Subject::Team => "Team",
            Subject::Event => "Event",
            Subject::All => "all",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Manage => "manage",
            Action::Get => "get",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::TransferOwnership => "transfer_ownership",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manage_is_valid_for_every_subject() {
        for subject in [
            Subject::User,
            Subject::Organization,
            Subject::Invite,
            Subject::Member,
            Subject::Team,
            Subject::Event,
            Subject::All,
        ] {
            assert!(subject.supports(Action::Manage));
        }
    }

    #[test]
    fn catalog_rejects_undefined_pairs() {
        assert!(Subject::Organization.supports(Action::TransferOwnership));
        assert!(!Subject::Invite.supports(Action::TransferOwnership));
        assert!(!Subject::User.supports(Action::Create));
        assert!(!Subject::All.supports(Action::Get));
    }
}
