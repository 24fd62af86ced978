//! Authorization module - role-based, attribute-aware capability checks
//!
//! The pieces, leaf to root:
//! - `subject`: the closed catalog of resource kinds and their actions
//! - `rules`: per-role ordered grant rules, including ownership carve-outs
//! - `ability`: the evaluator answering `can`/`cannot` for one (user, role)
//! - `gate`: the per-request integration that resolves a membership and
//!   turns a denial into a 403 before any mutation runs

mod ability;
mod gate;
mod rules;
mod subject;

pub use ability::{build_ability, Ability};
pub use gate::{ensure_allowed, resolve_membership, resolve_membership_by_id, OrgContext};
pub use rules::{rules_for, ActingUser, Condition, Effect, ResourceAttrs, Rule};
pub use subject::{Action, Subject};
