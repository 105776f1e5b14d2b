//! Role and ownership checks for account operations.

use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_entity::{AuthenticatedIdentity, Role};

/// Decides whether a validated identity may perform an operation.
///
/// The role id carried by the identity is the only authorization signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationGate;

impl AuthorizationGate {
    /// Creates a new gate.
    pub fn new() -> Self {
        Self
    }

    /// Whether the identity holds one of `allowed`.
    pub fn has_role(&self, identity: &AuthenticatedIdentity, allowed: &[Role]) -> bool {
        allowed.contains(&identity.role)
    }

    /// Fails with `PermissionDenied` unless the identity holds one of `allowed`.
    pub fn require_role(&self, identity: &AuthenticatedIdentity, allowed: &[Role]) -> AppResult<()> {
        if self.has_role(identity, allowed) {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "Role '{}' is not allowed to perform this action",
                identity.role
            )))
        }
    }

    /// Only admins may list subjects.
    pub fn authorize_list(&self, actor: &AuthenticatedIdentity) -> AppResult<()> {
        self.require_role(actor, &[Role::Admin])
    }

    /// Nobody changes their own role; only admins change anyone else's.
    pub fn authorize_change_role(&self, actor: &AuthenticatedIdentity, target_id: i64) -> AppResult<()> {
        if actor.subject_id == target_id {
            return Err(AppError::permission_denied("Cannot change your own role"));
        }
        self.require_role(actor, &[Role::Admin])
    }

    /// Deletion rule: a non-admin acts only on themselves, an admin only on others.
    pub fn authorize_delete(&self, actor: &AuthenticatedIdentity, target_id: i64) -> AppResult<()> {
        Self::self_action_rule(actor, target_id, "delete")
    }

    /// Same rule as [`Self::authorize_delete`].
    ///
    /// A deleted subject has no live session and cannot log in, so the
    /// self branch is never reached through a validated token. In practice
    /// only an admin restores, and only someone else.
    pub fn authorize_dig_up(&self, actor: &AuthenticatedIdentity, target_id: i64) -> AppResult<()> {
        Self::self_action_rule(actor, target_id, "restore")
    }

    /// Subject whose sessions a reset applies to.
    ///
    /// Admins may name any subject and default to themselves; everyone else
    /// always resets their own sessions.
    pub fn reset_target(&self, actor: &AuthenticatedIdentity, requested: Option<i64>) -> i64 {
        if actor.is_admin() {
            requested.unwrap_or(actor.subject_id)
        } else {
            actor.subject_id
        }
    }

    fn self_action_rule(actor: &AuthenticatedIdentity, target_id: i64, action: &str) -> AppResult<()> {
        let is_self = actor.subject_id == target_id;
        match (actor.is_admin(), is_self) {
            (true, true) => Err(AppError::permission_denied(format!(
                "Admins cannot {action} their own account"
            ))),
            (false, false) => Err(AppError::permission_denied(format!(
                "Cannot {action} another user's account"
            ))),
            _ => Ok(()),
        }
    }
}
