//! Administrative account operations: role changes and listing.

use std::sync::Arc;

use tracing::info;

use tokengate_auth::{AuthorizationGate, SessionManager};
use tokengate_core::result::AppResult;
use tokengate_core::types::pagination::{PageRequest, PageResponse};
use tokengate_database::IdentityRepository;
use tokengate_entity::{AuthenticatedIdentity, Identity, Role};

/// Operations reserved for admins.
#[derive(Debug, Clone)]
pub struct AdminAccountService {
    identities: Arc<dyn IdentityRepository>,
    sessions: Arc<SessionManager>,
    gate: Arc<AuthorizationGate>,
}

impl AdminAccountService {
    /// Creates a new admin account service.
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        sessions: Arc<SessionManager>,
        gate: Arc<AuthorizationGate>,
    ) -> Self {
        Self {
            identities,
            sessions,
            gate,
        }
    }

    /// Assigns the role named `role_name` to the target and revokes its sessions.
    pub async fn change_role(
        &self,
        actor: &AuthenticatedIdentity,
        target: i64,
        role_name: &str,
    ) -> AppResult<Role> {
        self.gate.authorize_change_role(actor, target)?;
        let role: Role = role_name.parse()?;

        self.identities.change_role(target, role).await?;
        info!(
            actor_id = actor.subject_id,
            subject_id = target,
            role = %role,
            "Role changed"
        );

        self.sessions.purge_subject_cache(target).await?;
        Ok(role)
    }

    /// One page of active identities.
    pub async fn list(
        &self,
        actor: &AuthenticatedIdentity,
        page: PageRequest,
    ) -> AppResult<PageResponse<Identity>> {
        self.gate.authorize_list(actor)?;
        self.identities.list(page).await
    }
}
