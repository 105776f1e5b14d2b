//! Self-service account operations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use tokengate_auth::{AuthorizationGate, CredentialHasher, SessionManager};
use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_database::IdentityRepository;
use tokengate_entity::{AuthenticatedIdentity, Identity, NewIdentity, Role};

/// Fields a subject may change on their own account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountUpdate {
    /// New password.
    pub password: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
}

/// Registration, profile changes, deletion, and session resets.
#[derive(Debug, Clone)]
pub struct AccountService {
    identities: Arc<dyn IdentityRepository>,
    hasher: Arc<dyn CredentialHasher>,
    salt_size: usize,
    sessions: Arc<SessionManager>,
    gate: Arc<AuthorizationGate>,
}

impl AccountService {
    /// Creates a new account service.
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        hasher: Arc<dyn CredentialHasher>,
        salt_size: usize,
        sessions: Arc<SessionManager>,
        gate: Arc<AuthorizationGate>,
    ) -> Self {
        Self {
            identities,
            hasher,
            salt_size,
            sessions,
            gate,
        }
    }

    /// Creates a new identity with the `user` role.
    pub async fn register(&self, phone: &str, password: &str) -> AppResult<Identity> {
        let phone = phone.trim();
        if phone.is_empty() || password.is_empty() {
            return Err(AppError::validation("Phone and password are required"));
        }

        if self.identities.phone_exists(phone).await? {
            return Err(AppError::conflict("Phone number already registered"));
        }

        let (password_hash, password_salt) = self.digest(password)?;
        let identity = self
            .identities
            .create(NewIdentity {
                phone: phone.to_string(),
                password_hash,
                password_salt,
                role: Role::User,
            })
            .await?;

        info!(subject_id = identity.id, "Identity registered");
        Ok(identity)
    }

    /// The caller's own identity.
    pub async fn me(&self, actor: &AuthenticatedIdentity) -> AppResult<Identity> {
        self.identities
            .find_by_id(actor.subject_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Changes the caller's password and/or phone.
    ///
    /// Each change revokes every session of the caller. A revocation failure
    /// is returned as `Internal` while the change itself stays committed.
    /// A phone held by someone else is rejected before anything is written.
    pub async fn update(&self, actor: &AuthenticatedIdentity, update: AccountUpdate) -> AppResult<()> {
        let password = update.password.filter(|p| !p.is_empty());
        let phone = update
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        if password.is_none() && phone.is_none() {
            return Err(AppError::validation("Nothing to update"));
        }

        if let Some(phone) = &phone {
            if let Some(holder) = self.identities.find_by_phone(phone).await? {
                if holder.id != actor.subject_id {
                    return Err(AppError::conflict("Phone number already registered"));
                }
            }
        }

        if let Some(password) = password {
            let (digest, salt) = self.digest(&password)?;
            self.identities
                .update_password(actor.subject_id, &digest, &salt)
                .await?;
            info!(subject_id = actor.subject_id, "Password changed");
            self.sessions.purge_subject_cache(actor.subject_id).await?;
        }

        if let Some(phone) = phone {
            self.identities.update_phone(actor.subject_id, &phone).await?;
            info!(subject_id = actor.subject_id, "Phone changed");
            self.sessions.purge_subject_cache(actor.subject_id).await?;
        }

        Ok(())
    }

    /// Revokes every session of the target and returns its id.
    ///
    /// Admins may target anyone (themselves by default); others always
    /// target themselves.
    pub async fn reset_tokens(&self, actor: &AuthenticatedIdentity, target: Option<i64>) -> AppResult<i64> {
        let target = self.gate.reset_target(actor, target);
        if target != actor.subject_id && self.identities.find_by_id(target).await?.is_none() {
            return Err(AppError::not_found(format!("User {target} not found")));
        }

        self.sessions.revoke_for_subject(target).await?;
        info!(actor_id = actor.subject_id, subject_id = target, "Sessions reset");
        Ok(target)
    }

    /// Soft-deletes the target and revokes its sessions.
    pub async fn delete(&self, actor: &AuthenticatedIdentity, target: i64) -> AppResult<()> {
        self.gate.authorize_delete(actor, target)?;

        self.identities.soft_delete(target).await?;
        info!(actor_id = actor.subject_id, subject_id = target, "Identity deleted");
        self.sessions.purge_subject_cache(target).await
    }

    /// Restores a soft-deleted identity.
    pub async fn dig_up(&self, actor: &AuthenticatedIdentity, target: i64) -> AppResult<Identity> {
        self.gate.authorize_dig_up(actor, target)?;

        let identity = self.identities.dig_up(target).await?;
        info!(actor_id = actor.subject_id, subject_id = target, "Identity restored");
        Ok(identity)
    }

    fn digest(&self, password: &str) -> AppResult<(String, Vec<u8>)> {
        let salt = self.hasher.random_salt(self.salt_size);
        let digest = self.hasher.hash(password, &salt)?;
        Ok((digest, salt))
    }
}
