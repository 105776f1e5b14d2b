//! In-memory identity repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_core::types::pagination::{PageRequest, PageResponse};
use tokengate_entity::{Identity, NewIdentity, Role};

use super::Tables;
use crate::store::IdentityRepository;

/// Identity repository over a [`super::MemoryDatabase`].
#[derive(Debug, Clone)]
pub struct MemoryIdentityRepository {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryIdentityRepository {
    pub(crate) fn new(tables: Arc<Mutex<Tables>>) -> Self {
        Self { tables }
    }
}

fn active_mut(tables: &mut Tables, id: i64) -> AppResult<&mut Identity> {
    tables
        .users
        .iter_mut()
        .find(|u| u.id == id && !u.is_deleted())
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
}

fn phone_taken(tables: &Tables, phone: &str, except: Option<i64>) -> bool {
    tables
        .users
        .iter()
        .any(|u| u.phone == phone && !u.is_deleted() && Some(u.id) != except)
}

#[async_trait]
impl IdentityRepository for MemoryIdentityRepository {
    async fn phone_exists(&self, phone: &str) -> AppResult<bool> {
        let tables = self.tables.lock().await;
        Ok(phone_taken(&tables, phone, None))
    }

    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<Identity>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.phone == phone && !u.is_deleted())
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Identity>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.id == id && !u.is_deleted())
            .cloned())
    }

    async fn create(&self, identity: NewIdentity) -> AppResult<Identity> {
        let mut tables = self.tables.lock().await;
        if phone_taken(&tables, &identity.phone, None) {
            return Err(AppError::conflict("Phone number already registered"));
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let created = Identity {
            id: tables.next_user_id,
            phone: identity.phone,
            password_hash: identity.password_hash,
            password_salt: identity.password_salt,
            role: identity.role,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            last_visited_at: None,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn update_password(&self, id: i64, password_hash: &str, salt: &[u8]) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let user = active_mut(&mut tables, id)?;
        user.password_hash = password_hash.to_string();
        user.password_salt = salt.to_vec();
        user.updated_at = Utc::now();
        tables.revoke_subject(id);
        Ok(())
    }

    async fn update_phone(&self, id: i64, phone: &str) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if phone_taken(&tables, phone, Some(id)) {
            return Err(AppError::conflict("Phone number already registered"));
        }
        let user = active_mut(&mut tables, id)?;
        user.phone = phone.to_string();
        user.updated_at = Utc::now();
        tables.revoke_subject(id);
        Ok(())
    }

    async fn change_role(&self, id: i64, role: Role) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let user = active_mut(&mut tables, id)?;
        user.role = role;
        user.updated_at = Utc::now();
        tables.revoke_subject(id);
        Ok(())
    }

    async fn soft_delete(&self, id: i64) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let user = active_mut(&mut tables, id)?;
        let now = Utc::now();
        user.deleted_at = Some(now);
        user.updated_at = now;
        tables.revoke_subject(id);
        Ok(())
    }

    async fn dig_up(&self, id: i64) -> AppResult<Identity> {
        let mut tables = self.tables.lock().await;
        let phone = tables
            .users
            .iter()
            .find(|u| u.id == id && u.is_deleted())
            .map(|u| u.phone.clone())
            .ok_or_else(|| AppError::not_found(format!("Deleted user {id} not found")))?;

        if phone_taken(&tables, &phone, Some(id)) {
            return Err(AppError::conflict(
                "Phone number is held by another active user",
            ));
        }

        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found(format!("Deleted user {id} not found")))?;
        user.deleted_at = None;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn touch_last_visit(&self, id: i64) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.last_visited_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn list(&self, page: PageRequest) -> AppResult<PageResponse<Identity>> {
        let tables = self.tables.lock().await;
        let mut active: Vec<&Identity> = tables.users.iter().filter(|u| !u.is_deleted()).collect();
        active.sort_by_key(|u| u.id);

        let total = active.len() as i64;
        let items = active
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();
        Ok(PageResponse::new(items, total))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
