//! PostgreSQL identity repository over the `users` table.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_core::types::pagination::{PageRequest, PageResponse};
use tokengate_entity::{Identity, NewIdentity, Role};

use super::{db_err, is_unique_violation};
use crate::store::IdentityRepository;

const COLUMNS: &str = "id, phone, password_hash, password_salt, role_id, \
                       created_at, updated_at, deleted_at, last_visited_at";

/// Identity repository backed by PostgreSQL.
///
/// Multi-statement mutations run in one transaction; an early return or a
/// dropped future rolls it back.
#[derive(Debug, Clone)]
pub struct PgIdentityRepository {
    pool: PgPool,
}

impl PgIdentityRepository {
    /// Create a new identity repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self, op: &str) -> AppResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| db_err(op, e))
    }

    /// Lock the active row for `id` or fail with `NotFound`.
    async fn lock_active(tx: &mut Transaction<'static, Postgres>, op: &str, id: i64) -> AppResult<()> {
        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 AND deleted_at IS NULL FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| db_err(op, e))?;

        locked
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    /// Null every refresh token of the subject inside `tx`.
    async fn revoke_tokens(tx: &mut Transaction<'static, Postgres>, op: &str, id: i64) -> AppResult<()> {
        sqlx::query("UPDATE user_tokens SET refresh_token = NULL WHERE user_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| db_err(op, e))?;
        Ok(())
    }

    fn expect_one(op: &str, rows: u64) -> AppResult<()> {
        if rows != 1 {
            return Err(AppError::internal(format!("{op}: update affected {rows} rows")));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityRepository for PgIdentityRepository {
    async fn phone_exists(&self, phone: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE phone = $1 AND deleted_at IS NULL)",
        )
        .bind(phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("PgIdentityRepository::phone_exists", e))
    }

    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<Identity>> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE phone = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Identity>(&query)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("PgIdentityRepository::find_by_phone", e))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Identity>> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Identity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("PgIdentityRepository::find_by_id", e))
    }

    async fn create(&self, identity: NewIdentity) -> AppResult<Identity> {
        let query = format!(
            "INSERT INTO users (phone, password_hash, password_salt, role_id) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Identity>(&query)
            .bind(&identity.phone)
            .bind(&identity.password_hash)
            .bind(&identity.password_salt)
            .bind(identity.role.id())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::conflict("Phone number already registered")
                } else {
                    db_err("PgIdentityRepository::create", e)
                }
            })
    }

    async fn update_password(&self, id: i64, password_hash: &str, salt: &[u8]) -> AppResult<()> {
        const OP: &str = "PgIdentityRepository::update_password";
        let mut tx = self.begin(OP).await?;
        Self::lock_active(&mut tx, OP, id).await?;

        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, password_salt = $2, updated_at = $3 \
             WHERE id = $4 AND deleted_at IS NULL",
        )
        .bind(password_hash)
        .bind(salt)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err(OP, e))?;
        Self::expect_one(OP, result.rows_affected())?;

        Self::revoke_tokens(&mut tx, OP, id).await?;
        tx.commit().await.map_err(|e| db_err(OP, e))
    }

    async fn update_phone(&self, id: i64, phone: &str) -> AppResult<()> {
        const OP: &str = "PgIdentityRepository::update_phone";
        let mut tx = self.begin(OP).await?;
        Self::lock_active(&mut tx, OP, id).await?;

        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE phone = $1 AND id <> $2 AND deleted_at IS NULL)",
        )
        .bind(phone)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_err(OP, e))?;
        if taken {
            return Err(AppError::conflict("Phone number already registered"));
        }

        let result = sqlx::query("UPDATE users SET phone = $1, updated_at = $2 WHERE id = $3")
            .bind(phone)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::conflict("Phone number already registered")
                } else {
                    db_err(OP, e)
                }
            })?;
        Self::expect_one(OP, result.rows_affected())?;

        Self::revoke_tokens(&mut tx, OP, id).await?;
        tx.commit().await.map_err(|e| db_err(OP, e))
    }

    async fn change_role(&self, id: i64, role: Role) -> AppResult<()> {
        const OP: &str = "PgIdentityRepository::change_role";
        let mut tx = self.begin(OP).await?;
        Self::lock_active(&mut tx, OP, id).await?;

        let result = sqlx::query("UPDATE users SET role_id = $1, updated_at = $2 WHERE id = $3")
            .bind(role.id())
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err(OP, e))?;
        Self::expect_one(OP, result.rows_affected())?;

        Self::revoke_tokens(&mut tx, OP, id).await?;
        tx.commit().await.map_err(|e| db_err(OP, e))
    }

    async fn soft_delete(&self, id: i64) -> AppResult<()> {
        const OP: &str = "PgIdentityRepository::soft_delete";
        let mut tx = self.begin(OP).await?;
        Self::lock_active(&mut tx, OP, id).await?;

        let now = Utc::now();
        let result = sqlx::query("UPDATE users SET deleted_at = $1, updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err(OP, e))?;
        Self::expect_one(OP, result.rows_affected())?;

        Self::revoke_tokens(&mut tx, OP, id).await?;
        tx.commit().await.map_err(|e| db_err(OP, e))
    }

    async fn dig_up(&self, id: i64) -> AppResult<Identity> {
        const OP: &str = "PgIdentityRepository::dig_up";
        let mut tx = self.begin(OP).await?;

        let phone: Option<String> = sqlx::query_scalar(
            "SELECT phone FROM users WHERE id = $1 AND deleted_at IS NOT NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_err(OP, e))?;
        let phone = phone.ok_or_else(|| AppError::not_found(format!("Deleted user {id} not found")))?;

        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE phone = $1 AND deleted_at IS NULL)",
        )
        .bind(&phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_err(OP, e))?;
        if taken {
            return Err(AppError::conflict(
                "Phone number is held by another active user",
            ));
        }

        let query = format!(
            "UPDATE users SET deleted_at = NULL, updated_at = $1 WHERE id = $2 RETURNING {COLUMNS}"
        );
        let identity = sqlx::query_as::<_, Identity>(&query)
            .bind(Utc::now())
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_err(OP, e))?;

        tx.commit().await.map_err(|e| db_err(OP, e))?;
        Ok(identity)
    }

    async fn touch_last_visit(&self, id: i64) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_visited_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("PgIdentityRepository::touch_last_visit", e))?;
        Ok(())
    }

    async fn list(&self, page: PageRequest) -> AppResult<PageResponse<Identity>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_err("PgIdentityRepository::list", e))?;

        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE deleted_at IS NULL ORDER BY id LIMIT $1 OFFSET $2"
        );
        let identities = sqlx::query_as::<_, Identity>(&query)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_err("PgIdentityRepository::list", e))?;

        Ok(PageResponse::new(identities, total))
    }

    async fn health_check(&self) -> AppResult<bool> {
        let one: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_err("PgIdentityRepository::health_check", e))?;
        Ok(one == 1)
    }
}
