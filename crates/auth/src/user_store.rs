//! Local user store backed by SQLite
//!
//! Users are never physically removed: withdrawal flips the `delyn`
//! soft-delete flag from `N` to `Y`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::{debug, error, info};

use crate::error::{AuthError, Result};
use crate::user::{NewUser, Sex, StoredUser};
use crate::user_store_trait::UserStore;

const USER_COLUMNS: &str = "user_id, password_hash, display_name, guardian_contact, birth_date, \
     lunar_birth, sex, is_elderly, delyn, first_login, push_token, created_at, updated_at";

/// Local user store backed by SQLite
#[derive(Debug, Clone)]
pub struct LocalUserStore {
    pool: SqlitePool,
}

impl LocalUserStore {
    /// Create a store on an existing pool
    ///
    /// Creates the users table if it doesn't exist.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub async fn in_memory() -> Result<Self> {
        Self::new(crate::db::memory_pool().await?).await
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                display_name TEXT NOT NULL,
                guardian_contact TEXT NOT NULL,
                birth_date TEXT NOT NULL,
                lunar_birth INTEGER NOT NULL DEFAULT 0,
                sex TEXT NOT NULL CHECK (sex IN ('male', 'female')),
                is_elderly INTEGER NOT NULL DEFAULT 0,
                delyn TEXT NOT NULL DEFAULT 'N' CHECK (delyn IN ('N', 'Y')),
                first_login INTEGER NOT NULL DEFAULT 0,
                push_token TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("failed to create users table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_users_push_token ON users(push_token) \
             WHERE push_token IS NOT NULL",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("failed to create index: {}", e)))?;

        debug!("user store schema initialized");
        Ok(())
    }

    async fn fetch_user(&self, user_id: &str, active_only: bool) -> Result<Option<StoredUser>> {
        let sql = if active_only {
            format!("SELECT {} FROM users WHERE user_id = ? AND delyn = 'N'", USER_COLUMNS)
        } else {
            format!("SELECT {} FROM users WHERE user_id = ?", USER_COLUMNS)
        };

        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::DatabaseError(format!("failed to query user: {}", e)))?;

        Ok(row.as_ref().map(row_to_user))
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_user(row: &SqliteRow) -> StoredUser {
    let sex: String = row.get("sex");
    let delyn: String = row.get("delyn");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    StoredUser {
        user_id: row.get("user_id"),
        password_hash: row.get("password_hash"),
        display_name: row.get("display_name"),
        guardian_contact: row.get("guardian_contact"),
        birth_date: row.get("birth_date"),
        lunar_birth: row.get("lunar_birth"),
        sex: Sex::parse(&sex).unwrap_or(Sex::Female),
        is_elderly: row.get("is_elderly"),
        active: delyn == "N",
        first_login: row.get("first_login"),
        push_token: row.get("push_token"),
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    }
}

#[async_trait]
impl UserStore for LocalUserStore {
    async fn create_user(&self, user: &NewUser, password_hash: &str) -> Result<StoredUser> {
        let now = Utc::now().to_rfc3339();

        // A withdrawn row with the same id is revived in place; an active
        // one makes the WHERE clause fail so nothing is returned.
        let sql = format!(
            r#"
            INSERT INTO users (user_id, password_hash, display_name, guardian_contact,
                               birth_date, lunar_birth, sex, is_elderly, delyn,
                               first_login, push_token, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'N', 0, NULL, ?, ?)
            ON CONFLICT (user_id) DO UPDATE SET
                password_hash = excluded.password_hash,
                display_name = excluded.display_name,
                guardian_contact = excluded.guardian_contact,
                birth_date = excluded.birth_date,
                lunar_birth = excluded.lunar_birth,
                sex = excluded.sex,
                is_elderly = excluded.is_elderly,
                delyn = 'N',
                first_login = 0,
                push_token = NULL,
                updated_at = excluded.updated_at
            WHERE users.delyn = 'Y'
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&user.user_id)
            .bind(password_hash)
            .bind(&user.display_name)
            .bind(&user.guardian_contact)
            .bind(&user.birth_date)
            .bind(user.lunar_birth.unwrap_or(false))
            .bind(user.sex.unwrap_or(Sex::Female).as_str())
            .bind(user.is_elderly)
            .bind(&now)
            .bind(&now)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(user_id = %user.user_id, error = %e, "failed to create user");
                AuthError::DatabaseError(format!("failed to create user: {}", e))
            })?;

        let stored = row
            .as_ref()
            .map(row_to_user)
            .ok_or_else(|| AuthError::Conflict(user.user_id.clone()))?;

        info!(user_id = %stored.user_id, "user registered");
        Ok(stored)
    }

    async fn get_active(&self, user_id: &str) -> Result<Option<StoredUser>> {
        self.fetch_user(user_id, true).await
    }

    async fn get_by_id(&self, user_id: &str) -> Result<Option<StoredUser>> {
        self.fetch_user(user_id, false).await
    }

    async fn mark_first_login(&self, user_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET first_login = 1, updated_at = ? \
             WHERE user_id = ? AND delyn = 'N' AND first_login = 0",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("failed to update first_login: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn withdraw(&self, user_id: &str) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AuthError::DatabaseError(format!("failed to begin transaction: {}", e)))?;

        let result = sqlx::query(
            "UPDATE users SET delyn = 'Y', updated_at = ? WHERE user_id = ? AND delyn = 'N'",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(user_id = %user_id, error = %e, "failed to withdraw user");
            AuthError::DatabaseError(format!("failed to withdraw user: {}", e))
        })?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| {
                AuthError::DatabaseError(format!("failed to roll back withdrawal: {}", e))
            })?;
            debug!(user_id = %user_id, "nothing to withdraw");
            return Ok(false);
        }

        tx.commit()
            .await
            .map_err(|e| AuthError::DatabaseError(format!("failed to commit withdrawal: {}", e)))?;

        info!(user_id = %user_id, "user withdrawn");
        Ok(true)
    }

    async fn set_role(&self, user_id: &str, is_elderly: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET is_elderly = ?, updated_at = ? WHERE user_id = ? AND delyn = 'N'",
        )
        .bind(is_elderly)
        .bind(Utc::now().to_rfc3339())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("failed to update role: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_push_token(&self, user_id: &str, token: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET push_token = ?, updated_at = ? WHERE user_id = ? AND delyn = 'N'",
        )
        .bind(token)
        .bind(Utc::now().to_rfc3339())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("failed to update push token: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn active_push_tokens(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT DISTINCT push_token FROM users \
             WHERE delyn = 'N' AND push_token IS NOT NULL AND push_token <> '' \
             ORDER BY push_token",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("failed to list push tokens: {}", e)))
    }
}
