/// Postgres-backed stores
///
/// Plain queries with positional binds; rows come back as tuples and are
/// assembled into domain types here. Expected schema:
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     name TEXT NOT NULL,
///     email TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     role TEXT NOT NULL,
///     detail JSONB
/// );
/// CREATE TABLE permissions (
///     name TEXT PRIMARY KEY,
///     permissions TEXT[] NOT NULL
/// );
/// CREATE TABLE reset_requests (
///     id UUID PRIMARY KEY,
///     token TEXT NOT NULL,
///     expiration_date TIMESTAMPTZ NOT NULL,
///     used BOOLEAN NOT NULL,
///     username TEXT NOT NULL
/// );
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{PermissionSet, ResetCredential, User};
use crate::error::AppError;
use crate::store::{PermissionStore, ResetStore, UserStore};

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type UserRow = (
    Uuid,
    String,
    String,
    String,
    String,
    Option<serde_json::Value>,
);

fn user_from_row(row: UserRow) -> User {
    User {
        id: row.0,
        name: row.1,
        email: row.2,
        password_hash: row.3,
        role: row.4,
        detail: row.5,
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, detail)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(&user.detail)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password_hash, role, detail FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password_hash, role, detail FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("user".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("user".to_string()));
        }
        Ok(())
    }
}

pub struct PgPermissionStore {
    pool: PgPool,
}

impl PgPermissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionStore for PgPermissionStore {
    async fn find_by_role(&self, role: &str) -> Result<Option<PermissionSet>, AppError> {
        let row = sqlx::query_as::<_, (String, Vec<String>)>(
            "SELECT name, permissions FROM permissions WHERE name = $1",
        )
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(name, permissions)| PermissionSet::new(name, permissions)))
    }
}

pub struct PgResetStore {
    pool: PgPool,
}

impl PgResetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetStore for PgResetStore {
    async fn insert(&self, credential: &ResetCredential) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO reset_requests (id, token, expiration_date, used, username)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(credential.id)
        .bind(&credential.token)
        .bind(credential.expiration_date)
        .bind(credential.used)
        .bind(&credential.username)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ResetCredential>, AppError> {
        let row = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>, bool, String)>(
            r#"
            SELECT id, token, expiration_date, used, username
            FROM reset_requests WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, token, expiration_date, used, username)| ResetCredential {
                id,
                token,
                expiration_date,
                used,
                username,
            },
        ))
    }

    async fn mark_used(&self, id: Uuid) -> Result<(), AppError> {
        // Conditional update: only the first consumer matches used = false.
        let result =
            sqlx::query("UPDATE reset_requests SET used = true WHERE id = $1 AND used = false")
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists =
            sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM reset_requests WHERE id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if exists.0 == 0 {
            Err(AppError::NotFound("reset credential".to_string()))
        } else {
            Err(AppError::AlreadyConsumed)
        }
    }
}
