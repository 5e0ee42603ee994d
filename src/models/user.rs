//! User records: PostgreSQL and in-memory stores.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Clone, Debug, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a user. The password is already hashed.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Cheap round-trip used by the readiness probe.
    async fn ping(&self) -> Result<(), AppError>;
    async fn get_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    /// Fails with `AppError::Conflict` when the username is taken.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;
}

type UserRow = (String, String, String, String, DateTime<Utc>);

fn user_from_row((id, username, email, password_hash, created_at): UserRow) -> User {
    User {
        id,
        username,
        email,
        password_hash,
        created_at,
    }
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        PgUserStore { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(&id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_optional(&self.pool)
        .await?;
        row.map(user_from_row)
            .ok_or_else(|| AppError::Conflict(format!("username already taken: {}", user.username)))
    }
}

/// Process-local user store for tests and database-less runs.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    by_id: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> AppError {
    AppError::Internal("store lock poisoned".into())
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let guard = self.by_id.read().map_err(|_| poisoned())?;
        Ok(guard.get(id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let guard = self.by_id.read().map_err(|_| poisoned())?;
        Ok(guard.values().find(|u| u.username == username).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut guard = self.by_id.write().map_err(|_| poisoned())?;
        if guard.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "username already taken: {}",
                user.username
            )));
        }
        let record = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }
}
