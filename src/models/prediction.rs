//! Queued prediction requests. Status is advanced by the prediction engine, outside this crate.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};
use std::sync::{Arc, RwLock};

pub const STATUS_PENDING: &str = "pending";

#[derive(Clone, Debug, Serialize)]
pub struct PredictionRequest {
    pub id: String,
    pub user_id: String,
    pub coin_id: String,
    pub horizon_days: u32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewPredictionRequest {
    pub user_id: String,
    pub coin_id: String,
    pub horizon_days: u32,
}

#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn create(&self, req: NewPredictionRequest) -> Result<PredictionRequest, AppError>;
    /// Newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PredictionRequest>, AppError>;
    async fn count_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<u64, AppError>;
    /// Insert only while the user has fewer than `limit` requests since `since`.
    /// The count and the insert are atomic per user; `None` means the limit was reached.
    async fn create_within_limit(
        &self,
        req: NewPredictionRequest,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Option<PredictionRequest>, AppError>;
}

/// UTC day containing `now`: (start, next midnight).
pub fn quota_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

type PredictionRow = (String, String, String, i32, String, DateTime<Utc>);

fn request_from_row(
    (id, user_id, coin_id, horizon_days, status, created_at): PredictionRow,
) -> PredictionRequest {
    PredictionRequest {
        id,
        user_id,
        coin_id,
        horizon_days: horizon_days.max(0) as u32,
        status,
        created_at,
    }
}

async fn insert_request<'e, E: PgExecutor<'e>>(
    executor: E,
    req: &NewPredictionRequest,
) -> Result<PredictionRequest, AppError> {
    let horizon = i32::try_from(req.horizon_days)
        .map_err(|_| AppError::Validation("horizon_days out of range".into()))?;
    let row: PredictionRow = sqlx::query_as(
        r#"
        INSERT INTO prediction_requests (id, user_id, coin_id, horizon_days, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, coin_id, horizon_days, status, created_at
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&req.user_id)
    .bind(&req.coin_id)
    .bind(horizon)
    .bind(STATUS_PENDING)
    .fetch_one(executor)
    .await?;
    Ok(request_from_row(row))
}

async fn count_requests<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<u64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM prediction_requests WHERE user_id = $1 AND created_at >= $2",
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(executor)
    .await?;
    Ok(count.max(0) as u64)
}

pub struct PgPredictionStore {
    pool: PgPool,
}

impl PgPredictionStore {
    pub fn new(pool: PgPool) -> Self {
        PgPredictionStore { pool }
    }
}

#[async_trait]
impl PredictionStore for PgPredictionStore {
    async fn create(&self, req: NewPredictionRequest) -> Result<PredictionRequest, AppError> {
        insert_request(&self.pool, &req).await
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PredictionRequest>, AppError> {
        let rows: Vec<PredictionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, coin_id, horizon_days, status, created_at
            FROM prediction_requests WHERE user_id = $1 ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(request_from_row).collect())
    }

    async fn count_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<u64, AppError> {
        count_requests(&self.pool, user_id, since).await
    }

    async fn create_within_limit(
        &self,
        req: NewPredictionRequest,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Option<PredictionRequest>, AppError> {
        let mut tx = self.pool.begin().await?;
        // Serializes submissions of one user until commit/rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
            .bind(&req.user_id)
            .execute(&mut *tx)
            .await?;
        let used = count_requests(&mut *tx, &req.user_id, since).await?;
        if used >= u64::from(limit) {
            tx.rollback().await?;
            return Ok(None);
        }
        let record = insert_request(&mut *tx, &req).await?;
        tx.commit().await?;
        Ok(Some(record))
    }
}

#[derive(Clone, Default)]
pub struct MemoryPredictionStore {
    rows: Arc<RwLock<Vec<PredictionRequest>>>,
}

impl MemoryPredictionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> AppError {
    AppError::Internal("store lock poisoned".into())
}

fn pending(req: NewPredictionRequest) -> PredictionRequest {
    PredictionRequest {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: req.user_id,
        coin_id: req.coin_id,
        horizon_days: req.horizon_days,
        status: STATUS_PENDING.into(),
        created_at: Utc::now(),
    }
}

#[async_trait]
impl PredictionStore for MemoryPredictionStore {
    async fn create(&self, req: NewPredictionRequest) -> Result<PredictionRequest, AppError> {
        let record = pending(req);
        self.rows
            .write()
            .map_err(|_| poisoned())?
            .push(record.clone());
        Ok(record)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PredictionRequest>, AppError> {
        let guard = self.rows.read().map_err(|_| poisoned())?;
        let mut out: Vec<_> = guard.iter().filter(|r| r.user_id == user_id).cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn count_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<u64, AppError> {
        let guard = self.rows.read().map_err(|_| poisoned())?;
        Ok(guard
            .iter()
            .filter(|r| r.user_id == user_id && r.created_at >= since)
            .count() as u64)
    }

    async fn create_within_limit(
        &self,
        req: NewPredictionRequest,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Option<PredictionRequest>, AppError> {
        let mut guard = self.rows.write().map_err(|_| poisoned())?;
        let used = guard
            .iter()
            .filter(|r| r.user_id == req.user_id && r.created_at >= since)
            .count();
        if used >= limit as usize {
            return Ok(None);
        }
        let record = pending(req);
        guard.push(record.clone());
        Ok(Some(record))
    }
}
