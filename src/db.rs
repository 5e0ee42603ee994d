//! Persistence initializer: binds a PostgreSQL pool and the stores built on it to an application instance.

use crate::config::Settings;
use crate::error::AppError;
use crate::models::{
    MemoryPredictionStore, MemoryUserStore, PgPredictionStore, PgUserStore, PredictionStore,
    UserStore,
};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::sync::Arc;

/// Stores an application instance reads and writes through.
#[derive(Clone)]
pub struct Persistence {
    pub users: Arc<dyn UserStore>,
    pub predictions: Arc<dyn PredictionStore>,
    /// Present when backed by PostgreSQL.
    pub pool: Option<PgPool>,
}

impl Persistence {
    pub fn postgres(pool: PgPool) -> Self {
        Persistence {
            users: Arc::new(PgUserStore::new(pool.clone())),
            predictions: Arc::new(PgPredictionStore::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Fresh, empty stores private to this value.
    pub fn in_memory() -> Self {
        Persistence {
            users: Arc::new(MemoryUserStore::new()),
            predictions: Arc::new(MemoryPredictionStore::new()),
            pool: None,
        }
    }
}

/// Build a lazily connecting pool for `settings.database_url`. Must run inside a tokio runtime;
/// no connection is opened until the first query.
pub fn init_pool(settings: &Settings) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_lazy(&settings.database_url)?;
    tracing::debug!(profile = %settings.profile, "database pool bound");
    Ok(pool)
}

/// Create application tables if missing.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), AppError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS prediction_requests (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            coin_id TEXT NOT NULL,
            horizon_days INTEGER NOT NULL,
            status TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS prediction_requests_user_created ON prediction_requests (user_id, created_at)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Create the target database when it does not exist yet, connecting through the `postgres` maintenance database.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let opts = connect_options(database_url)?;
    let db_name = match target_database(&opts) {
        Some(name) => name,
        None => return Ok(()),
    };
    let mut conn: sqlx::PgConnection = opts.database("postgres").connect().await?;
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&mut conn)
            .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn connect_options(database_url: &str) -> Result<PgConnectOptions, AppError> {
    PgConnectOptions::from_str(database_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))
}

/// Database the URL points at, unless it is absent or the maintenance database itself.
fn target_database(opts: &PgConnectOptions) -> Option<String> {
    opts.get_database()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "postgres")
        .map(str::to_string)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
