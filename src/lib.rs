//! CryptoScore: cryptocurrency prediction web service.

pub mod app;
pub mod config;
pub mod csrf;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod password;
pub mod response;
pub mod routes;
pub mod service;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod templates;

pub use app::{create_app, App};
pub use config::{profile_name, process_env, ConfigRegistry, ProfileKind, Settings};
pub use db::{ensure_database_exists, ensure_tables, init_pool, Persistence};
pub use error::{AppError, ConfigError};
pub use extractors::{load_user, CurrentUser, MaybeUser};
pub use state::AppState;
pub use telemetry::init_tracing;
