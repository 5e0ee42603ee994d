//! Application factory: profile -> CORS -> CSRF -> persistence -> sessions -> routing groups
//! -> template globals -> error handlers.

use crate::config::{process_env, profile_name, ConfigRegistry, Settings};
use crate::csrf::csrf_protect;
use crate::db::{init_pool, Persistence};
use crate::error::{internal_error_response, not_found_response, AppError, ConfigError};
use crate::routes::{api_blueprint, auth_blueprint, main_blueprint, prediction_blueprint, Blueprint};
use crate::session::{LoginManager, SessionStore};
use crate::state::AppState;
use crate::templates::TemplateGlobals;
use axum::{
    http::HeaderValue,
    middleware,
    response::Response,
    Router,
};
use sqlx::PgPool;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// A fully wired application instance. Owns its settings, sessions and stores.
pub struct App {
    state: AppState,
    blueprints: Vec<Blueprint>,
    pool: Option<PgPool>,
}

/// Build an application for `config_name`, else `APP_ENV`, else development,
/// backed by PostgreSQL. Must be called inside a tokio runtime.
pub fn create_app(config_name: Option<&str>) -> Result<App, AppError> {
    let name = profile_name(config_name, process_env);
    let settings = ConfigRegistry::standard().select(&name, process_env)?;
    let pool = init_pool(&settings)?;
    App::with_persistence(settings, Persistence::postgres(pool))
}

impl App {
    pub fn with_persistence(settings: Settings, persistence: Persistence) -> Result<Self, AppError> {
        if settings.uses_default_secret() && !settings.debug {
            tracing::warn!(profile = %settings.profile, "SECRET_KEY is not set; using the insecure default");
        }
        let state = AppState {
            settings: Arc::new(settings),
            users: persistence.users,
            predictions: persistence.predictions,
            sessions: SessionStore::new(),
            login_manager: Arc::new(LoginManager::default()),
            globals: TemplateGlobals::default(),
        };
        let mut app = App {
            state,
            blueprints: Vec::with_capacity(4),
            pool: persistence.pool,
        };
        app.register_blueprint(auth_blueprint())?;
        app.register_blueprint(main_blueprint())?;
        app.register_blueprint(prediction_blueprint())?;
        app.register_blueprint(api_blueprint())?;
        tracing::info!(
            profile = %app.state.settings.profile,
            debug = app.state.settings.debug,
            testing = app.state.settings.testing,
            "application created"
        );
        Ok(app)
    }

    /// Names and prefixes must be unique across groups.
    pub fn register_blueprint(&mut self, blueprint: Blueprint) -> Result<(), AppError> {
        if let Some(existing) = self
            .blueprints
            .iter()
            .find(|b| b.name == blueprint.name || b.url_prefix == blueprint.url_prefix)
        {
            return Err(ConfigError::DuplicateBlueprint(format!(
                "{} ({}) conflicts with {} ({})",
                blueprint.name, blueprint.url_prefix, existing.name, existing.url_prefix
            ))
            .into());
        }
        tracing::debug!(name = blueprint.name, prefix = blueprint.url_prefix, "routing group registered");
        self.blueprints.push(blueprint);
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    /// Mutable settings of this instance only. Takes effect for routers built afterwards.
    pub fn settings_mut(&mut self) -> &mut Settings {
        Arc::make_mut(&mut self.state.settings)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Database pool bound by the persistence initializer, if PostgreSQL-backed.
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    pub fn blueprints(&self) -> &[Blueprint] {
        &self.blueprints
    }

    pub fn router(&self) -> Router {
        self.router_with(Router::new())
    }

    /// Router with `extra` routes merged at the root, covered by the same middleware and error handlers.
    /// CSRF applies to matched routes only; unknown paths reach the 404 fallback for every method.
    pub fn router_with(&self, extra: Router<AppState>) -> Router {
        let mut router = Router::new();
        for bp in &self.blueprints {
            router = if bp.is_root() {
                router.merge(bp.router.clone())
            } else {
                router.nest(bp.url_prefix, bp.router.clone())
            };
        }
        router
            .merge(extra)
            .route_layer(middleware::from_fn_with_state(self.state.clone(), csrf_protect))
            .fallback(not_found)
            .layer(cors_layer(&self.state.settings))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    pub fn into_router(self) -> Router {
        self.router()
    }
}

async fn not_found() -> Response {
    not_found_response()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "handler panicked");
    internal_error_response()
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(cors::Any)
        .allow_headers(cors::Any);
    if settings.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(cors::Any);
    }
    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::Blueprint;

    fn testing_app() -> App {
        let settings = ConfigRegistry::standard().select("testing", |_| None).unwrap();
        App::with_persistence(settings, Persistence::in_memory()).unwrap()
    }

    #[test]
    fn registers_four_disjoint_groups() {
        let app = testing_app();
        let names: Vec<_> = app.blueprints().iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["auth", "main", "prediction", "api"]);
        let mut prefixes: Vec<_> = app.blueprints().iter().map(|b| b.url_prefix).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), 4);
    }

    #[test]
    fn duplicate_group_is_rejected() {
        let mut app = testing_app();
        let err = app
            .register_blueprint(Blueprint::new("api", "/v2", Router::new()))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::DuplicateBlueprint(_))));
        let err = app
            .register_blueprint(Blueprint::new("other", "/auth", Router::new()))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::DuplicateBlueprint(_))));
    }

    #[test]
    fn panic_payload_becomes_internal_error() {
        let resp = handle_panic(Box::new("boom"));
        assert_eq!(resp.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
