//! Routing groups. Each owns a disjoint URL namespace and is registered once by the factory.

pub mod api;
pub mod auth;
pub mod prediction;
pub mod site;

use crate::state::AppState;
use axum::Router;

pub use api::api_blueprint;
pub use auth::auth_blueprint;
pub use prediction::prediction_blueprint;
pub use site::main_blueprint;

/// A named group of routes mounted under `url_prefix` (`/` mounts at the root).
#[derive(Clone)]
pub struct Blueprint {
    pub name: &'static str,
    pub url_prefix: &'static str,
    pub router: Router<AppState>,
}

impl Blueprint {
    pub fn new(name: &'static str, url_prefix: &'static str, router: Router<AppState>) -> Self {
        Blueprint {
            name,
            url_prefix,
            router,
        }
    }

    pub fn is_root(&self) -> bool {
        self.url_prefix == "/"
    }
}
