//! Shared application state for all routing groups. One value per application instance.

use crate::config::Settings;
use crate::models::{PredictionStore, UserStore};
use crate::session::{LoginManager, SessionStore};
use crate::templates::TemplateGlobals;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub users: Arc<dyn UserStore>,
    pub predictions: Arc<dyn PredictionStore>,
    pub sessions: SessionStore,
    pub login_manager: Arc<LoginManager>,
    pub globals: TemplateGlobals,
}
