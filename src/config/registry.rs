//! Profile registry: fixed mapping from profile name to settings, selected once at startup.

use crate::config::settings::{Settings, TESTING_DATABASE_URL};
use crate::error::ConfigError;
use std::collections::HashMap;

/// Environment variable naming the active profile.
pub const PROFILE_ENV_VAR: &str = "APP_ENV";
/// Profile used when neither the caller nor the environment names one.
pub const FALLBACK_PROFILE: &str = "development";

/// The concrete profile definitions. Several registry names may point at one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileKind {
    Development,
    Production,
    Testing,
}

impl ProfileKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProfileKind::Development => "development",
            ProfileKind::Production => "production",
            ProfileKind::Testing => "testing",
        }
    }

    fn build(&self) -> Settings {
        let mut s = Settings::base(self.name());
        match self {
            ProfileKind::Development => {
                s.debug = true;
                s.bind_addr = "0.0.0.0:5000".into();
            }
            ProfileKind::Production => {
                s.session_cookie_secure = true;
            }
            ProfileKind::Testing => {
                s.debug = true;
                s.testing = true;
                s.database_url = TESTING_DATABASE_URL.into();
            }
        }
        s
    }
}

#[derive(Clone, Debug)]
pub struct ConfigRegistry {
    by_name: HashMap<&'static str, ProfileKind>,
}

impl ConfigRegistry {
    /// development, production, testing, and `default` (= development).
    pub fn standard() -> Self {
        let by_name = HashMap::from([
            ("development", ProfileKind::Development),
            ("production", ProfileKind::Production),
            ("testing", ProfileKind::Testing),
            ("default", ProfileKind::Development),
        ]);
        ConfigRegistry { by_name }
    }

    pub fn get(&self, name: &str) -> Option<ProfileKind> {
        self.by_name.get(name).copied()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.by_name.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Build the settings for `name`, applying overrides from `env`. Unknown names fail.
    pub fn select<F>(&self, name: &str, env: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = self
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))?;
        let mut settings = kind.build();
        apply_env(&mut settings, kind, &env)?;
        Ok(settings)
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Explicit name, else `APP_ENV`, else development.
pub fn profile_name<F>(explicit: Option<&str>, env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .map(str::to_string)
        .or_else(|| non_empty(env(PROFILE_ENV_VAR)))
        .unwrap_or_else(|| FALLBACK_PROFILE.to_string())
}

/// Lookup against the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn apply_env<F>(settings: &mut Settings, kind: ProfileKind, env: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = non_empty(env("SECRET_KEY")) {
        settings.secret_key = key;
    }
    // Testing always targets its own database.
    if kind != ProfileKind::Testing {
        if let Some(url) = non_empty(env("DATABASE_URL")) {
            settings.database_url = url;
        }
    }
    if let Some(addr) = non_empty(env("BIND_ADDR")) {
        addr.parse::<std::net::SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                message: e.to_string(),
            })?;
        settings.bind_addr = addr;
    }
    if let Some(origins) = non_empty(env("CORS_ORIGINS")) {
        settings.cors_origins = origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{SameSite, DEFAULT_DATABASE_URL, DEFAULT_SECRET_KEY};

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn production_profile_literals() {
        let s = ConfigRegistry::standard().select("production", no_env).unwrap();
        assert!(!s.debug);
        assert!(!s.testing);
        assert!(s.session_cookie_secure);
        assert!(s.session_cookie_httponly);
        assert_eq!(s.session_cookie_samesite, SameSite::Lax);
    }

    #[test]
    fn testing_profile_uses_test_database() {
        let env = |k: &str| (k == "DATABASE_URL").then(|| "postgres://elsewhere/db".to_string());
        let s = ConfigRegistry::standard().select("testing", env).unwrap();
        assert!(s.debug);
        assert!(s.testing);
        assert!(s.database_url.ends_with("_test"));
    }

    #[test]
    fn default_matches_development() {
        let reg = ConfigRegistry::standard();
        let d = reg.select("default", no_env).unwrap();
        let dev = reg.select("development", no_env).unwrap();
        assert_eq!(d.profile, "development");
        assert_eq!(d.debug, dev.debug);
        assert_eq!(d.testing, dev.testing);
        assert_eq!(d.database_url, dev.database_url);
        assert_eq!(d.session_cookie_secure, dev.session_cookie_secure);
        assert_eq!(d.bind_addr, dev.bind_addr);
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let err = ConfigRegistry::standard().select("staging", no_env).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile(name) if name == "staging"));
    }

    #[test]
    fn shared_constants_in_every_profile() {
        let reg = ConfigRegistry::standard();
        for name in reg.names() {
            let s = reg.select(name, no_env).unwrap();
            assert_eq!(s.coingecko_base_url, "https://api.coingecko.com/api/v3");
            assert_eq!(s.usd_to_inr, 83.12);
            assert_eq!(s.prediction_days, vec![1, 7, 30]);
            assert_eq!(s.max_predictions_per_day, 50);
            assert_eq!(s.permanent_session_lifetime, chrono::Duration::days(7));
        }
    }

    #[test]
    fn env_overrides_and_fallbacks() {
        let reg = ConfigRegistry::standard();
        let s = reg.select("development", no_env).unwrap();
        assert_eq!(s.secret_key, DEFAULT_SECRET_KEY);
        assert_eq!(s.database_url, DEFAULT_DATABASE_URL);

        let env = |k: &str| match k {
            "SECRET_KEY" => Some("s3cret".to_string()),
            "DATABASE_URL" => Some("postgres://db:5432/prod".to_string()),
            "CORS_ORIGINS" => Some("https://a.example, https://b.example".to_string()),
            _ => None,
        };
        let s = reg.select("production", env).unwrap();
        assert_eq!(s.secret_key, "s3cret");
        assert_eq!(s.database_url, "postgres://db:5432/prod");
        assert_eq!(s.cors_origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn empty_secret_key_falls_back() {
        let env = |k: &str| (k == "SECRET_KEY").then(String::new);
        let s = ConfigRegistry::standard().select("development", env).unwrap();
        assert!(s.uses_default_secret());
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let env = |k: &str| (k == "BIND_ADDR").then(|| "not-an-addr".to_string());
        let err = ConfigRegistry::standard().select("production", env).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BIND_ADDR", .. }));
    }

    #[test]
    fn profile_name_resolution_order() {
        assert_eq!(profile_name(Some("testing"), |_| Some("production".into())), "testing");
        assert_eq!(profile_name(None, |_| Some("production".into())), "production");
        assert_eq!(profile_name(None, no_env), "development");
        assert_eq!(profile_name(None, |_| Some("  ".into())), "development");
    }
}
