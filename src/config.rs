//! Configuration types.

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;

/// Idle time after which an abandoned wizard is discarded.
pub const DEFAULT_WIZARD_IDLE: Duration = Duration::from_secs(30 * 60);

/// Connection details for the hosted identity and lead-storage backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public (anon) API key sent with every request.
    pub anon_key: SecretString,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: SecretString::from(anon_key.into()),
        }
    }

    /// Read the backend settings from the environment.
    ///
    /// Both the plain and the `VITE_`-prefixed names are accepted so the same
    /// `.env` file can serve the browser bundle and this service.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env_any(&["SUPABASE_URL", "VITE_SUPABASE_URL"])
            .ok_or_else(|| ConfigError::MissingEnvVar("SUPABASE_URL".to_string()))?;
        let key = env_any(&["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"])
            .ok_or_else(|| ConfigError::MissingEnvVar("SUPABASE_ANON_KEY".to_string()))?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "SUPABASE_URL".to_string(),
                message: format!("expected an http(s) URL, got {url:?}"),
            });
        }

        Ok(Self::new(url, key))
    }

    /// An empty URL or key makes every backend call fail permanently.
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.anon_key.expose_secret().is_empty()
    }
}

/// Delays for the timed UI transitions.
#[derive(Debug, Clone, Copy)]
pub struct UiTimings {
    /// After a reset link is sent, the auth modal returns to sign-in.
    pub reset_return_delay: Duration,
    /// After a successful sign-in/up, the auth modal closes.
    pub success_close_delay: Duration,
    /// After a successful inquiry, the contact form status returns to idle.
    pub contact_status_reset: Duration,
}

impl Default for UiTimings {
    fn default() -> Self {
        Self {
            reset_return_delay: Duration::from_secs(3),
            success_close_delay: Duration::from_secs(1),
            contact_status_reset: Duration::from_secs(5),
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub backend: BackendConfig,
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Allowed CORS origin for the browser front-end (None = any).
    pub allowed_origin: Option<String>,
    /// Wizards untouched for this long are discarded.
    pub wizard_idle: Duration,
}

impl SiteConfig {
    /// Load the full service configuration. Missing backend settings are fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = BackendConfig::from_env()?;

        let port: u16 = match std::env::var("AGENT_STUDIO_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "AGENT_STUDIO_PORT".to_string(),
                message: format!("not a port number: {raw:?}"),
            })?,
            Err(_) => 8080,
        };

        let allowed_origin = std::env::var("AGENT_STUDIO_ALLOWED_ORIGIN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let wizard_idle = match std::env::var("AGENT_STUDIO_WIZARD_IDLE_SECS") {
            Ok(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "AGENT_STUDIO_WIZARD_IDLE_SECS".to_string(),
                        message: format!("not a positive number of seconds: {raw:?}"),
                    });
                }
            },
            Err(_) => DEFAULT_WIZARD_IDLE,
        };

        Ok(Self {
            backend,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            allowed_origin,
            wizard_idle,
        })
    }
}

fn env_any(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
