//! Client configuration loaded from environment variables.
//!
//! Every setting has a default pointing at a local backend, so the client
//! starts with zero configuration during development.

use std::path::PathBuf;
use std::time::Duration;

use vitrine_shared::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_RECONNECT_INITIAL_SECS, DEFAULT_RECONNECT_MAX_SECS,
    DEFAULT_SESSION_MAX_AGE_SECS, DEFAULT_SOCKET_URL, DEFAULT_TYPING_TIMEOUT_SECS,
};
use vitrine_store::ClientSettings;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL, including the `/api` prefix.
    /// Env: `API_BASE_URL`
    pub api_base_url: String,

    /// Realtime socket endpoint.
    /// Env: `SOCKET_URL`
    pub socket_url: String,

    /// Directory holding the local database. `None` uses the platform
    /// data directory.
    /// Env: `DATA_DIR`
    pub data_dir: Option<PathBuf>,

    /// Stored sessions older than this are discarded on restore.
    /// Env: `SESSION_MAX_AGE_SECS`
    pub session_max_age: Duration,

    /// Env: `TYPING_TIMEOUT_SECS`
    pub typing_timeout: Duration,

    pub reconnect_initial: Duration,

    /// Env: `RECONNECT_MAX_SECS`
    pub reconnect_max: Duration,

    /// Used by `vitrine-watch` when no session is stored.
    /// Env: `VITRINE_EMAIL`, `VITRINE_PASSWORD`
    pub credentials: Option<Credentials>,
}

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            data_dir: None,
            session_max_age: Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECS),
            typing_timeout: Duration::from_secs(DEFAULT_TYPING_TIMEOUT_SECS),
            reconnect_initial: Duration::from_secs(DEFAULT_RECONNECT_INITIAL_SECS),
            reconnect_max: Duration::from_secs(DEFAULT_RECONNECT_MAX_SECS),
            credentials: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("API_BASE_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(url) = lookup("SOCKET_URL") {
            config.socket_url = url;
        }

        if let Some(dir) = lookup("DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        if let Some(secs) = parse_secs(&lookup, "SESSION_MAX_AGE_SECS") {
            config.session_max_age = secs;
        }

        if let Some(secs) = parse_secs(&lookup, "TYPING_TIMEOUT_SECS") {
            config.typing_timeout = secs;
        }

        if let Some(secs) = parse_secs(&lookup, "RECONNECT_MAX_SECS") {
            config.reconnect_max = secs.max(config.reconnect_initial);
        }

        if let (Some(email), Some(password)) = (lookup("VITRINE_EMAIL"), lookup("VITRINE_PASSWORD")) {
            config.credentials = Some(Credentials { email, password });
        }

        // RUST_LOG is read by tracing-subscriber's EnvFilter directly.

        config
    }

    /// Apply URL overrides saved in the local settings row.
    pub fn apply_settings(&mut self, settings: &ClientSettings) {
        if let Some(url) = &settings.api_base_url {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = &settings.socket_url {
            self.socket_url = url.clone();
        }
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            tracing::warn!(key, value = %raw, "Invalid duration, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> ClientConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_target_local_backend() {
        let config = config_from(&[]);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.socket_url, DEFAULT_SOCKET_URL);
        assert_eq!(config.session_max_age, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(config.typing_timeout, Duration::from_secs(5));
        assert!(config.credentials.is_none());
    }

    #[test]
    fn env_overrides() {
        let config = config_from(&[
            ("API_BASE_URL", "https://shop.example/api/"),
            ("DATA_DIR", "/tmp/vitrine"),
            ("SESSION_MAX_AGE_SECS", "60"),
            ("RECONNECT_MAX_SECS", "10"),
            ("VITRINE_EMAIL", "lea@example.com"),
            ("VITRINE_PASSWORD", "secret"),
        ]);
        assert_eq!(config.api_base_url, "https://shop.example/api");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/vitrine")));
        assert_eq!(config.session_max_age, Duration::from_secs(60));
        assert_eq!(config.reconnect_max, Duration::from_secs(10));
        assert_eq!(config.credentials.unwrap().email, "lea@example.com");
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = config_from(&[("TYPING_TIMEOUT_SECS", "soon"), ("SESSION_MAX_AGE_SECS", "0")]);
        assert_eq!(config.typing_timeout, Duration::from_secs(5));
        assert_eq!(config.session_max_age, Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECS));
    }

    #[test]
    fn stored_settings_override_urls() {
        let mut config = config_from(&[]);
        config.apply_settings(&ClientSettings {
            api_base_url: Some("http://10.0.0.2:5000/api".into()),
            socket_url: None,
            notifications_enabled: true,
        });
        assert_eq!(config.api_base_url, "http://10.0.0.2:5000/api");
        assert_eq!(config.socket_url, DEFAULT_SOCKET_URL);
    }
}
