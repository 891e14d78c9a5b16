//! Server configuration.
//!
//! [`ArenaConfig`] bundles every layer's settings with `Default` values
//! for production. [`ServerSettings`] reads the few knobs that the
//! binary takes from the environment.

use std::time::Duration;

use skirmish_lobby::LobbyConfig;
use skirmish_match::MatchConfig;
use skirmish_session::SessionConfig;

use crate::SkirmishError;

/// Configuration for the orchestration service and its layers.
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    pub session: SessionConfig,
    pub lobby: LobbyConfig,
    pub matches: MatchConfig,

    /// How often the reaper sweeps idle matches and expired rooms.
    pub reap_interval: Duration,

    /// A connection that sends nothing for this long is closed.
    pub connection_idle_timeout: Duration,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            lobby: LobbyConfig::default(),
            matches: MatchConfig::default(),
            reap_interval: Duration::from_secs(60),
            connection_idle_timeout: Duration::from_secs(120),
        }
    }
}

/// Settings the `skirmish-server` binary reads from its environment.
///
/// | Variable        | Default   |
/// |-----------------|-----------|
/// | `HOST`          | `0.0.0.0` |
/// | `PORT`          | `3000`    |
/// | `ROUND_SECONDS` | unset (15)|
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub round_seconds: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            round_seconds: None,
        }
    }
}

impl ServerSettings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, SkirmishError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value if set.
    ///
    /// # Errors
    /// [`SkirmishError::Config`] if `PORT` or `ROUND_SECONDS` is set but
    /// not a valid number, or `ROUND_SECONDS` is zero.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SkirmishError> {
        let mut settings = Self::default();

        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            settings.host = host.trim().to_string();
        }
        if let Some(port) = lookup("PORT") {
            settings.port = port
                .trim()
                .parse()
                .map_err(|_| SkirmishError::Config(format!("PORT must be a port number, got {port:?}")))?;
        }
        if let Some(secs) = lookup("ROUND_SECONDS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                SkirmishError::Config(format!("ROUND_SECONDS must be a number, got {secs:?}"))
            })?;
            if secs == 0 {
                return Err(SkirmishError::Config("ROUND_SECONDS must be positive".into()));
            }
            settings.round_seconds = Some(secs);
        }
        Ok(settings)
    }

    /// `host:port`, ready for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Overrides the parts of `config` these settings control.
    pub fn apply(&self, config: &mut ArenaConfig) {
        if let Some(secs) = self.round_seconds {
            config.matches.round_duration = Duration::from_secs(secs);
        }
    }
}
