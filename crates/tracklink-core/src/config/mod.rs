//! Configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files layered with `TRACKLINK__*` environment variables. Each
//! sub-module is one logical section.

pub mod link;
pub mod logging;
pub mod session;

use serde::{Deserialize, Serialize};

use self::link::LinkConfig;
use self::logging::LoggingConfig;
use self::session::{SessionConfig, SubscriptionConfig};

use crate::error::AppError;

/// Root configuration.
///
/// Top-level deserialization target for the merged configuration
/// (default file + environment overlay + environment variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Realtime connection settings.
    #[serde(default)]
    pub link: LinkConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Session (cookie) settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Topics tracked at startup by the agent.
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionConfig>,
}

impl AppConfig {
    /// Load configuration for an environment.
    ///
    /// Merges `config/default` with `config/{env}` and environment variables
    /// such as `TRACKLINK__LINK__URL` (nested keys separated by `__`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::build(
            config::Config::builder()
                .add_source(config::File::with_name("config/default").required(false))
                .add_source(config::File::with_name(&format!("config/{env}")).required(false)),
        )
    }

    /// Load configuration from an explicit file, still honoring environment
    /// variable overrides.
    pub fn load_from(path: &str) -> Result<Self, AppError> {
        Self::build(config::Config::builder().add_source(config::File::with_name(path)))
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, AppError> {
        let config = builder
            .add_source(
                config::Environment::with_prefix("TRACKLINK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        tracing::debug!(
            subscriptions = loaded.subscriptions.len(),
            cookies = loaded.session.cookies.len(),
            "Configuration loaded"
        );
        Ok(loaded)
    }
}
