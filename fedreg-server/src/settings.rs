//! Loading and validation of settings.
//!
//! Values defined in the configuration file can be overridden by environment
//! variables. An example configuration file can be found in the `configs/`
//! directory located in the repository root.

use std::{fmt, net::SocketAddr, path::Path};

use config::{Config, ConfigError, Environment};
use serde::{
    de::{self, Deserializer, Visitor},
    Deserialize,
};
use thiserror::Error;
use tracing_subscriber::filter::EnvFilter;

#[derive(Error, Debug)]
/// An error related to loading of settings.
pub enum SettingsError {
    #[error("configuration loading failed: {0}")]
    Loading(#[from] ConfigError),
}

#[derive(Debug, Deserialize)]
/// The combined settings.
///
/// Each section in the configuration file corresponds to the identically
/// named settings field.
pub struct Settings {
    pub api: ApiSettings,
    pub log: LoggingSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

impl Settings {
    /// Loads the settings from a configuration file, merged with
    /// `FEDREG_`-prefixed environment variables.
    ///
    /// # Errors
    /// Fails when the configuration file cannot be loaded or parsed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let mut config = Config::new();
        config.merge(config::File::from(path.as_ref()))?;
        config.merge(Environment::with_prefix("fedreg").separator("__"))?;
        Ok(config.try_into()?)
    }
}

#[derive(Debug, Deserialize, Clone)]
/// REST API settings.
pub struct ApiSettings {
    /// The address to which the REST API should be bound.
    ///
    /// # Examples
    ///
    /// **TOML**
    /// ```text
    /// [api]
    /// bind_address = "0.0.0.0:8081"
    /// # or
    /// bind_address = "127.0.0.1:8081"
    /// ```
    ///
    /// **Environment variable**
    /// ```text
    /// FEDREG_API__BIND_ADDRESS=127.0.0.1:8081
    /// ```
    pub bind_address: SocketAddr,
}

#[derive(Debug, Deserialize, Clone, Default)]
/// Authorization settings.
pub struct AuthSettings {
    /// The user identifiers that hold the admin role. Admins decide
    /// approvals and may delete records.
    ///
    /// # Examples
    ///
    /// **TOML**
    /// ```text
    /// [auth]
    /// admins = [1, 2]
    /// ```
    ///
    /// **Environment variable**
    /// ```text
    /// FEDREG_AUTH__ADMINS=[1, 2]
    /// ```
    #[serde(default)]
    pub admins: Vec<u64>,
}

#[derive(Debug, Deserialize)]
/// Logging settings.
pub struct LoggingSettings {
    /// A comma-separated list of logging directives.
    ///
    /// # Examples
    ///
    /// **TOML**
    /// ```text
    /// [log]
    /// filter = "info"
    /// ```
    ///
    /// **Environment variable**
    /// ```text
    /// FEDREG_LOG__FILTER=info
    /// ```
    #[serde(deserialize_with = "deserialize_env_filter")]
    pub filter: EnvFilter,
}

fn deserialize_env_filter<'de, D>(deserializer: D) -> Result<EnvFilter, D::Error>
where
    D: Deserializer<'de>,
{
    struct EnvFilterVisitor;

    impl<'de> Visitor<'de> for EnvFilterVisitor {
        type Value = EnvFilter;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            write!(formatter, "a valid tracing filter directive")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            EnvFilter::try_new(value)
                .map_err(|_| de::Error::invalid_value(serde::de::Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_str(EnvFilterVisitor)
}
