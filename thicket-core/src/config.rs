//! Configuration types for Thicket repositories

use crate::ids::{ContentHashIdGenerator, IdGenerator, SequentialIdGenerator, UuidIdGenerator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Main configuration for Thicket
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ThicketConfig {
    /// Repository behaviour
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Identifier generation
    #[serde(default)]
    pub ids: IdConfig,
}

/// Repository behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Number of id characters used in generated messages and detached labels
    pub short_id_length: usize,

    /// Entry limit used by `log_default`
    pub log_limit: usize,

    /// Message of the root commit created from initial data
    pub initial_message: String,

    /// Label used when a merge is requested without one
    pub merge_label: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            short_id_length: 7,
            log_limit: 10,
            initial_message: "Initial commit".to_string(),
            merge_label: "remote".to_string(),
        }
    }
}

/// Identifier generation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdConfig {
    /// Which generator to build
    pub strategy: IdStrategy,

    /// Prefix for sequential identifiers
    pub prefix: String,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            strategy: IdStrategy::Uuid,
            prefix: "c".to_string(),
        }
    }
}

/// Identifier generation strategy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Random v4 UUIDs
    #[default]
    Uuid,

    /// Prefixed monotonic counter
    Sequential,

    /// SHA-256 over commit content
    ContentHash,
}

impl IdConfig {
    /// Build the configured identifier generator
    pub fn build_generator(&self) -> Arc<dyn IdGenerator> {
        match self.strategy {
            IdStrategy::Uuid => Arc::new(UuidIdGenerator),
            IdStrategy::Sequential => Arc::new(SequentialIdGenerator::new(self.prefix.clone())),
            IdStrategy::ContentHash => Arc::new(ContentHashIdGenerator::new()),
        }
    }
}

/// Builder for ThicketConfig
pub struct ConfigBuilder {
    config: ThicketConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: ThicketConfig::default(),
        }
    }

    /// Set repository configuration
    pub fn repository(mut self, config: RepositoryConfig) -> Self {
        self.config.repository = config;
        self
    }

    /// Set identifier configuration
    pub fn ids(mut self, config: IdConfig) -> Self {
        self.config.ids = config;
        self
    }

    /// Set the short id length
    pub fn short_id_length(mut self, length: usize) -> Self {
        self.config.repository.short_id_length = length;
        self
    }

    /// Use sequential identifiers with the given prefix
    pub fn sequential_ids(mut self, prefix: impl Into<String>) -> Self {
        self.config.ids = IdConfig {
            strategy: IdStrategy::Sequential,
            prefix: prefix.into(),
        };
        self
    }

    /// Build the configuration
    pub fn build(self) -> ThicketConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ThicketConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. Configuration file (thicket.toml)
    /// 3. Environment variable overrides (`THICKET_REPOSITORY__LOG_LIMIT=20`)
    /// 4. File named by THICKET_CONFIG_PATH, if set
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source is invalid.
    pub fn load() -> crate::error::Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(ThicketConfig::default()))
            .merge(Toml::file("thicket.toml"))
            .merge(Env::prefixed("THICKET_").ignore(&["CONFIG_PATH"]).split("__"));

        if let Ok(path) = std::env::var("THICKET_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: ThicketConfig = figment.extract().map_err(|e| {
            crate::error::ThicketError::Configuration(format!(
                "Failed to load configuration: {}",
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Serialized, Toml},
        };

        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::error::ThicketError::Configuration(format!(
                "Configuration file '{}' does not exist",
                path.display()
            )));
        }

        let config: ThicketConfig = Figment::from(Serialized::defaults(ThicketConfig::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| {
                crate::error::ThicketError::Configuration(format!(
                    "Failed to load configuration file: {}",
                    e
                ))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.repository.short_id_length == 0 {
            return Err(crate::error::ThicketError::Configuration(
                "repository.short_id_length must be greater than zero".to_string(),
            ));
        }

        if self.ids.strategy == IdStrategy::Sequential && self.ids.prefix.is_empty() {
            return Err(crate::error::ThicketError::Configuration(
                "ids.prefix must not be empty for sequential ids".to_string(),
            ));
        }

        Ok(())
    }
}
