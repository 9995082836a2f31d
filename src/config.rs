use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Base name of the optional config file (`redbus.toml`, `redbus.json`, …)
/// looked up in the working directory.
pub const CONFIG_BASENAME: &str = "redbus";

/// Prefix of environment overrides, e.g. `REDBUS_SOURCE=listings.db`.
pub const ENV_PREFIX: &str = "REDBUS";

pub const DEFAULT_TABLE: &str = "Red_Bus_Cleansed_Data";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Listings store; the extension picks the backend.
    pub source: PathBuf,
    /// Table queried when `source` is a SQLite database.
    pub table: String,
    /// Bars in the seat availability chart.
    pub top_n: usize,
    pub price_bins: usize,
    pub rating_bins: usize,
    /// Banner shown on the home page, if any.
    pub banner_image: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("redbus.db"),
            table: DEFAULT_TABLE.to_string(),
            top_n: 10,
            price_bins: 50,
            rating_bins: 10,
            banner_image: None,
        }
    }
}

impl DashboardConfig {
    /// Defaults, overlaid by `redbus.*` in the working directory (if present)
    /// and then by `REDBUS_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_BASENAME).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        settings.try_deserialize::<Self>()?.validated()
    }

    /// Same as [`DashboardConfig::load`] but with an explicit, required file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        settings.try_deserialize::<Self>()?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.price_bins == 0 || self.rating_bins == 0 {
            return Err(ConfigError::Invalid(
                "price_bins and rating_bins must be positive".to_string(),
            ));
        }
        if self.table.is_empty() || !self.table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
            return Err(ConfigError::Invalid(format!(
                "table name '{}' must be a plain identifier",
                self.table
            )));
        }
        Ok(self)
    }
}
