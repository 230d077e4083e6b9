//! Campaign-side configuration on top of [`SocietyConfig`].
//!
//! ```toml
//! season_days = 10
//!
//! [society.general]
//! log_level = "debug"
//!
//! [society.gossip]
//! rng_seed = 7
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use noble_core::SocietyError;
use noble_core::config::SocietyConfig;
use noble_core::error::Result;

/// Integration-layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Core simulation tuning.
    #[serde(default)]
    pub society: SocietyConfig,
    /// Days between seasonal prune summaries.
    #[serde(default = "default_season_days")]
    pub season_days: u32,
    /// Run the maintenance pass after each daily tick.
    #[serde(default = "default_true")]
    pub daily_maintenance: bool,
    /// Minimum |delta| of a relation change that ripples.
    #[serde(default = "default_ripple_threshold")]
    pub ripple_threshold: i32,
}

impl CampaignConfig {
    /// Load from a TOML string.
    ///
    /// # Errors
    /// Returns [`SocietyError::Config`] if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| SocietyError::Config(e.to_string()))
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            society: SocietyConfig::default(),
            season_days: default_season_days(),
            daily_maintenance: true,
            ripple_threshold: default_ripple_threshold(),
        }
    }
}

fn default_season_days() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_ripple_threshold() -> i32 {
    10
}
