//! Application settings loading from glowlink.toml
//!
//! Settings cover the pieces of affiliate behaviour that operations may want to
//! tune without a rebuild: the public base URL used to compose shareable links,
//! the attribution window length, and the length of the random code suffix.
//! Every field has a default so the file is optional.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Application settings parsed from glowlink.toml
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Database connection string; `DATABASE_URL` in the environment wins over this
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Public storefront base URL used to build shareable product links
    #[serde(default = "default_share_base_url")]
    pub share_base_url: String,
    /// Trailing window, in days, within which a click can still earn attribution
    #[serde(default = "default_attribution_window_days")]
    pub attribution_window_days: i64,
    /// Length of the random hex suffix appended to link referral codes
    #[serde(default = "default_referral_suffix_len")]
    pub referral_suffix_len: usize,
}

fn default_database_url() -> String {
    "sqlite://data/glowlink.sqlite".to_string()
}

fn default_share_base_url() -> String {
    "https://shop.glowlink.example".to_string()
}

const fn default_attribution_window_days() -> i64 {
    7
}

const fn default_referral_suffix_len() -> usize {
    6
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            share_base_url: default_share_base_url(),
            attribution_window_days: default_attribution_window_days(),
            referral_suffix_len: default_referral_suffix_len(),
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read settings file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse glowlink.toml: {e}"),
    })
}

/// Loads settings from the default location (./glowlink.toml), falling back to
/// built-in defaults when the file does not exist.
pub fn load_or_default() -> Settings {
    match load_settings("glowlink.toml") {
        Ok(settings) => settings,
        Err(e) => {
            tracing::debug!("using default settings: {e}");
            Settings::default()
        }
    }
}
