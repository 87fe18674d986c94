#![forbid(unsafe_code)]

//! Board configuration as data.
//!
//! Groups every tunable of the engine into one [`BoardConfig`] that can be
//! loaded from TOML or JSON.
//!
//! ```toml
//! [gate]
//! hysteresis_px = 8.0
//! min_interval_ms = 40
//!
//! [session]
//! settle_delay_ms = 200
//! append_on_unresolved_drop = false
//!
//! [reflow.transfer]
//! duration_ms = 350
//! easing = "ease_in_out"
//! ```
//!
//! Every field defaults to the engine's built-in constant, so
//! `BoardConfig::default()` and an empty file behave the same.

#[cfg(feature = "config-files")]
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::gate::GateConfig;
use crate::reflow::ReflowConfig;
use crate::resolver::ResolverConfig;
use crate::session::SessionConfig;

/// Upper bound for any configured duration.
const MAX_DURATION_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub resolver: ResolverConfig,
    pub gate: GateConfig,
    pub session: SessionConfig,
    pub reflow: ReflowConfig,
}

impl BoardConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters.
    ///
    /// Returns a list of problems. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !non_negative(self.resolver.header_dead_zone) {
            errors.push(format!(
                "resolver.header_dead_zone must be >= 0, got {}",
                self.resolver.header_dead_zone
            ));
        }

        if !non_negative(self.gate.hysteresis_px) {
            errors.push(format!(
                "gate.hysteresis_px must be >= 0, got {}",
                self.gate.hysteresis_px
            ));
        }
        if self.gate.min_interval_ms > MAX_DURATION_MS {
            errors.push(format!(
                "gate.min_interval_ms must be <= {MAX_DURATION_MS}, got {}",
                self.gate.min_interval_ms
            ));
        }

        if self.session.settle_delay_ms > MAX_DURATION_MS {
            errors.push(format!(
                "session.settle_delay_ms must be <= {MAX_DURATION_MS}, got {}",
                self.session.settle_delay_ms
            ));
        }
        if !non_negative(self.session.activation_distance) {
            errors.push(format!(
                "session.activation_distance must be >= 0, got {}",
                self.session.activation_distance
            ));
        }

        if !non_negative(self.reflow.min_delta_px) {
            errors.push(format!(
                "reflow.min_delta_px must be >= 0, got {}",
                self.reflow.min_delta_px
            ));
        }
        for (name, profile) in [
            ("reorder", self.reflow.reorder),
            ("transfer", self.reflow.transfer),
        ] {
            if profile.duration_ms == 0 || profile.duration_ms > MAX_DURATION_MS {
                errors.push(format!(
                    "reflow.{name}.duration_ms must be in 1..={MAX_DURATION_MS}, got {}",
                    profile.duration_ms
                ));
            }
        }

        errors
    }

    /// [`validate`](Self::validate) as a `Result`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

fn non_negative(value: f32) -> bool {
    value >= 0.0
}

/// Errors from loading or validating a [`BoardConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-files")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-files")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
