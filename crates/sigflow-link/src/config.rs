//! Linker configuration.
//!
//! Every field has a default matching the stock voice host script, so an
//! empty TOML document is a valid configuration:
//!
//! ```toml
//! values_marker = "//!VALUES"
//! code_marker = "//!CODE"
//! state_name = "state"
//! mix_left = "ll"
//! mix_right = "rr"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LinkError;

/// Marker replaced by the combined initial-values text.
pub const DEFAULT_VALUES_MARKER: &str = "//!VALUES";

/// Marker replaced by the combined per-voice code text.
pub const DEFAULT_CODE_MARKER: &str = "//!CODE";

/// Names the linker splices into the host template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkerConfig {
    /// Template marker for the values text.
    pub values_marker: String,
    /// Template marker for the code text.
    pub code_marker: String,
    /// Host array holding one state array per voice.
    pub state_name: String,
    /// Left mix accumulator.
    pub mix_left: String,
    /// Right mix accumulator.
    pub mix_right: String,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            values_marker: DEFAULT_VALUES_MARKER.to_string(),
            code_marker: DEFAULT_CODE_MARKER.to_string(),
            state_name: "state".to_string(),
            mix_left: "ll".to_string(),
            mix_right: "rr".to_string(),
        }
    }
}

impl LinkerConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, LinkError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LinkError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| LinkError::read_file(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "linker config loaded");
        Ok(config)
    }
}
