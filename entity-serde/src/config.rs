//! Serializer configuration, loadable from TOML.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default reserved key that carries kind tags and entity identifiers.
pub const MARKER_KEY: &str = "__ser__";

/// Key under which built-in kinds store their payload.
pub const PAYLOAD_KEY: &str = "value";

/// Wire-format settings of a [`Serializer`](crate::Serializer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializerConfig {
    #[serde(default = "default_marker_key")]
    pub marker_key: String,
}

fn default_marker_key() -> String {
    MARKER_KEY.to_string()
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            marker_key: default_marker_key(),
        }
    }
}

impl SerializerConfig {
    /// Uses a custom marker key.
    pub fn with_marker_key(marker_key: impl Into<String>) -> Result<Self> {
        let config = Self {
            marker_key: marker_key.into(),
        };
        config.check()?;
        Ok(config)
    }

    /// Parses a TOML document such as `marker_key = "$type"`. Missing keys
    /// take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    /// The marker must be non-empty and distinct from the payload key.
    pub fn check(&self) -> Result<()> {
        if self.marker_key.is_empty() || self.marker_key == PAYLOAD_KEY {
            return Err(Error::InvalidMarker(self.marker_key.clone()));
        }
        Ok(())
    }
}
