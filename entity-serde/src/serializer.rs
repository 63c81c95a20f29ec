//! Serializer facade binding a registry to a wire configuration.

use crate::config::SerializerConfig;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::resolve;
use crate::tag::Tagger;
use crate::untag::Untagger;
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;
use tracing::debug;

/// Entry point for tagging, untagging and entity (de)serialization.
///
/// A serializer borrows the registry it resolves identifiers against. Most
/// callers use [`Serializer::global`], which pairs the process-wide registry
/// with the default configuration.
#[derive(Debug, Clone)]
pub struct Serializer<'r> {
    registry: &'r Registry,
    config: SerializerConfig,
}

impl Serializer<'static> {
    pub fn global() -> &'static Serializer<'static> {
        static GLOBAL: OnceLock<Serializer<'static>> = OnceLock::new();
        GLOBAL.get_or_init(|| Serializer::new(Registry::global()))
    }
}

impl<'r> Serializer<'r> {
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_config(registry, SerializerConfig::default())
    }

    #[must_use]
    pub fn with_config(registry: &'r Registry, config: SerializerConfig) -> Self {
        Self { registry, config }
    }

    #[must_use]
    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    #[must_use]
    pub fn tagger(&self) -> Tagger<'_> {
        Tagger::new(&self.config.marker_key)
    }

    #[must_use]
    pub fn untagger(&self) -> Untagger<'_> {
        Untagger::new(&self.config.marker_key, self.registry)
    }

    pub fn tag(&self, value: &Value) -> Result<JsonValue> {
        self.tagger().tag(value)
    }

    pub fn untag(&self, blob: &JsonValue) -> Result<Value> {
        self.untagger().untag(blob)
    }

    // ================================================================
    // Entities
    // ================================================================

    /// Serializes an entity into a marked blob.
    pub fn serialize<T: Entity>(&self, entity: &T) -> Result<JsonValue> {
        self.tagger().tag_entity(entity)
    }

    /// Serializes a value that must hold an entity.
    pub fn serialize_value(&self, value: &Value) -> Result<JsonValue> {
        match value {
            Value::Entity(entity) => self.tagger().tag_entity(entity.as_dyn()),
            other => Err(Error::NotAnEntity(other.kind_name())),
        }
    }

    /// Rebuilds whatever the blob describes, dispatching on its marker.
    pub fn deserialize(&self, blob: &JsonValue) -> Result<Value> {
        self.untag(blob)
    }

    /// Rebuilds a `T` from a blob. The outer marker is not consulted, so a
    /// blob written by an older or renamed type still loads as `T`.
    pub fn deserialize_as<T: Entity>(&self, blob: &JsonValue) -> Result<T> {
        let Some(map) = blob.as_object() else {
            return Err(Error::TypeMismatch {
                expected: "object",
                found: json_kind(blob),
            });
        };
        debug!(entity = T::NAME, fields = map.len(), "deserializing entity");
        resolve::deserialize_entity::<T>(&self.untagger(), map)
    }

    /// Checks contracts, then that the entity survives a round trip through
    /// JSON text unchanged.
    pub fn validate<T: Entity>(&self, entity: &T) -> Result<()> {
        entity.validate_contracts()?;
        let text = self.to_json_string(entity)?;
        let restored: T = self.from_json_str(&text)?;
        if &restored != entity {
            return Err(Error::RoundTrip {
                entity: T::NAME.to_string(),
            });
        }
        Ok(())
    }

    // ================================================================
    // JSON text
    // ================================================================

    pub fn to_json_string<T: Entity>(&self, entity: &T) -> Result<String> {
        Ok(serde_json::to_string(&self.serialize(entity)?)?)
    }

    pub fn from_json_str<T: Entity>(&self, text: &str) -> Result<T> {
        let blob: JsonValue = serde_json::from_str(text)?;
        self.deserialize_as(&blob)
    }
}

fn json_kind(blob: &JsonValue) -> &'static str {
    match blob {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
