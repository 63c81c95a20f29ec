//! Tagged JSON serialization for typed entities.
//!
//! Entities are plain structs declared through [`entity!`]. Serializing one
//! produces a JSON object holding its fields plus a marker key (`__ser__` by
//! default) naming the entity type, so the blob can be turned back into the
//! same type later:
//! - [`Value`] is the closed set of field values the engine understands,
//!   including kinds plain JSON loses (tuples, sets, ordered maps, dates,
//!   decimals, type/function/module references, nested entities)
//! - [`Tagger`] and [`Untagger`] convert between [`Value`] and JSON blobs
//! - [`Registry`] resolves identifiers found in blobs back to entity types
//!   and functions
//! - [`Serializer`] ties a registry to a [`SerializerConfig`]
//!
//! Fields may carry defaults, default factories, `encode`/`decode` hooks and
//! contracts (see [`Field`]). Missing optional fields deserialize as null and
//! missing defaulted fields take their default, so blobs written by older
//! versions of a type keep loading.

mod config;
mod convert;
mod entity;
mod error;
mod macros;
mod partial;
mod reference;
mod registry;
mod resolve;
mod schema;
mod serializer;
mod tag;
mod untag;
mod value;

pub use config::{MARKER_KEY, PAYLOAD_KEY, SerializerConfig};
pub use convert::FieldValue;
pub use entity::{AnyEntity, Entity, EntityValue};
pub use error::{Error, ErrorKind, Result};
#[doc(hidden)]
pub use macros::__private;
pub use partial::{Partial, partial};
pub use reference::{Arguments, FunctionRef, ModuleRef, NativeFn, SCOPE_DELIMITER, TypeRef, qualify};
pub use registry::{EntityEntry, Registration, Registry, Symbol};
pub use schema::{EntitySchema, Field};
pub use serializer::Serializer;
pub use tag::{Tagger, kind};
pub use untag::Untagger;
pub use value::{DateTimeValue, Map, OrderedMap, Value, ValueSet};

use serde_json::Value as JsonValue;

/// Serializes an entity with the global serializer.
pub fn serialize<T: Entity>(entity: &T) -> Result<JsonValue> {
    Serializer::global().serialize(entity)
}

/// Rebuilds whatever a blob describes with the global serializer.
pub fn deserialize(blob: &JsonValue) -> Result<Value> {
    Serializer::global().deserialize(blob)
}

/// Rebuilds a `T` from a blob with the global serializer.
pub fn deserialize_as<T: Entity>(blob: &JsonValue) -> Result<T> {
    Serializer::global().deserialize_as(blob)
}

pub fn tag(value: &Value) -> Result<JsonValue> {
    Serializer::global().tag(value)
}

pub fn untag(blob: &JsonValue) -> Result<Value> {
    Serializer::global().untag(blob)
}

/// Checks contracts and the JSON round trip of an entity.
pub fn validate<T: Entity>(entity: &T) -> Result<()> {
    Serializer::global().validate(entity)
}

pub fn to_json_string<T: Entity>(entity: &T) -> Result<String> {
    Serializer::global().to_json_string(entity)
}

pub fn from_json_str<T: Entity>(text: &str) -> Result<T> {
    Serializer::global().from_json_str(text)
}
