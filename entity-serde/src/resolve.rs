//! Field resolution engine.
//!
//! Walks an entity's [`EntitySchema`] in declaration order to turn a field
//! map into a tagged blob, to rebuild a field map from a blob (applying
//! schema-evolution fallbacks), and to validate a field map before it becomes
//! a typed entity.

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::schema::{EntitySchema, Field};
use crate::tag::Tagger;
use crate::untag::Untagger;
use crate::value::{Map, Value};
use serde_json::{Map as JsonMap, Value as JsonValue};

static NULL: Value = Value::Null;

/// Outcome of looking a field up in an incoming blob.
enum Resolved<'b> {
    /// The blob carries a value for the field.
    Present(&'b JsonValue),
    /// Absent, filled in from the declared default or factory.
    Default(Value),
    /// Absent from an optional field.
    Null,
    /// Absent with no way to fill it in.
    Missing,
}

impl<'b> Resolved<'b> {
    fn lookup(field: &Field, blob: &'b JsonMap<String, JsonValue>) -> Self {
        match blob.get(field.name()) {
            Some(raw) => Self::Present(raw),
            None if field.is_optional() => Self::Null,
            None => field.resolve_default().map_or(Self::Missing, Self::Default),
        }
    }
}

/// Checks codec pairing, then null-ness and contracts of a field map, field
/// by field.
///
/// Absent keys count as null.
pub fn check_fields(schema: &EntitySchema, fields: &Map) -> Result<()> {
    schema.check()?;
    for field in schema.fields() {
        let value = fields.get(field.name()).unwrap_or(&NULL);
        if value.is_null() && !field.is_optional() {
            return Err(Error::NotOptional {
                field: field.name().to_string(),
                entity: schema.entity().to_string(),
            });
        }
        if !field.satisfies_contract(value) {
            return Err(Error::ContractViolation {
                field: field.name().to_string(),
                entity: schema.entity().to_string(),
            });
        }
    }
    Ok(())
}

/// Validates a complete field map and converts it into `T`.
pub fn build<T: Entity>(fields: Map) -> Result<T> {
    check_fields(T::schema(), &fields)?;
    T::from_fields(fields)
}

/// Builds `T` from keyword arguments, filling absent fields from their
/// defaults.
pub fn construct<T: Entity>(mut kwargs: Map) -> Result<T> {
    let schema = T::schema();
    if let Some(unknown) = kwargs.keys().find(|name| schema.get(name).is_none()) {
        return Err(Error::UnexpectedArgument {
            field: unknown.clone(),
            entity: schema.entity().to_string(),
        });
    }
    let mut fields = Map::new();
    for field in schema.fields() {
        let value = match kwargs.remove(field.name()) {
            Some(value) => value,
            None => field.resolve_default().ok_or_else(|| Error::MissingArgument {
                field: field.name().to_string(),
                entity: schema.entity().to_string(),
            })?,
        };
        fields.insert(field.name().to_string(), value);
    }
    build::<T>(fields)
}

/// Serializes a field map into a marked blob.
///
/// Contracts are not re-checked here; they held when the entity was built.
pub fn serialize_fields(
    tagger: &Tagger<'_>,
    schema: &EntitySchema,
    identifier: String,
    mut fields: Map,
) -> Result<JsonValue> {
    let mut blob = JsonMap::new();
    for field in schema.fields() {
        let mut value = fields.remove(field.name()).unwrap_or_default();
        if let Some(encode) = field.encoder() {
            field.check_codec(schema.entity())?;
            value = encode(value)?;
        }
        if value.is_null() && !field.is_optional() {
            return Err(Error::NotOptional {
                field: field.name().to_string(),
                entity: schema.entity().to_string(),
            });
        }
        blob.insert(field.name().to_string(), tagger.tag(&value)?);
    }
    blob.insert(tagger.marker().to_string(), JsonValue::String(identifier));
    Ok(JsonValue::Object(blob))
}

/// Rebuilds `T` from a marked blob.
///
/// The marker and any keys that are not declared fields are ignored.
pub fn deserialize_entity<T: Entity>(
    untagger: &Untagger<'_>,
    blob: &JsonMap<String, JsonValue>,
) -> Result<T> {
    let schema = T::schema();
    let mut fields = Map::new();
    for field in schema.fields() {
        let value = match Resolved::lookup(field, blob) {
            Resolved::Null => Value::Null,
            Resolved::Missing => {
                return Err(Error::UnknownValue {
                    field: field.name().to_string(),
                    entity: schema.entity().to_string(),
                });
            }
            Resolved::Present(raw) => decode(field, untagger.untag(raw)?)?,
            Resolved::Default(value) => decode(field, value)?,
        };
        fields.insert(field.name().to_string(), value);
    }
    build::<T>(fields)
}

fn decode(field: &Field, value: Value) -> Result<Value> {
    match field.decoder() {
        Some(decode) => decode(value),
        None => Ok(value),
    }
}
