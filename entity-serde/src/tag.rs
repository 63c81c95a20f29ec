//! Value tagging: [`Value`] to JSON blob.
//!
//! Kinds that plain JSON cannot tell apart (tuples, sets, ordered maps,
//! dates, decimals, references and entities) are written as mappings
//! carrying the marker key. Everything else maps onto its JSON shape.

use crate::config::PAYLOAD_KEY;
use crate::entity::AnyEntity;
use crate::error::{Error, Result};
use crate::resolve;
use crate::value::Value;
use chrono::{Datelike, NaiveDate};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::trace;

/// Built-in kind tags written under the marker key.
pub mod kind {
    pub const ORDERED_MAP: &str = "OrderedDict";
    pub const TUPLE: &str = "tuple";
    pub const SET: &str = "set";
    pub const DATETIME: &str = "datetime";
    pub const DATE: &str = "date";
    pub const DECIMAL: &str = "Decimal";
    pub const TYPE: &str = "type";
    pub const FUNCTION: &str = "function";
    pub const MODULE: &str = "module";

    /// Every built-in tag. Entity identifiers never collide with these
    /// because they always contain the scope delimiter.
    pub const ALL: [&str; 9] = [
        ORDERED_MAP,
        TUPLE,
        SET,
        DATETIME,
        DATE,
        DECIMAL,
        TYPE,
        FUNCTION,
        MODULE,
    ];
}

/// Converts values to tagged JSON blobs using a fixed marker key.
#[derive(Debug, Clone, Copy)]
pub struct Tagger<'a> {
    marker: &'a str,
}

impl<'a> Tagger<'a> {
    #[must_use]
    pub fn new(marker: &'a str) -> Self {
        Self { marker }
    }

    #[must_use]
    pub fn marker(&self) -> &'a str {
        self.marker
    }

    /// Tags a value, recursing into containers.
    ///
    /// Fails for dates outside years `0..=9999`, which `YYYYMMDD` cannot
    /// hold, a map using the marker as a plain key, and nested entities with
    /// a null in a non-optional field or an `encode` hook without `decode`.
    pub fn tag(&self, value: &Value) -> Result<JsonValue> {
        Ok(match value {
            Value::OrderedMap(map) => {
                let entries = map
                    .iter()
                    .map(|(k, v)| Ok(JsonValue::Array(vec![self.tag(k)?, self.tag(v)?])))
                    .collect::<Result<Vec<_>>>()?;
                self.marked(kind::ORDERED_MAP, JsonValue::Array(entries))
            }
            Value::Map(map) => {
                if map.contains_key(self.marker) {
                    return Err(Error::invalid_payload(
                        "map",
                        format!("key '{}' is reserved for the marker", self.marker),
                    ));
                }
                JsonValue::Object(
                    map.iter()
                        .map(|(k, v)| Ok((k.clone(), self.tag(v)?)))
                        .collect::<Result<JsonMap<_, _>>>()?,
                )
            }
            Value::List(items) => JsonValue::Array(self.tag_all(items)?),
            Value::Tuple(items) => self.marked(kind::TUPLE, JsonValue::Array(self.tag_all(items)?)),
            Value::Set(set) => {
                let items = set.iter().map(|v| self.tag(v)).collect::<Result<Vec<_>>>()?;
                self.marked(kind::SET, JsonValue::Array(items))
            }
            Value::Entity(entity) => self.tag_entity(entity.as_dyn())?,
            Value::Type(t) => self.marked(kind::TYPE, JsonValue::String(t.identifier())),
            Value::Function(f) => self.marked(kind::FUNCTION, JsonValue::String(f.identifier())),
            Value::Module(m) => self.marked(kind::MODULE, JsonValue::String(m.name().to_string())),
            Value::DateTime(dt) => {
                self.marked(kind::DATETIME, JsonValue::String(dt.to_iso_string()))
            }
            Value::Date(date) => self.marked(kind::DATE, JsonValue::String(format_date(*date)?)),
            Value::Decimal(d) => self.marked(kind::DECIMAL, JsonValue::String(d.to_string())),
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => JsonValue::Number(n.clone()),
            Value::String(s) => JsonValue::String(s.clone()),
        })
    }

    /// Serializes an entity into a marked blob carrying its identifier.
    pub fn tag_entity(&self, entity: &dyn AnyEntity) -> Result<JsonValue> {
        let identifier = entity.entity_type().identifier();
        trace!(entity = %identifier, "tagging entity");
        resolve::serialize_fields(self, entity.entity_schema(), identifier, entity.entity_fields())
    }

    fn tag_all(&self, items: &[Value]) -> Result<Vec<JsonValue>> {
        items.iter().map(|v| self.tag(v)).collect()
    }

    fn marked(&self, kind: &str, payload: JsonValue) -> JsonValue {
        let mut blob = JsonMap::new();
        blob.insert(self.marker.to_string(), JsonValue::String(kind.to_string()));
        blob.insert(PAYLOAD_KEY.to_string(), payload);
        JsonValue::Object(blob)
    }
}

/// `YYYYMMDD`, zero padded. Years outside `0..=9999` have no such form.
pub(crate) fn format_date(date: NaiveDate) -> Result<String> {
    if !(0..=9999).contains(&date.year()) {
        return Err(Error::invalid_payload(
            kind::DATE,
            format!("year {} does not fit YYYYMMDD", date.year()),
        ));
    }
    Ok(format!("{:04}{:02}{:02}", date.year(), date.month(), date.day()))
}
