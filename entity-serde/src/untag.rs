//! Value untagging: JSON blob back to [`Value`].

use crate::config::PAYLOAD_KEY;
use crate::error::{Error, Result};
use crate::reference::ModuleRef;
use crate::registry::Registry;
use crate::tag::kind;
use crate::value::{DateTimeValue, Map, OrderedMap, Value};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::str::FromStr;
use tracing::debug;

/// Rebuilds values from tagged blobs, resolving references and entity
/// identifiers against a registry.
#[derive(Debug, Clone, Copy)]
pub struct Untagger<'a> {
    marker: &'a str,
    registry: &'a Registry,
}

impl<'a> Untagger<'a> {
    #[must_use]
    pub fn new(marker: &'a str, registry: &'a Registry) -> Self {
        Self { marker, registry }
    }

    #[must_use]
    pub fn marker(&self) -> &'a str {
        self.marker
    }

    #[must_use]
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Untags a blob, recursing into containers.
    pub fn untag(&self, blob: &JsonValue) -> Result<Value> {
        match blob {
            JsonValue::Object(map) => match map.get(self.marker) {
                Some(marker) => self.untag_marked(marker, map),
                None => map
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), self.untag(v)?)))
                    .collect::<Result<Map>>()
                    .map(Value::Map),
            },
            JsonValue::Array(items) => self.untag_all(items).map(Value::List),
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            JsonValue::Number(n) => Ok(Value::Number(n.clone())),
            JsonValue::String(s) => Ok(Value::String(s.clone())),
        }
    }

    fn untag_marked(&self, marker: &JsonValue, blob: &JsonMap<String, JsonValue>) -> Result<Value> {
        let Some(marker) = marker.as_str() else {
            return Err(Error::invalid_payload(
                "marker",
                format!("expected a string under '{}'", self.marker),
            ));
        };
        match marker {
            kind::ORDERED_MAP => {
                let entries = array_payload(kind::ORDERED_MAP, blob)?;
                entries
                    .iter()
                    .map(|entry| match entry.as_array().map(Vec::as_slice) {
                        Some([k, v]) => Ok((self.untag(k)?, self.untag(v)?)),
                        _ => Err(Error::invalid_payload(
                            kind::ORDERED_MAP,
                            "entries must be [key, value] pairs",
                        )),
                    })
                    .collect::<Result<OrderedMap>>()
                    .map(Value::OrderedMap)
            }
            kind::TUPLE => Ok(Value::Tuple(self.untag_all(array_payload(kind::TUPLE, blob)?)?)),
            kind::SET => {
                let items = self.untag_all(array_payload(kind::SET, blob)?)?;
                Ok(Value::Set(items.into_iter().collect()))
            }
            kind::DATETIME => {
                DateTimeValue::parse_iso(string_payload(kind::DATETIME, blob)?).map(Value::DateTime)
            }
            kind::DATE => parse_date(string_payload(kind::DATE, blob)?).map(Value::Date),
            kind::DECIMAL => parse_decimal(blob).map(Value::Decimal),
            kind::TYPE => self
                .registry
                .resolve_type(string_payload(kind::TYPE, blob)?)
                .map(Value::Type),
            kind::FUNCTION => self
                .registry
                .resolve_function(string_payload(kind::FUNCTION, blob)?)
                .map(Value::Function),
            kind::MODULE => {
                let name = string_payload(kind::MODULE, blob)?;
                self.registry.resolve_module(name)?;
                Ok(Value::Module(ModuleRef::new(name)))
            }
            identifier => {
                let entry = self.registry.resolve_entity(identifier)?;
                debug!(entity = identifier, "dispatching entity blob");
                entry.deserialize(self, blob)
            }
        }
    }

    fn untag_all(&self, items: &[JsonValue]) -> Result<Vec<Value>> {
        items.iter().map(|item| self.untag(item)).collect()
    }
}

fn payload<'b>(kind: &'static str, blob: &'b JsonMap<String, JsonValue>) -> Result<&'b JsonValue> {
    blob.get(PAYLOAD_KEY)
        .ok_or_else(|| Error::invalid_payload(kind, format!("missing '{PAYLOAD_KEY}'")))
}

fn array_payload<'b>(
    kind: &'static str,
    blob: &'b JsonMap<String, JsonValue>,
) -> Result<&'b [JsonValue]> {
    payload(kind, blob)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| Error::invalid_payload(kind, "expected an array"))
}

fn string_payload<'b>(kind: &'static str, blob: &'b JsonMap<String, JsonValue>) -> Result<&'b str> {
    payload(kind, blob)?
        .as_str()
        .ok_or_else(|| Error::invalid_payload(kind, "expected a string"))
}

/// Parses `YYYYMMDD`.
pub(crate) fn parse_date(text: &str) -> Result<NaiveDate> {
    let invalid = || Error::invalid_payload(kind::DATE, format!("'{text}' is not YYYYMMDD"));
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let field = |range: std::ops::Range<usize>| text[range].parse::<u32>().map_err(|_| invalid());
    let year = i32::try_from(field(0..4)?).map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?).ok_or_else(invalid)
}

/// Decimals are written as strings; scientific notation is accepted too.
fn parse_decimal(blob: &JsonMap<String, JsonValue>) -> Result<Decimal> {
    let text = match payload(kind::DECIMAL, blob)? {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        _ => return Err(Error::invalid_payload(kind::DECIMAL, "expected a string")),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| Error::invalid_payload(kind::DECIMAL, format!("'{text}': {e}")))
}
