//! The closed set of runtime values the engine can carry.
//!
//! Every field of every entity is converted to a [`Value`] before tagging and
//! produced as a [`Value`] by untagging. The variants cover JSON-native kinds
//! (null, bool, number, string, list, string-keyed map) plus the kinds whose
//! identity would be lost in plain JSON and therefore travel as marked blobs.

use crate::entity::EntityValue;
use crate::error::{Error, Result};
use crate::reference::{FunctionRef, ModuleRef, TypeRef};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;

/// String-keyed mapping of values. Key order carries no meaning.
pub type Map = BTreeMap<String, Value>;

/// A runtime value understood by the tagger and untagger.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Value>),
    /// String-keyed mapping. Tagging fails if a key equals the marker key,
    /// since the blob would read back as a marked value.
    Map(Map),
    /// Fixed-arity sequence; travels as a `tuple` marked blob.
    Tuple(Vec<Value>),
    /// Unordered collection of unique values.
    Set(ValueSet),
    /// Mapping whose entry order is significant and whose keys may be any value.
    OrderedMap(OrderedMap),
    Date(NaiveDate),
    DateTime(DateTimeValue),
    Decimal(Decimal),
    Type(TypeRef),
    Function(FunctionRef),
    Module(ModuleRef),
    Entity(EntityValue),
}

impl Value {
    /// Short name of the value's kind, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::OrderedMap(_) => "OrderedDict",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Decimal(_) => "Decimal",
            Self::Type(_) => "type",
            Self::Function(_) => "function",
            Self::Module(_) => "module",
            Self::Entity(_) => "entity",
        }
    }

    /// Builds a tuple value.
    pub fn tuple(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Builds a list value.
    pub fn list(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a set value; duplicates are dropped.
    pub fn set(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Builds an ordered map value from entries in iteration order.
    pub fn ordered_map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        Self::OrderedMap(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the entity payload if this value is an entity of type `T`.
    #[must_use]
    pub fn as_entity<T: crate::Entity>(&self) -> Option<&T> {
        match self {
            Self::Entity(entity) => entity.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! value_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::Number(v.into())
                }
            }
        )*
    };
}

value_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become `Null`. Typed `f64`
    /// entity fields reject them instead, see
    /// [`FieldValue::check_value`](crate::FieldValue::check_value).
    fn from(v: f64) -> Self {
        serde_json::Number::from_f64(v).map_or(Self::Null, Self::Number)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Self::Map(v)
    }
}

impl From<ValueSet> for Value {
    fn from(v: ValueSet) -> Self {
        Self::Set(v)
    }
}

impl From<OrderedMap> for Value {
    fn from(v: OrderedMap) -> Self {
        Self::OrderedMap(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(DateTimeValue::Naive(v))
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::DateTime(DateTimeValue::Aware(v))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(DateTimeValue::Aware(v.fixed_offset()))
    }
}

impl From<DateTimeValue> for Value {
    fn from(v: DateTimeValue) -> Self {
        Self::DateTime(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<TypeRef> for Value {
    fn from(v: TypeRef) -> Self {
        Self::Type(v)
    }
}

impl From<FunctionRef> for Value {
    fn from(v: FunctionRef) -> Self {
        Self::Function(v)
    }
}

impl From<ModuleRef> for Value {
    fn from(v: ModuleRef) -> Self {
        Self::Module(v)
    }
}

impl From<EntityValue> for Value {
    fn from(v: EntityValue) -> Self {
        Self::Entity(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ── ValueSet ─────────────────────────────────────────────────────

/// An unordered collection of unique values.
///
/// Values are neither hashable nor totally ordered (floats, entities), so
/// uniqueness is enforced by equality on insert. Equality between sets
/// ignores element order.
#[derive(Debug, Clone, Default)]
pub struct ValueSet(Vec<Value>);

impl ValueSet {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts a value. Returns false if an equal value was already present.
    pub fn insert(&mut self, value: Value) -> bool {
        if self.0.contains(&value) {
            return false;
        }
        self.0.push(value);
        true
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.0.contains(value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.0.iter().all(|v| other.contains(v))
    }
}

impl FromIterator<Value> for ValueSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl IntoIterator for ValueSet {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValueSet {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ── OrderedMap ───────────────────────────────────────────────────

/// A mapping that remembers insertion order.
///
/// Keys may be any value (integers are common), so entries are kept as a
/// list of pairs. Equality is order-sensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedMap(Vec<(Value, Value)>);

impl OrderedMap {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts an entry. An existing key keeps its position and gets the new
    /// value, which is returned in place of the old one.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.0.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(k, _)| k)
    }
}

impl FromIterator<(Value, Value)> for OrderedMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

// ── DateTimeValue ────────────────────────────────────────────────

/// A date with a time of day, with or without a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeValue {
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

impl DateTimeValue {
    /// ISO-8601 text; the offset is written only for aware values.
    #[must_use]
    pub fn to_iso_string(&self) -> String {
        match self {
            Self::Naive(dt) => dt.format(NAIVE_FORMATS[0]).to_string(),
            Self::Aware(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        }
    }

    /// Parses ISO-8601 text written by [`to_iso_string`](Self::to_iso_string)
    /// or by other producers using the same layout.
    pub fn parse_iso(text: &str) -> Result<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(Self::Aware(dt));
        }
        let normalized = text.replacen(' ', "T", 1);
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
            .map(Self::Naive)
            .ok_or_else(|| Error::invalid_payload("datetime", format!("'{text}' is not ISO-8601")))
    }

    #[must_use]
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            Self::Naive(dt) => *dt,
            Self::Aware(dt) => dt.naive_local(),
        }
    }

    #[must_use]
    pub fn offset(&self) -> Option<FixedOffset> {
        match self {
            Self::Naive(_) => None,
            Self::Aware(dt) => Some(*dt.offset()),
        }
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}
