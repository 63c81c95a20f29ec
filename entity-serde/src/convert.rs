//! Conversions between typed struct fields and [`Value`].

use crate::error::{Error, Result};
use crate::reference::{FunctionRef, ModuleRef, TypeRef};
use crate::value::{DateTimeValue, OrderedMap, Value, ValueSet};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// A Rust type usable as an entity field.
///
/// `OPTIONAL` marks types whose values may be null; the declaration macro
/// copies it into the field descriptor, so `Option<T>` fields are optional
/// without extra configuration.
pub trait FieldValue: Sized {
    const OPTIONAL: bool = false;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Result<Self>;

    /// Rejects field values that [`into_value`](Self::into_value) cannot
    /// carry faithfully.
    fn check_value(&self) -> Result<()> {
        Ok(())
    }
}

fn mismatch<T>(expected: &'static str, found: &Value) -> Result<T> {
    Err(Error::TypeMismatch {
        expected,
        found: found.kind_name(),
    })
}

impl FieldValue for Value {
    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FieldValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => mismatch("bool", &other),
        }
    }
}

macro_rules! integer_field_value {
    ($($t:ty),*) => {
        $(
            impl FieldValue for $t {
                fn into_value(self) -> Value {
                    Value::from(self)
                }

                fn from_value(value: Value) -> Result<Self> {
                    let n = match &value {
                        Value::Number(n) => n
                            .as_i64()
                            .map(i128::from)
                            .or_else(|| n.as_u64().map(i128::from)),
                        _ => None,
                    };
                    match n.and_then(|n| <$t>::try_from(n).ok()) {
                        Some(v) => Ok(v),
                        None => mismatch(stringify!($t), &value),
                    }
                }
            }
        )*
    };
}

integer_field_value!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FieldValue for f64 {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn check_value(&self) -> Result<()> {
        if self.is_finite() {
            return Ok(());
        }
        Err(Error::TypeMismatch {
            expected: "finite f64",
            found: if self.is_nan() { "NaN" } else { "infinity" },
        })
    }

    fn from_value(value: Value) -> Result<Self> {
        match value.as_f64() {
            Some(v) => Ok(v),
            None => mismatch("f64", &value),
        }
    }
}

impl FieldValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => mismatch("string", &other),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const OPTIONAL: bool = true;

    fn into_value(self) -> Value {
        self.map_or(Value::Null, FieldValue::into_value)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn check_value(&self) -> Result<()> {
        self.as_ref().map_or(Ok(()), T::check_value)
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(FieldValue::into_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => mismatch("list", &other),
        }
    }

    fn check_value(&self) -> Result<()> {
        self.iter().try_for_each(T::check_value)
    }
}

impl<T: FieldValue> FieldValue for BTreeMap<String, T> {
    fn into_value(self) -> Value {
        Value::Map(self.into_iter().map(|(k, v)| (k, v.into_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| Ok((k, T::from_value(v)?)))
                .collect(),
            other => mismatch("map", &other),
        }
    }

    fn check_value(&self) -> Result<()> {
        self.values().try_for_each(T::check_value)
    }
}

/// Implements `FieldValue` for types that map onto exactly one variant.
macro_rules! variant_field_value {
    ($($t:ty => $variant:ident, $expected:literal;)*) => {
        $(
            impl FieldValue for $t {
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => mismatch($expected, &other),
                    }
                }
            }
        )*
    };
}

variant_field_value! {
    ValueSet => Set, "set";
    OrderedMap => OrderedMap, "OrderedDict";
    NaiveDate => Date, "date";
    DateTimeValue => DateTime, "datetime";
    Decimal => Decimal, "Decimal";
    TypeRef => Type, "type";
    FunctionRef => Function, "function";
    ModuleRef => Module, "module";
}

impl FieldValue for NaiveDateTime {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(DateTimeValue::Naive(dt)) => Ok(dt),
            other => mismatch("naive datetime", &other),
        }
    }
}

impl FieldValue for DateTime<FixedOffset> {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(DateTimeValue::Aware(dt)) => Ok(dt),
            other => mismatch("aware datetime", &other),
        }
    }
}

impl FieldValue for DateTime<Utc> {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(DateTimeValue::Aware(dt)) => Ok(dt.with_timezone(&Utc)),
            other => mismatch("aware datetime", &other),
        }
    }
}

/// Tuple fields, carried as [`Value::Tuple`].
macro_rules! tuple_field_value {
    ($($len:literal => ($($idx:tt $name:ident),+);)*) => {
        $(
            impl<$($name: FieldValue),+> FieldValue for ($($name,)+) {
                fn into_value(self) -> Value {
                    Value::Tuple(vec![$(self.$idx.into_value()),+])
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Tuple(items) if items.len() == $len => {
                            let mut items = items.into_iter();
                            Ok(($(
                                $name::from_value(items.next().unwrap_or_default())?,
                            )+))
                        }
                        other => mismatch(concat!("tuple of ", $len), &other),
                    }
                }

                fn check_value(&self) -> Result<()> {
                    $(self.$idx.check_value()?;)+
                    Ok(())
                }
            }
        )*
    };
}

tuple_field_value! {
    1 => (0 A);
    2 => (0 A, 1 B);
    3 => (0 A, 1 B, 2 C);
    4 => (0 A, 1 B, 2 C, 3 D);
}
