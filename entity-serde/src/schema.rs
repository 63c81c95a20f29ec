//! Per-entity field descriptors.
//!
//! An [`EntitySchema`] is the statically built table the engine walks instead
//! of reflecting over a struct: one [`Field`] per struct field, in
//! declaration order, carrying optionality, defaults, codec hooks and the
//! field contract.

use crate::error::{Error, Result};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Validity predicate for a non-null field value.
pub type Contract = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Custom per-field conversion applied before tagging or after untagging.
pub type Codec = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Zero-argument producer of a fresh default value.
pub type Factory = Arc<dyn Fn() -> Value + Send + Sync>;

/// Descriptor of a single entity field.
#[derive(Clone)]
pub struct Field {
    name: &'static str,
    optional: bool,
    default: Option<Value>,
    default_factory: Option<Factory>,
    encode: Option<Codec>,
    decode: Option<Codec>,
    contract: Option<Contract>,
}

impl Field {
    /// A required, non-null field with no default and no hooks.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            optional: false,
            default: None,
            default_factory: None,
            encode: None,
            decode: None,
            contract: None,
        }
    }

    /// Allows `null` as a field value.
    #[must_use]
    pub fn optional(self) -> Self {
        self.nullable(true)
    }

    #[must_use]
    pub fn nullable(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Static value used when the field is absent.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Producer invoked for every resolution of an absent field without a
    /// static default.
    #[must_use]
    pub fn default_factory(mut self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default_factory = Some(Arc::new(factory));
        self
    }

    /// Conversion applied to the field value before generic tagging.
    ///
    /// Must be paired with [`decode`](Self::decode).
    #[must_use]
    pub fn encode(mut self, f: impl Fn(Value) -> Result<Value> + Send + Sync + 'static) -> Self {
        self.encode = Some(Arc::new(f));
        self
    }

    /// Conversion applied to the field value after generic untagging.
    #[must_use]
    pub fn decode(mut self, f: impl Fn(Value) -> Result<Value> + Send + Sync + 'static) -> Self {
        self.decode = Some(Arc::new(f));
        self
    }

    /// Predicate every non-null value of this field must satisfy.
    #[must_use]
    pub fn contract(mut self, f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.contract = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Static default if declared, else a fresh factory value.
    #[must_use]
    pub fn resolve_default(&self) -> Option<Value> {
        self.default
            .clone()
            .or_else(|| self.default_factory.as_ref().map(|factory| factory()))
    }

    pub fn encoder(&self) -> Option<&Codec> {
        self.encode.as_ref()
    }

    pub fn decoder(&self) -> Option<&Codec> {
        self.decode.as_ref()
    }

    /// Checks the contract against a value. Null is always exempt.
    #[must_use]
    pub fn satisfies_contract(&self, value: &Value) -> bool {
        match &self.contract {
            Some(contract) if !value.is_null() => contract(value),
            _ => true,
        }
    }

    /// Rejects an `encode` hook without a matching `decode` hook.
    pub fn check_codec(&self, entity: &str) -> Result<()> {
        if self.encode.is_some() && self.decode.is_none() {
            return Err(Error::MissingDecoder {
                field: self.name.to_string(),
                entity: entity.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("optional", &self.optional)
            .field("default", &self.default)
            .field("default_factory", &self.default_factory.is_some())
            .field("encode", &self.encode.is_some())
            .field("decode", &self.decode.is_some())
            .field("contract", &self.contract.is_some())
            .finish()
    }
}

/// Ordered field table of an entity type.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    entity: &'static str,
    fields: Vec<Field>,
}

impl EntitySchema {
    #[must_use]
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            fields: Vec::new(),
        }
    }

    /// Appends a field. Declaration order is preserved.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Local name of the entity type this schema describes.
    #[must_use]
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Checks every field's codec pairing.
    pub fn check(&self) -> Result<()> {
        self.fields.iter().try_for_each(|f| f.check_codec(self.entity))
    }
}
