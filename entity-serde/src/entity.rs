//! The [`Entity`] trait and its type-erased form.
//!
//! [`EntityValue`] lets entities of any type sit inside a [`Value`](crate::Value)
//! while still comparing, cloning and downcasting to the concrete struct.

use crate::error::Result;
use crate::reference::{TypeRef, qualify};
use crate::resolve;
use crate::schema::EntitySchema;
use crate::serializer::Serializer;
use crate::value::Map;
use serde_json::Value as JsonValue;
use std::any::Any;
use std::fmt;

/// A record type that takes part in the tagged serialization protocol.
///
/// Implementations are normally generated by [`entity!`](crate::entity),
/// which also registers the type with the global
/// [`Registry`](crate::Registry). The required items are the descriptor
/// table and the conversions between the struct and its field map; every
/// other method has an engine-provided default.
pub trait Entity: fmt::Debug + Clone + PartialEq + Send + Sync + 'static {
    /// Defining scope (module path) of the type.
    const SCOPE: &'static str;

    /// Local type name.
    const NAME: &'static str;

    /// Field descriptors in declaration order.
    fn schema() -> &'static EntitySchema;

    /// Current field values, keyed by field name.
    fn to_fields(&self) -> Map;

    /// Builds the struct from a complete field map without validation.
    ///
    /// Prefer [`construct`](Self::construct), which applies defaults and
    /// validates before calling this.
    fn from_fields(fields: Map) -> Result<Self>;

    /// Fully-qualified type identifier, `<scope>:<name>`.
    fn identifier() -> String {
        qualify(Self::SCOPE, Self::NAME)
    }

    /// Shallow field map; nested entities are left as entity values.
    fn to_map(&self) -> Map {
        self.to_fields()
    }

    /// Checks typed field values before they are converted, e.g. that
    /// floats are finite.
    fn check_values(&self) -> Result<()> {
        Ok(())
    }

    /// Checks field values, null-ness and every field contract.
    fn validate_contracts(&self) -> Result<()> {
        self.check_values()?;
        resolve::check_fields(Self::schema(), &self.to_fields())
    }

    /// Validates an instance built with a struct literal.
    fn checked(self) -> Result<Self> {
        self.validate_contracts()?;
        Ok(self)
    }

    /// Builds a validated instance from keyword arguments, applying declared
    /// defaults and default factories to absent fields.
    fn construct(kwargs: Map) -> Result<Self> {
        resolve::construct::<Self>(kwargs)
    }

    /// Serializes with the global serializer.
    fn serialize(&self) -> Result<JsonValue> {
        Serializer::global().serialize(self)
    }

    /// Deserializes a blob as this type with the global serializer. The
    /// blob's own marker is ignored; nested markers are dispatched through
    /// the global registry.
    fn deserialize(blob: &JsonValue) -> Result<Self> {
        Serializer::global().deserialize_as(blob)
    }

    /// Checks contracts, then that a round trip through JSON text
    /// reproduces an equal value.
    fn validate(&self) -> Result<()> {
        Serializer::global().validate(self)
    }
}

/// Object-safe view of an [`Entity`], used to carry entities inside
/// [`Value`](crate::Value).
pub trait AnyEntity: Any + fmt::Debug + Send + Sync {
    fn entity_type(&self) -> TypeRef;
    fn entity_name(&self) -> &'static str;
    fn entity_schema(&self) -> &'static EntitySchema;
    fn entity_fields(&self) -> Map;
    fn clone_box(&self) -> Box<dyn AnyEntity>;
    fn eq_dyn(&self, other: &dyn AnyEntity) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Entity> AnyEntity for T {
    fn entity_type(&self) -> TypeRef {
        TypeRef::of::<T>()
    }

    fn entity_name(&self) -> &'static str {
        T::NAME
    }

    fn entity_schema(&self) -> &'static EntitySchema {
        T::schema()
    }

    fn entity_fields(&self) -> Map {
        self.to_fields()
    }

    fn clone_box(&self) -> Box<dyn AnyEntity> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn AnyEntity) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|o| o == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A type-erased entity instance.
pub struct EntityValue(Box<dyn AnyEntity>);

impl EntityValue {
    pub fn new<T: Entity>(entity: T) -> Self {
        Self(Box::new(entity))
    }

    #[must_use]
    pub fn entity_type(&self) -> TypeRef {
        self.0.entity_type()
    }

    #[must_use]
    pub fn entity_name(&self) -> &'static str {
        self.0.entity_name()
    }

    #[must_use]
    pub fn as_dyn(&self) -> &dyn AnyEntity {
        self.0.as_ref()
    }

    #[must_use]
    pub fn is<T: Entity>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    #[must_use]
    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Unwraps the concrete entity, handing the value back on a type mismatch.
    pub fn downcast<T: Entity>(self) -> std::result::Result<T, Self> {
        if self.is::<T>() {
            match self.0.into_any().downcast::<T>() {
                Ok(entity) => Ok(*entity),
                Err(_) => unreachable!("type checked above"),
            }
        } else {
            Err(self)
        }
    }
}

impl Clone for EntityValue {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl PartialEq for EntityValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dyn(other.0.as_ref())
    }
}

impl fmt::Debug for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}
