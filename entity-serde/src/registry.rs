//! Entity registry and dispatcher.
//!
//! Maps fully-qualified identifiers to what the untagger needs in order to
//! rebuild a value: a deserialize routine for entity types and a function
//! pointer for function references. Scopes that own at least one symbol, or
//! that were registered explicitly, are known modules.
//!
//! The process-wide registry is assembled once from every
//! [`Registration`] submitted by [`entity!`](crate::entity) and
//! [`register_function!`](crate::register_function), and is read-only from
//! then on.

use crate::entity::{Entity, EntityValue};
use crate::error::{Error, Result};
use crate::partial::Partial;
use crate::reference::{Arguments, FunctionRef, ModuleRef, TypeRef, split_identifier};
use crate::resolve;
use crate::schema::EntitySchema;
use crate::untag::Untagger;
use crate::value::{Map, Value};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Rebuilds an entity from its marked blob.
pub type DeserializeFn = fn(&Untagger<'_>, &JsonMap<String, JsonValue>) -> Result<Value>;

/// Builds an entity from keyword arguments.
pub type ConstructFn = fn(Map) -> Result<Value>;

/// Registered capabilities of one entity type.
#[derive(Clone)]
pub struct EntityEntry {
    type_ref: TypeRef,
    schema: fn() -> &'static EntitySchema,
    deserialize: DeserializeFn,
    construct: ConstructFn,
}

fn deserialize_erased<T: Entity>(
    untagger: &Untagger<'_>,
    blob: &JsonMap<String, JsonValue>,
) -> Result<Value> {
    resolve::deserialize_entity::<T>(untagger, blob).map(|e| Value::Entity(EntityValue::new(e)))
}

fn construct_erased<T: Entity>(kwargs: Map) -> Result<Value> {
    T::construct(kwargs).map(|e| Value::Entity(EntityValue::new(e)))
}

impl EntityEntry {
    #[must_use]
    pub fn of<T: Entity>() -> Self {
        Self {
            type_ref: TypeRef::of::<T>(),
            schema: T::schema,
            deserialize: deserialize_erased::<T>,
            construct: construct_erased::<T>,
        }
    }

    #[must_use]
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    #[must_use]
    pub fn schema(&self) -> &'static EntitySchema {
        (self.schema)()
    }

    pub fn deserialize(
        &self,
        untagger: &Untagger<'_>,
        blob: &JsonMap<String, JsonValue>,
    ) -> Result<Value> {
        (self.deserialize)(untagger, blob)
    }

    pub fn construct(&self, kwargs: Map) -> Result<Value> {
        (self.construct)(kwargs)
    }

    /// Calls the type like a constructor. Positional arguments bind to
    /// fields in declaration order.
    pub fn call(&self, args: Arguments) -> Result<Value> {
        let schema = self.schema();
        let Arguments { args, mut kwargs } = args;
        if args.len() > schema.len() {
            return Err(Error::UnexpectedArgument {
                field: format!("positional argument {}", schema.len() + 1),
                entity: schema.entity().to_string(),
            });
        }
        for (field, value) in schema.fields().iter().zip(args) {
            if kwargs.insert(field.name().to_string(), value).is_some() {
                return Err(Error::DuplicateArgument(field.name().to_string()));
            }
        }
        self.construct(kwargs)
    }
}

impl fmt::Debug for EntityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityEntry")
            .field("type_ref", &self.type_ref)
            .finish_non_exhaustive()
    }
}

/// A resolvable member of a scope.
#[derive(Debug, Clone)]
pub enum Symbol {
    Entity(EntityEntry),
    Function(FunctionRef),
}

impl Symbol {
    fn kind(&self) -> &'static str {
        match self {
            Self::Entity(_) => "entity",
            Self::Function(_) => "function",
        }
    }
}

/// Deferred registration collected at link time.
pub struct Registration {
    register: fn(&mut Registry),
}

impl Registration {
    #[must_use]
    pub const fn new(register: fn(&mut Registry)) -> Self {
        Self { register }
    }
}

inventory::collect!(Registration);

/// Identifier-to-capability table.
#[derive(Debug, Default)]
pub struct Registry {
    symbols: HashMap<String, Symbol>,
    modules: BTreeSet<String>,
}

impl Registry {
    /// A registry with no symbols at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding only the built-in [`Partial`] entity.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<Partial>();
        registry
    }

    /// The process-wide registry, built on first use from every submitted
    /// [`Registration`].
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let mut registry = Self::new();
            registry.auto_register();
            debug!(
                symbols = registry.symbols.len(),
                modules = registry.modules.len(),
                "global registry built"
            );
            registry
        })
    }

    // ================================================================
    // Registration
    // ================================================================

    /// Applies every submitted [`Registration`] to this registry.
    pub fn auto_register(&mut self) -> &mut Self {
        for registration in inventory::iter::<Registration> {
            (registration.register)(self);
        }
        self
    }

    /// Registers entity type `T`. Registering the same type again is a
    /// no-op.
    pub fn register<T: Entity>(&mut self) -> &mut Self {
        let identifier = T::identifier();
        if matches!(self.symbols.get(&identifier), Some(Symbol::Entity(_))) {
            return self;
        }
        debug!(entity = %identifier, "registering entity");
        self.insert(identifier, T::SCOPE, Symbol::Entity(EntityEntry::of::<T>()))
    }

    pub fn register_function(&mut self, function: FunctionRef) -> &mut Self {
        let identifier = function.identifier();
        if matches!(self.symbols.get(&identifier), Some(Symbol::Function(f)) if *f == function) {
            return self;
        }
        let scope = function.scope().to_string();
        debug!(function = %identifier, "registering function");
        self.insert(identifier, &scope, Symbol::Function(function))
    }

    pub fn register_module(&mut self, name: impl Into<String>) -> &mut Self {
        self.modules.insert(name.into());
        self
    }

    fn insert(&mut self, identifier: String, scope: &str, symbol: Symbol) -> &mut Self {
        self.modules.insert(scope.to_string());
        if let Some(previous) = self.symbols.insert(identifier.clone(), symbol) {
            warn!(
                identifier = %identifier,
                previous = previous.kind(),
                "replaced previously registered symbol"
            );
        }
        self
    }

    // ================================================================
    // Resolution
    // ================================================================

    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.symbols.contains_key(identifier)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Looks up a symbol by its fully-qualified identifier. The scope is
    /// resolved first, then the member within it.
    pub fn resolve(&self, identifier: &str) -> Result<&Symbol> {
        let (scope, _) = split_identifier(identifier)?;
        if !self.modules.contains(scope) {
            return Err(Error::UnknownModule(scope.to_string()));
        }
        self.symbols
            .get(identifier)
            .ok_or_else(|| Error::UnresolvedSymbol(identifier.to_string()))
    }

    pub fn resolve_entity(&self, identifier: &str) -> Result<&EntityEntry> {
        match self.resolve(identifier)? {
            Symbol::Entity(entry) => Ok(entry),
            Symbol::Function(_) => Err(Error::UnresolvedSymbol(identifier.to_string())),
        }
    }

    pub fn resolve_type(&self, identifier: &str) -> Result<TypeRef> {
        self.resolve_entity(identifier).map(|entry| entry.type_ref().clone())
    }

    pub fn resolve_function(&self, identifier: &str) -> Result<FunctionRef> {
        match self.resolve(identifier)? {
            Symbol::Function(function) => Ok(function.clone()),
            Symbol::Entity(_) => Err(Error::UnresolvedSymbol(identifier.to_string())),
        }
    }

    pub fn resolve_module(&self, name: &str) -> Result<ModuleRef> {
        if self.modules.contains(name) {
            Ok(ModuleRef::new(name))
        } else {
            Err(Error::UnknownModule(name.to_string()))
        }
    }

    /// Invokes a function reference, or constructs an entity through a type
    /// reference.
    pub fn call(&self, callee: &Value, args: Arguments) -> Result<Value> {
        match callee {
            Value::Function(function) => function.call(args),
            Value::Type(type_ref) => self.resolve_entity(&type_ref.identifier())?.call(args),
            other => Err(Error::NotCallable(other.kind_name())),
        }
    }
}
