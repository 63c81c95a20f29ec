//! References to entity types, functions and modules.
//!
//! References travel on the wire as fully-qualified identifiers of the form
//! `<scope>:<name>`. Scopes are Rust module paths and contain `::`, so the
//! identifier is split at its last lone `:`.

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::value::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Delimiter between scope and local name in an identifier.
pub const SCOPE_DELIMITER: char = ':';

/// Joins a scope and a local name into a fully-qualified identifier.
#[must_use]
pub fn qualify(scope: &str, name: &str) -> String {
    format!("{scope}{SCOPE_DELIMITER}{name}")
}

/// Splits a fully-qualified identifier into scope and local name.
pub fn split_identifier(identifier: &str) -> Result<(&str, &str)> {
    let invalid = || Error::InvalidIdentifier(identifier.to_string());
    let (scope, name) = identifier.rsplit_once(SCOPE_DELIMITER).ok_or_else(invalid)?;
    if scope.is_empty() || name.is_empty() || scope.ends_with(SCOPE_DELIMITER) {
        return Err(invalid());
    }
    Ok((scope, name))
}

// ── TypeRef ──────────────────────────────────────────────────────

/// Reference to a registered entity type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    scope: String,
    name: String,
}

impl TypeRef {
    /// Creates a reference from its parts. Resolution happens later, against
    /// a [`Registry`](crate::Registry).
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
        }
    }

    /// Returns the reference to entity type `T`.
    #[must_use]
    pub fn of<T: Entity>() -> Self {
        Self::new(T::SCOPE, T::NAME)
    }

    /// Parses a reference from a fully-qualified identifier.
    pub fn parse(identifier: &str) -> Result<Self> {
        let (scope, name) = split_identifier(identifier)?;
        Ok(Self::new(scope, name))
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn identifier(&self) -> String {
        qualify(&self.scope, &self.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SCOPE_DELIMITER}{}", self.scope, self.name)
    }
}

impl FromStr for TypeRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ── FunctionRef ──────────────────────────────────────────────────

/// Positional and keyword arguments for a call through a reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    pub args: Vec<Value>,
    pub kwargs: Map,
}

impl Arguments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Sets a keyword argument.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Looks up a keyword argument, falling back to the positional slot.
    #[must_use]
    pub fn get(&self, name: &str, position: usize) -> Option<&Value> {
        self.kwargs.get(name).or_else(|| self.args.get(position))
    }
}

/// Signature of a function that can be referenced from a blob.
pub type NativeFn = fn(Arguments) -> Result<Value>;

/// Reference to a registered function.
///
/// Two references are equal when their identifiers are equal.
#[derive(Clone)]
pub struct FunctionRef {
    scope: String,
    name: String,
    func: NativeFn,
}

impl FunctionRef {
    pub fn new(scope: impl Into<String>, name: impl Into<String>, func: NativeFn) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
            func,
        }
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn identifier(&self) -> String {
        qualify(&self.scope, &self.name)
    }

    /// Invokes the referenced function.
    pub fn call(&self, args: Arguments) -> Result<Value> {
        (self.func)(args)
    }
}

impl PartialEq for FunctionRef {
    fn eq(&self, other: &Self) -> bool {
        self.scope == other.scope && self.name == other.name
    }
}

impl Eq for FunctionRef {}

impl fmt::Debug for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FunctionRef")
            .field(&self.identifier())
            .finish()
    }
}

impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SCOPE_DELIMITER}{}", self.scope, self.name)
    }
}

// ── ModuleRef ────────────────────────────────────────────────────

/// Reference to a registered scope (a Rust module path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleRef {
    name: String,
}

impl ModuleRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of a member of this module.
    #[must_use]
    pub fn member(&self, name: &str) -> String {
        qualify(&self.name, name)
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_uses_last_single_colon() {
        assert_eq!(
            split_identifier("my_crate::models:Item").unwrap(),
            ("my_crate::models", "Item")
        );
        assert_eq!(split_identifier("tests:Item").unwrap(), ("tests", "Item"));
    }

    #[test]
    fn split_rejects_malformed_identifiers() {
        for bad in ["Item", ":Item", "tests:", "my_crate::Item"] {
            assert!(
                matches!(split_identifier(bad), Err(Error::InvalidIdentifier(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn type_ref_display_matches_identifier() {
        let t = TypeRef::new("a::b", "C");
        assert_eq!(t.to_string(), "a::b:C");
        assert_eq!("a::b:C".parse::<TypeRef>().unwrap(), t);
    }

    #[test]
    fn arguments_prefer_keyword_over_position() {
        let args = Arguments::new().arg(1).kwarg("x", 2);
        assert_eq!(args.get("x", 0), Some(&Value::from(2)));
        assert_eq!(args.get("y", 0), Some(&Value::from(1)));
        assert_eq!(args.get("y", 1), None);
    }
}
