//! Serializable partial application.

use crate::error::{Error, Result};
use crate::reference::Arguments;
use crate::registry::Registry;
use crate::value::{Map, Value};

crate::entity! {
    /// A type or function reference bundled with keyword arguments, invoked
    /// later with the rest.
    ///
    /// Stored and call-time keyword arguments must not overlap; a name given
    /// twice fails with [`Error::DuplicateArgument`].
    pub struct Partial {
        pub func: Value => |f| f.contract(|v| matches!(v, Value::Type(_) | Value::Function(_))),
        pub kwargs: Map,
    }
}

impl Partial {
    /// Calls through the global registry.
    pub fn call(&self, args: Arguments) -> Result<Value> {
        self.call_with(Registry::global(), args)
    }

    /// Calls the wrapped reference with the stored keyword arguments added
    /// to `args`.
    pub fn call_with(&self, registry: &Registry, args: Arguments) -> Result<Value> {
        let Arguments { args, mut kwargs } = args;
        if let Some(name) = self.kwargs.keys().find(|name| kwargs.contains_key(*name)) {
            return Err(Error::DuplicateArgument(name.clone()));
        }
        kwargs.extend(self.kwargs.iter().map(|(k, v)| (k.clone(), v.clone())));
        registry.call(&self.func, Arguments { args, kwargs })
    }
}

/// Wraps `func`, a [`TypeRef`](crate::TypeRef) or
/// [`FunctionRef`](crate::FunctionRef), with keyword arguments.
pub fn partial(func: impl Into<Value>, kwargs: Map) -> Result<Partial> {
    Partial::new(func.into(), kwargs)
}
