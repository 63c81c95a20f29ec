//! Declaration macros.
//!
//! `entity!` turns a plain struct declaration into a registered entity type;
//! `register_function!` makes free functions reachable from `function` blobs.

/// Declares an entity type.
///
/// The struct gets `Debug`, `Clone` and `PartialEq` derives, an [`Entity`]
/// impl whose schema lists the fields in declaration order, a validating
/// `new` constructor, and a registration in the global registry.
///
/// A field is optional when its type is `Option<_>`. Anything else about a
/// field is configured with a closure over its [`Field`] after `=>`:
///
/// ```ignore
/// entity_serde::entity! {
///     pub struct Order {
///         pub id: i64 => |f| f.contract(|v| v.as_i64().is_some_and(|id| id > 0)),
///         pub note: Option<String>,
///         pub tags: Vec<String> => |f| f.default_factory(|| Value::list(Vec::<Value>::new())),
///     }
/// }
/// ```
///
/// Entity types are identified by the module that invokes the macro, so
/// moving a declaration to another module changes its wire identifier.
///
/// [`Entity`]: crate::Entity
/// [`Field`]: crate::Field
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty $(=> $configure:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::Entity for $name {
            const SCOPE: &'static str = ::std::module_path!();
            const NAME: &'static str = ::std::stringify!($name);

            fn schema() -> &'static $crate::EntitySchema {
                static SCHEMA: ::std::sync::OnceLock<$crate::EntitySchema> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    $crate::EntitySchema::new(::std::stringify!($name))
                        $(
                            .field({
                                let field = $crate::Field::new(::std::stringify!($field))
                                    .nullable(<$ty as $crate::FieldValue>::OPTIONAL);
                                $( let field = $crate::__private::configure(field, $configure); )?
                                field
                            })
                        )*
                })
            }

            #[allow(unused_mut)]
            fn to_fields(&self) -> $crate::Map {
                let mut fields = $crate::Map::new();
                $(
                    fields.insert(
                        ::std::string::ToString::to_string(::std::stringify!($field)),
                        $crate::FieldValue::into_value(::std::clone::Clone::clone(&self.$field)),
                    );
                )*
                fields
            }

            fn check_values(&self) -> $crate::Result<()> {
                $( $crate::FieldValue::check_value(&self.$field)?; )*
                ::std::result::Result::Ok(())
            }

            #[allow(unused_mut, unused_variables)]
            fn from_fields(mut fields: $crate::Map) -> $crate::Result<Self> {
                ::std::result::Result::Ok(Self {
                    $(
                        $field: $crate::__private::take_field(
                            &mut fields,
                            ::std::stringify!($field),
                        )?,
                    )*
                })
            }
        }

        impl $crate::FieldValue for $name {
            fn into_value(self) -> $crate::Value {
                $crate::Value::Entity($crate::EntityValue::new(self))
            }

            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                $crate::__private::entity_from_value(value)
            }

            fn check_value(&self) -> $crate::Result<()> {
                $crate::Entity::check_values(self)
            }
        }

        impl ::std::convert::From<$name> for $crate::Value {
            fn from(entity: $name) -> Self {
                $crate::FieldValue::into_value(entity)
            }
        }

        impl $name {
            /// Builds a validated instance from every field value.
            #[allow(clippy::too_many_arguments, dead_code)]
            $vis fn new($($field: $ty),*) -> $crate::Result<Self> {
                $crate::Entity::checked(Self { $($field),* })
            }
        }

        const _: () = {
            fn __register(registry: &mut $crate::Registry) {
                registry.register::<$name>();
            }
            $crate::__private::inventory::submit! {
                $crate::Registration::new(__register)
            }
        };
    };
}

/// Registers free functions so `function` blobs naming them can be resolved.
///
/// Must be invoked in the module that defines the functions. Each function
/// has the signature `fn(Arguments) -> Result<Value>`.
///
/// ```ignore
/// fn double(args: Arguments) -> Result<Value> { ... }
/// entity_serde::register_function!(double);
/// ```
#[macro_export]
macro_rules! register_function {
    ($($func:ident),+ $(,)?) => {
        const _: () = {
            fn __register(registry: &mut $crate::Registry) {
                $(
                    registry.register_function($crate::function_ref!($func));
                )+
            }
            $crate::__private::inventory::submit! {
                $crate::Registration::new(__register)
            }
        };
    };
}

/// Builds a [`FunctionRef`](crate::FunctionRef) to a function of the
/// current module.
#[macro_export]
macro_rules! function_ref {
    ($func:ident) => {
        $crate::FunctionRef::new(::std::module_path!(), ::std::stringify!($func), $func)
    };
}

#[doc(hidden)]
pub mod __private {
    use crate::convert::FieldValue;
    use crate::entity::Entity;
    use crate::error::{Error, Result};
    use crate::schema::Field;
    use crate::value::{Map, Value};

    pub use inventory;

    pub fn configure(field: Field, configure: impl FnOnce(Field) -> Field) -> Field {
        configure(field)
    }

    pub fn take_field<T: FieldValue>(fields: &mut Map, name: &str) -> Result<T> {
        T::from_value(fields.remove(name).unwrap_or_default())
    }

    pub fn entity_from_value<T: Entity>(value: Value) -> Result<T> {
        match value {
            Value::Entity(entity) => entity.downcast::<T>().map_err(|other| Error::TypeMismatch {
                expected: T::NAME,
                found: other.entity_name(),
            }),
            other => Err(Error::TypeMismatch {
                expected: T::NAME,
                found: other.kind_name(),
            }),
        }
    }
}
