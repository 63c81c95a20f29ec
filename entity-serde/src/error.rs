//! Error types for the serialization engine.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure category of an [`Error`].
///
/// Callers that only care about *why* a call failed (bad shape, broken rule,
/// unknown symbol) match on this instead of on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value has the wrong shape: null where not allowed, wrong field type,
    /// missing or duplicated arguments.
    Type,
    /// A value has the right shape but is not acceptable: broken contract,
    /// missing field data, failed round trip, malformed payload.
    Value,
    /// A fully-qualified identifier could not be resolved.
    Lookup,
    /// JSON text or configuration could not be parsed.
    Serialization,
}

/// Errors that can occur while tagging, untagging or constructing entities.
#[derive(Debug, Error)]
pub enum Error {
    /// A field holds null but its declared type does not admit null.
    #[error("{field} is not optional")]
    NotOptional { field: String, entity: String },

    /// A required constructor argument was never supplied.
    #[error("{entity} missing 1 required argument: '{field}'")]
    MissingArgument { field: String, entity: String },

    /// A constructor argument does not name any declared field.
    #[error("{entity} got an unexpected argument '{field}'")]
    UnexpectedArgument { field: String, entity: String },

    /// The same keyword argument was supplied twice.
    #[error("got multiple values for argument '{0}'")]
    DuplicateArgument(String),

    /// A value could not be converted to the declared field type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The value is not an instance of a declared entity type.
    #[error("{0} is not an entity")]
    NotAnEntity(&'static str),

    /// The value cannot be invoked.
    #[error("{0} is not callable")]
    NotCallable(&'static str),

    /// A field contract predicate rejected a non-null value.
    #[error("break the contract for {field}, {entity}")]
    ContractViolation { field: String, entity: String },

    /// A required field is absent and has neither a default nor a factory.
    #[error("deserialized with unknown value for {field} in {entity}")]
    UnknownValue { field: String, entity: String },

    /// `validate` produced a different value after a round trip.
    #[error("{entity} could not be deserialized with same value")]
    RoundTrip { entity: String },

    /// An `encode` hook was declared without its paired `decode` hook.
    #[error("decode is not implemented for {field} in {entity}")]
    MissingDecoder { field: String, entity: String },

    /// A marked blob of a built-in kind carries an unusable payload.
    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },

    /// No symbol is registered under the identifier.
    #[error("no symbol registered for '{0}'")]
    UnresolvedSymbol(String),

    /// No module is registered under the name.
    #[error("no module named '{0}'")]
    UnknownModule(String),

    /// The identifier is not of the form `<scope>:<name>`.
    #[error("invalid identifier '{0}', expected '<scope>:<name>'")]
    InvalidIdentifier(String),

    /// JSON text encoding or decoding failed.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The configured marker key cannot be used on the wire.
    #[error("invalid marker key '{0}'")]
    InvalidMarker(String),
}

impl Error {
    /// Returns the failure category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOptional { .. }
            | Self::MissingArgument { .. }
            | Self::UnexpectedArgument { .. }
            | Self::DuplicateArgument(_)
            | Self::TypeMismatch { .. }
            | Self::NotAnEntity(_)
            | Self::NotCallable(_) => ErrorKind::Type,
            Self::ContractViolation { .. }
            | Self::UnknownValue { .. }
            | Self::RoundTrip { .. }
            | Self::MissingDecoder { .. }
            | Self::InvalidPayload { .. } => ErrorKind::Value,
            Self::UnresolvedSymbol(_) | Self::UnknownModule(_) | Self::InvalidIdentifier(_) => {
                ErrorKind::Lookup
            }
            Self::Json(_) | Self::Config(_) | Self::InvalidMarker(_) => ErrorKind::Serialization,
        }
    }

    pub(crate) fn invalid_payload(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            kind,
            reason: reason.into(),
        }
    }
}
