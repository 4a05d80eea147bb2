//! Error types for talkflow.
//!
//! Only definition-time and infrastructure failures are errors. Bad user
//! input never is: widgets and validators turn it into a re-rendered prompt.

use thiserror::Error;

/// A `Result` alias with [`enum@Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in talkflow operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to serialize or deserialize session, stack or callback data.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Collected answers could not be decoded into the flow's record type.
    ///
    /// Usually means a field's widget produces a value shape the record
    /// field cannot hold (e.g. a multiselect string into a `Vec<String>`).
    #[error("failed to decode collected values into record for flow {flow}: {source}")]
    RecordDecode {
        /// The flow name.
        flow: &'static str,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Two field descriptors share a name.
    #[error("flow {flow}: duplicate field `{field}`")]
    DuplicateField { flow: &'static str, field: String },

    /// A visibility predicate or widget reads a field that is not declared
    /// strictly before it.
    #[error("flow {flow}: field `{field}` depends on `{depends_on}`, which is not declared before it")]
    ForwardReference {
        flow: &'static str,
        field: String,
        depends_on: String,
    },

    /// A prompted field has no widget.
    #[error("flow {flow}: field `{field}` has no widget")]
    MissingWidget { flow: &'static str, field: String },

    /// A field descriptor names a field the record does not have.
    #[error("flow {flow}: field `{field}` is not a member of the record")]
    UnknownRecordField { flow: &'static str, field: String },

    /// A record member has no field descriptor.
    #[error("flow {flow}: record member `{field}` has no field descriptor")]
    UndeclaredRecordField { flow: &'static str, field: String },

    /// A field that can end up absent is not declared as `Option<_>`.
    #[error("flow {flow}: field `{field}` may be absent but the record does not make it optional")]
    NotOptional { flow: &'static str, field: String },

    /// A flow declares no fields at all.
    #[error("flow {0} declares no fields")]
    EmptyFlow(&'static str),

    /// A pattern validator failed to compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Two transforms claim the same trigger signal.
    #[error("flow {flow}: trigger `{trigger}` claimed by both {first} and {second}")]
    ConflictingTrigger {
        flow: &'static str,
        trigger: String,
        first: &'static str,
        second: &'static str,
    },

    /// The same transform was applied twice.
    #[error("flow {flow}: transform {transform} applied more than once")]
    DuplicateTransform {
        flow: &'static str,
        transform: &'static str,
    },

    /// Flow was not registered with the service.
    #[error("unknown flow: {0}")]
    UnknownFlow(String),

    /// Flow was registered more than once.
    #[error("duplicate flow registration: {0}")]
    DuplicateFlow(String),

    /// Two flow names hash to the same callback prefix.
    #[error("flows {first} and {second} share callback hash {hash}")]
    CallbackCollision {
        first: String,
        second: String,
        hash: String,
    },

    /// Session or stack backend failure.
    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    /// Create a record decode error with the flow name attached.
    pub fn record_decode(flow: &'static str, source: serde_json::Error) -> Self {
        Error::RecordDecode { flow, source }
    }

    /// Create a store error from any displayable backend failure.
    pub fn store(err: impl std::fmt::Display) -> Self {
        Error::Store(err.to_string())
    }

    /// Whether this error can only occur while building flow definitions.
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            Error::DuplicateField { .. }
                | Error::ForwardReference { .. }
                | Error::MissingWidget { .. }
                | Error::UnknownRecordField { .. }
                | Error::UndeclaredRecordField { .. }
                | Error::NotOptional { .. }
                | Error::EmptyFlow(_)
                | Error::InvalidPattern { .. }
                | Error::ConflictingTrigger { .. }
                | Error::DuplicateTransform { .. }
        )
    }
}
