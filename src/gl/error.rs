use std::fmt;

use super::structs::ErrorCode;

/// Failure taxonomy for the context layer.
///
/// Only `CreationFailed` honors the `throw_on_failure` creation option;
/// every other variant always propagates as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The backend refused to create a context handle.
    CreationFailed(String),
    /// No drawable surface could be resolved or created.
    NoSurface(String),
    /// The handle does not satisfy the base capability probe.
    InvalidContext,
    /// The handle satisfies the base probe but not the version 2 probe.
    RequiresVersion2,
    /// A debug-wrapped call received invalid arguments or left the
    /// device error flag set.
    Validation(String),
    /// A device call failed with a sticky error code.
    Api(ErrorCode),
    /// The device behind the context is gone.
    ContextLost,
    /// The owning context was destroyed while the query was in flight.
    QueryDiscarded,
    Unimplemented(&'static str),
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::CreationFailed(message) => {
                write!(f, "context creation failed: {}", message)
            }
            ContextError::NoSurface(message) => {
                write!(f, "no drawable surface: {}", message)
            }
            ContextError::InvalidContext => write!(f, "invalid graphics context"),
            ContextError::RequiresVersion2 => write!(f, "requires a version 2 context"),
            ContextError::Validation(message) => write!(f, "validation failed: {}", message),
            ContextError::Api(code) => write!(f, "device error: {:?}", code),
            ContextError::ContextLost => write!(f, "context lost"),
            ContextError::QueryDiscarded => {
                write!(f, "query discarded: owning context was destroyed")
            }
            ContextError::Unimplemented(what) => write!(f, "unimplemented: {}", what),
        }
    }
}

impl std::error::Error for ContextError {}

impl From<ErrorCode> for ContextError {
    fn from(code: ErrorCode) -> Self {
        ContextError::Api(code)
    }
}

/// Convenient crate-wide result type.
pub type Result<T, E = ContextError> = std::result::Result<T, E>;
