//! Domain error types

use thiserror::Error;

use crate::state::SendState;

/// Domain-level errors raised while building or validating core values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The body kind is not one of the known kinds.
    #[error("unsupported body kind: {0}")]
    UnsupportedBodyKind(String),

    /// The operation needs a different protocol variant.
    #[error("expected a {expected} request, found {found}")]
    WrongProtocol {
        /// Protocol the operation needs.
        expected: &'static str,
        /// Protocol of the request it was given.
        found: &'static str,
    },

    /// A send lifecycle transition is not allowed by the state machine.
    #[error("invalid send transition: {from:?} -> {to:?}")]
    InvalidTransition {
        /// State the send was in.
        from: SendState,
        /// State that was requested.
        to: SendState,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
