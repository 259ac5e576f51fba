//! Error types for expression construction and compilation.

use fc_core::ValueKind;
use thiserror::Error;

use crate::op::GeomDomain;

/// Result type for expression operations.
pub type ExprResult<T> = Result<T, ExprError>;

/// Errors raised while inferring kinds or compiling an expression tree.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    /// Binary operator applied to incompatible operand kinds.
    #[error("Kind mismatch: {op} on {lhs} and {rhs}")]
    KindMismatch {
        op: &'static str,
        lhs: ValueKind,
        rhs: ValueKind,
    },

    /// Unary operator applied to an unsupported operand kind.
    #[error("Kind mismatch: {op} on {operand}")]
    UnaryKindMismatch {
        op: &'static str,
        operand: ValueKind,
    },

    /// Reduction applied to an unsupported operand kind.
    #[error("Kind mismatch: {op} reduction of {operand}")]
    ReduceKindMismatch {
        op: &'static str,
        operand: ValueKind,
    },

    /// Reduction applied over a geometry domain it does not support.
    #[error("Domain mismatch: cannot {op} over {domain} geometry '{name}'")]
    DomainMismatch {
        op: &'static str,
        domain: GeomDomain,
        name: String,
    },

    /// Reference to a named expression that is not registered.
    #[error("Unknown named expression: {name}")]
    UnknownNamed { name: String },

    /// A persisted program underflows the operand stack.
    #[error("Malformed program: stack underflow at instruction {at}")]
    MalformedProgram { at: usize },
}
