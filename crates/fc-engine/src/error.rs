//! Error types for backend replay and evaluation.

use fc_core::{FcError, ValueKind};
use fc_expr::{ExprError, GeomDomain};
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while replaying or evaluating a program.
///
/// Programs produced by the compiler cannot trip the kind or underflow
/// variants; programs loaded from files can, so the engine checks
/// everything it executes.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Stack underflow: {op} needs {wanted} operand(s), have {have}")]
    StackUnderflow {
        op: &'static str,
        wanted: usize,
        have: usize,
    },

    #[error("Kind mismatch in {op}: {lhs} and {rhs}")]
    KindMismatch {
        op: &'static str,
        lhs: ValueKind,
        rhs: ValueKind,
    },

    #[error("Kind mismatch in {op}: {operand}")]
    UnaryKindMismatch {
        op: &'static str,
        operand: ValueKind,
    },

    #[error("Kind mismatch in {op} reduction: {operand}")]
    ReduceKindMismatch {
        op: &'static str,
        operand: ValueKind,
    },

    #[error("{op} expects a geometry on top of the stack")]
    ExpectedGeometry { op: &'static str },

    #[error("Geometry operand is not a value in {op}")]
    UnexpectedGeometry { op: &'static str },

    #[error("Unknown quantity: {name}")]
    UnknownQuantity { name: String },

    #[error("Quantity '{name}' is {actual} but the program expects {declared}")]
    QuantityKindMismatch {
        name: String,
        declared: ValueKind,
        actual: ValueKind,
    },

    #[error("Unknown geometry: {name}")]
    UnknownGeometry { name: String },

    #[error("Geometry '{name}' is a {actual} but the program expects a {declared}")]
    GeometryDomainMismatch {
        name: String,
        declared: GeomDomain,
        actual: GeomDomain,
    },

    #[error("Unknown named result: {name}")]
    UnknownNamed { name: String },

    #[error("Empty domain: geometry '{name}' has no samples")]
    EmptyDomain { name: String },

    #[error("Length mismatch for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Invalid field context: {what}")]
    InvalidContext { what: String },

    #[error(transparent)]
    Expr(#[from] ExprError),

    #[error(transparent)]
    Core(#[from] FcError),
}
