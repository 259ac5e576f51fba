//! Calculator backend contract.
//!
//! A `CalcBackend` is anything that understands the postfix instruction
//! set: the in-memory reference engine, the script recorder, or an
//! adapter for an external stack calculator. `replay` is the single
//! place instructions are dispatched.

use fc_core::{Complex64, Real, ValueKind, Vec3};
use fc_expr::{BinaryOp, GeomDomain, Instr, Program, ReduceOp, UnaryOp};

use crate::error::EngineResult;

/// Replay surface for compiled programs; one method per instruction,
/// plus `store_named` for registering the stack top under a name.
pub trait CalcBackend {
    fn push_scalar(&mut self, value: Real) -> EngineResult<()>;
    fn push_complex(&mut self, value: Complex64) -> EngineResult<()>;
    fn push_vector(&mut self, value: Vec3) -> EngineResult<()>;

    /// Push a named field quantity of the declared kind.
    fn push_quantity(&mut self, name: &str, kind: ValueKind) -> EngineResult<()>;

    /// Push a named geometry of the declared domain.
    fn push_geometry(&mut self, name: &str, domain: GeomDomain) -> EngineResult<()>;

    /// Push a copy of a previously stored named result.
    fn push_named(&mut self, name: &str) -> EngineResult<()>;

    fn apply_unary(&mut self, op: UnaryOp) -> EngineResult<()>;
    fn apply_binary(&mut self, op: BinaryOp) -> EngineResult<()>;
    fn apply_reduce(&mut self, op: ReduceOp) -> EngineResult<()>;

    /// Pop the stack top and register it under `name`.
    fn store_named(&mut self, name: &str) -> EngineResult<()>;

    fn stack_len(&self) -> usize;
}

/// Replay a compiled program against a backend.
pub fn replay(program: &Program, backend: &mut dyn CalcBackend) -> EngineResult<()> {
    for instr in program.iter() {
        match instr {
            Instr::PushScalar { value } => backend.push_scalar(*value)?,
            Instr::PushComplex { re, im } => backend.push_complex(Complex64::new(*re, *im))?,
            Instr::PushVector { x, y, z } => backend.push_vector(Vec3::new(*x, *y, *z))?,
            Instr::PushQuantity { name, kind } => backend.push_quantity(name, *kind)?,
            Instr::PushGeometry { name, domain } => backend.push_geometry(name, *domain)?,
            Instr::PushNamed { name } => backend.push_named(name)?,
            Instr::Unary { op } => backend.apply_unary(*op)?,
            Instr::Binary { op } => backend.apply_binary(*op)?,
            Instr::Reduce { op } => backend.apply_reduce(*op)?,
        }
    }
    Ok(())
}
