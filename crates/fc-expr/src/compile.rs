//! Postfix compilation of expression trees.
//!
//! Compilation is a single post-order walk: each node emits its operands
//! left-to-right, then its own instruction. Kind checking happens here,
//! not at construction, so this is also where every typing error
//! surfaces.

use fc_core::ValueKind;

use crate::error::{ExprError, ExprResult};
use crate::expr::{Expr, GeomRef, NamedKinds};
use crate::op::{BinaryOp, ReduceOp, UnaryOp};
use crate::program::{Instr, Program};

/// A compiled expression: the postfix program plus its inferred kind.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    pub program: Program,
    pub kind: ValueKind,
}

/// Compile an expression tree into a postfix program.
pub fn compile(expr: &Expr, names: &dyn NamedKinds) -> ExprResult<CompiledExpr> {
    let mut instrs = Vec::with_capacity(expr.node_count());
    let kind = emit(expr, names, &mut instrs)?;
    Ok(CompiledExpr {
        program: Program::new(instrs),
        kind,
    })
}

/// Infer the kind of an expression without emitting a program.
pub fn infer_kind(expr: &Expr, names: &dyn NamedKinds) -> ExprResult<ValueKind> {
    match expr {
        Expr::Literal(_) | Expr::Constant(_) => Ok(ValueKind::Scalar),
        Expr::ComplexLit(_) => Ok(ValueKind::Complex),
        Expr::VectorLit(_) => Ok(ValueKind::Vector),
        Expr::Quantity { kind, .. } => Ok(*kind),
        Expr::Named { name } => resolve_named(name, names),
        Expr::Unary { op, operand } => unary_kind(*op, infer_kind(operand, names)?),
        Expr::Binary { op, lhs, rhs } => binary_kind(
            *op,
            infer_kind(lhs, names)?,
            infer_kind(rhs, names)?,
        ),
        Expr::Reduce { op, geom, operand } => {
            reduce_kind(*op, geom, infer_kind(operand, names)?)
        }
    }
}

impl Expr {
    /// Convenience wrapper around [`infer_kind`].
    pub fn infer_kind(&self, names: &dyn NamedKinds) -> ExprResult<ValueKind> {
        infer_kind(self, names)
    }
}

fn emit(expr: &Expr, names: &dyn NamedKinds, out: &mut Vec<Instr>) -> ExprResult<ValueKind> {
    match expr {
        Expr::Literal(value) => {
            out.push(Instr::PushScalar { value: *value });
            Ok(ValueKind::Scalar)
        }
        Expr::ComplexLit(v) => {
            out.push(Instr::PushComplex { re: v.re, im: v.im });
            Ok(ValueKind::Complex)
        }
        Expr::VectorLit(v) => {
            out.push(Instr::PushVector {
                x: v.x,
                y: v.y,
                z: v.z,
            });
            Ok(ValueKind::Vector)
        }
        Expr::Quantity { name, kind } => {
            out.push(Instr::PushQuantity {
                name: name.clone(),
                kind: *kind,
            });
            Ok(*kind)
        }
        Expr::Named { name } => {
            let kind = resolve_named(name, names)?;
            out.push(Instr::PushNamed { name: name.clone() });
            Ok(kind)
        }
        Expr::Constant(c) => {
            out.push(Instr::PushScalar { value: c.value() });
            Ok(ValueKind::Scalar)
        }
        Expr::Unary { op, operand } => {
            let operand_kind = emit(operand, names, out)?;
            let kind = unary_kind(*op, operand_kind)?;
            out.push(Instr::Unary { op: *op });
            Ok(kind)
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs_kind = emit(lhs, names, out)?;
            let rhs_kind = emit(rhs, names, out)?;
            let kind = binary_kind(*op, lhs_kind, rhs_kind)?;
            out.push(Instr::Binary { op: *op });
            Ok(kind)
        }
        Expr::Reduce { op, geom, operand } => {
            let operand_kind = emit(operand, names, out)?;
            let kind = reduce_kind(*op, geom, operand_kind)?;
            out.push(Instr::PushGeometry {
                name: geom.name.clone(),
                domain: geom.domain,
            });
            out.push(Instr::Reduce { op: *op });
            Ok(kind)
        }
    }
}

fn resolve_named(name: &str, names: &dyn NamedKinds) -> ExprResult<ValueKind> {
    names.kind_of(name).ok_or_else(|| ExprError::UnknownNamed {
        name: name.to_string(),
    })
}

fn unary_kind(op: UnaryOp, operand: ValueKind) -> ExprResult<ValueKind> {
    op.result_kind(operand)
        .ok_or(ExprError::UnaryKindMismatch {
            op: op.mnemonic(),
            operand,
        })
}

fn binary_kind(op: BinaryOp, lhs: ValueKind, rhs: ValueKind) -> ExprResult<ValueKind> {
    op.result_kind(lhs, rhs).ok_or(ExprError::KindMismatch {
        op: op.mnemonic(),
        lhs,
        rhs,
    })
}

fn reduce_kind(op: ReduceOp, geom: &GeomRef, operand: ValueKind) -> ExprResult<ValueKind> {
    if !op.accepts_domain(geom.domain) {
        return Err(ExprError::DomainMismatch {
            op: op.mnemonic(),
            domain: geom.domain,
            name: geom.name.clone(),
        });
    }
    op.result_kind(operand)
        .ok_or(ExprError::ReduceKindMismatch {
            op: op.mnemonic(),
            operand,
        })
}
