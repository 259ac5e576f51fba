//! Reference stack engine.
//!
//! `StackEngine` is the in-memory `CalcBackend`: it executes programs
//! against a `FieldContext`, holding field columns, broadcast literals,
//! and geometry references on one operand stack. Results registered with
//! `store_named` live for the engine's lifetime and can be copied back
//! with `push_named`.

use std::collections::HashMap;

use fc_core::{Complex64, Real, Value, ValueKind, Vec3};
use fc_expr::{BinaryOp, GeomDomain, ReduceOp, UnaryOp};

use crate::backend::CalcBackend;
use crate::context::{FieldContext, FieldData, GeometrySet};
use crate::error::{EngineError, EngineResult};
use crate::kernel;

/// One operand-stack slot.
#[derive(Debug, Clone)]
pub enum Slot<'a> {
    /// A literal, broadcast over any field it meets.
    Uniform(Value),
    /// A per-point column.
    Field(FieldData),
    /// A geometry operand awaiting a reduction.
    Geom(&'a GeometrySet),
}

impl Slot<'_> {
    fn kind(&self, op: &'static str) -> EngineResult<ValueKind> {
        match self {
            Slot::Uniform(v) => Ok(v.kind()),
            Slot::Field(f) => Ok(f.kind()),
            Slot::Geom(_) => Err(EngineError::UnexpectedGeometry { op }),
        }
    }
}

/// Result of evaluating a program: a single value (reductions, pure
/// literal arithmetic) or a per-point field.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult {
    Value(Value),
    Field(FieldData),
}

impl EvalResult {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Value(v) => v.kind(),
            Self::Field(f) => f.kind(),
        }
    }
}

/// The reference calculator backend over sampled field data.
pub struct StackEngine<'a> {
    ctx: &'a FieldContext,
    stack: Vec<Slot<'a>>,
    named: HashMap<String, Slot<'a>>,
}

impl<'a> StackEngine<'a> {
    pub fn new(ctx: &'a FieldContext) -> Self {
        Self {
            ctx,
            stack: Vec::new(),
            named: HashMap::new(),
        }
    }

    /// Pop the final result off the stack.
    pub fn pop_result(&mut self) -> EngineResult<EvalResult> {
        match self.pop("result", 1)? {
            Slot::Uniform(v) => Ok(EvalResult::Value(v)),
            Slot::Field(f) => Ok(EvalResult::Field(f)),
            Slot::Geom(_) => Err(EngineError::UnexpectedGeometry { op: "result" }),
        }
    }

    fn pop(&mut self, op: &'static str, wanted: usize) -> EngineResult<Slot<'a>> {
        if self.stack.len() < wanted {
            return Err(EngineError::StackUnderflow {
                op,
                wanted,
                have: self.stack.len(),
            });
        }
        Ok(self.stack.pop().expect("length checked"))
    }

    fn reduce_samples(
        &self,
        op: ReduceOp,
        geom: &GeometrySet,
        operand: &Slot<'a>,
    ) -> EngineResult<Value> {
        if geom.samples.is_empty() {
            return Err(EngineError::EmptyDomain {
                name: geom.name.clone(),
            });
        }

        let operand_kind = operand.kind(op.mnemonic())?;
        op.result_kind(operand_kind)
            .ok_or(EngineError::ReduceKindMismatch {
                op: op.mnemonic(),
                operand: operand_kind,
            })?;

        let value_at = |i: usize| -> Value {
            match operand {
                Slot::Uniform(v) => *v,
                Slot::Field(f) => f.values()[i],
                Slot::Geom(_) => unreachable!("kind() rejects geometry operands"),
            }
        };
        let weights = self.ctx.weights();

        let result = match op {
            ReduceOp::Integrate | ReduceOp::Mean => {
                let mut acc_s = 0.0_f64;
                let mut acc_c = Complex64::new(0.0, 0.0);
                let mut acc_v = Vec3::zeros();
                let mut total_w = 0.0_f64;
                for &i in &geom.samples {
                    let w = weights[i];
                    total_w += w;
                    match value_at(i) {
                        Value::Scalar(s) => acc_s += w * s,
                        Value::Complex(c) => acc_c += c * w,
                        Value::Vector(v) => acc_v += v * w,
                    }
                }
                let integral = match operand_kind {
                    ValueKind::Scalar => Value::Scalar(acc_s),
                    ValueKind::Complex => Value::Complex(acc_c),
                    ValueKind::Vector => Value::Vector(acc_v),
                };
                match op {
                    ReduceOp::Integrate => integral,
                    _ => match integral {
                        Value::Scalar(s) => Value::Scalar(s / total_w),
                        Value::Complex(c) => Value::Complex(c / total_w),
                        Value::Vector(v) => Value::Vector(v / total_w),
                    },
                }
            }
            ReduceOp::Maximum | ReduceOp::Minimum => {
                let mut extremum: Option<Real> = None;
                for &i in &geom.samples {
                    let s = value_at(i).as_scalar().ok_or(
                        EngineError::ReduceKindMismatch {
                            op: op.mnemonic(),
                            operand: operand_kind,
                        },
                    )?;
                    extremum = Some(match (extremum, op) {
                        (None, _) => s,
                        (Some(e), ReduceOp::Maximum) => e.max(s),
                        (Some(e), _) => e.min(s),
                    });
                }
                Value::Scalar(extremum.unwrap_or(Real::NAN))
            }
        };

        Ok(result.ensure_finite(op.mnemonic())?)
    }
}

impl CalcBackend for StackEngine<'_> {
    fn push_scalar(&mut self, value: Real) -> EngineResult<()> {
        self.stack.push(Slot::Uniform(Value::Scalar(value)));
        Ok(())
    }

    fn push_complex(&mut self, value: Complex64) -> EngineResult<()> {
        self.stack.push(Slot::Uniform(Value::Complex(value)));
        Ok(())
    }

    fn push_vector(&mut self, value: Vec3) -> EngineResult<()> {
        self.stack.push(Slot::Uniform(Value::Vector(value)));
        Ok(())
    }

    fn push_quantity(&mut self, name: &str, kind: ValueKind) -> EngineResult<()> {
        let data = self
            .ctx
            .quantity(name)
            .ok_or_else(|| EngineError::UnknownQuantity {
                name: name.to_string(),
            })?;
        if data.kind() != kind {
            return Err(EngineError::QuantityKindMismatch {
                name: name.to_string(),
                declared: kind,
                actual: data.kind(),
            });
        }
        self.stack.push(Slot::Field(data.clone()));
        Ok(())
    }

    fn push_geometry(&mut self, name: &str, domain: GeomDomain) -> EngineResult<()> {
        let geom = self
            .ctx
            .geometry(name)
            .ok_or_else(|| EngineError::UnknownGeometry {
                name: name.to_string(),
            })?;
        if geom.domain != domain {
            return Err(EngineError::GeometryDomainMismatch {
                name: name.to_string(),
                declared: domain,
                actual: geom.domain,
            });
        }
        self.stack.push(Slot::Geom(geom));
        Ok(())
    }

    fn push_named(&mut self, name: &str) -> EngineResult<()> {
        let slot = self
            .named
            .get(name)
            .ok_or_else(|| EngineError::UnknownNamed {
                name: name.to_string(),
            })?
            .clone();
        self.stack.push(slot);
        Ok(())
    }

    fn apply_unary(&mut self, op: UnaryOp) -> EngineResult<()> {
        let operand = self.pop(op.mnemonic(), 1)?;
        let result = match operand {
            Slot::Uniform(v) => Slot::Uniform(kernel::unary_value(op, v)?),
            Slot::Field(f) => {
                let kind = kernel::unary_result_kind(op, f.kind())?;
                let values = kernel::unary_column(op, f.values())?;
                Slot::Field(FieldData::new(kind, values)?)
            }
            Slot::Geom(_) => {
                return Err(EngineError::UnexpectedGeometry { op: op.mnemonic() });
            }
        };
        self.stack.push(result);
        Ok(())
    }

    fn apply_binary(&mut self, op: BinaryOp) -> EngineResult<()> {
        let rhs = self.pop(op.mnemonic(), 2)?;
        let lhs = self.pop(op.mnemonic(), 2)?;
        let result = match (lhs, rhs) {
            (Slot::Uniform(a), Slot::Uniform(b)) => Slot::Uniform(kernel::binary_value(op, a, b)?),
            (Slot::Field(a), Slot::Uniform(b)) => {
                let kind = kernel::binary_result_kind(op, a.kind(), b.kind())?;
                let values = kernel::binary_column_uniform(op, a.values(), b)?;
                Slot::Field(FieldData::new(kind, values)?)
            }
            (Slot::Uniform(a), Slot::Field(b)) => {
                let kind = kernel::binary_result_kind(op, a.kind(), b.kind())?;
                let values = kernel::binary_uniform_column(op, a, b.values())?;
                Slot::Field(FieldData::new(kind, values)?)
            }
            (Slot::Field(a), Slot::Field(b)) => {
                let kind = kernel::binary_result_kind(op, a.kind(), b.kind())?;
                let values = kernel::binary_columns(op, a.values(), b.values())?;
                Slot::Field(FieldData::new(kind, values)?)
            }
            (Slot::Geom(_), _) | (_, Slot::Geom(_)) => {
                return Err(EngineError::UnexpectedGeometry { op: op.mnemonic() });
            }
        };
        self.stack.push(result);
        Ok(())
    }

    fn apply_reduce(&mut self, op: ReduceOp) -> EngineResult<()> {
        let top = self.pop(op.mnemonic(), 2)?;
        let geom = match top {
            Slot::Geom(g) => g,
            _ => return Err(EngineError::ExpectedGeometry { op: op.mnemonic() }),
        };
        let operand = self.pop(op.mnemonic(), 1)?;
        let result = self.reduce_samples(op, geom, &operand)?;
        self.stack.push(Slot::Uniform(result));
        Ok(())
    }

    fn store_named(&mut self, name: &str) -> EngineResult<()> {
        let slot = self.pop("store_named", 1)?;
        if matches!(slot, Slot::Geom(_)) {
            return Err(EngineError::UnexpectedGeometry { op: "store_named" });
        }
        self.named.insert(name.to_string(), slot);
        Ok(())
    }

    fn stack_len(&self) -> usize {
        self.stack.len()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::backend::replay;
    use fc_core::{Tolerances, nearly_equal};
    use fc_expr::{Expr, NoNamed, compile};
    use proptest::prelude::*;

    /// Direct recursive interpretation of a scalar literal tree.
    fn eval_direct(expr: &Expr) -> Real {
        match expr {
            Expr::Literal(v) => *v,
            Expr::Unary { op, operand } => {
                let v = eval_direct(operand);
                match op {
                    UnaryOp::Neg => -v,
                    _ => unreachable!("strategy emits Neg only"),
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let a = eval_direct(lhs);
                let b = eval_direct(rhs);
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    _ => unreachable!("strategy emits Add/Sub/Mul only"),
                }
            }
            _ => unreachable!("strategy emits literals and arithmetic only"),
        }
    }

    fn arb_expr() -> impl Strategy<Value = Expr> {
        let leaf = (-10.0_f64..10.0).prop_map(Expr::literal);
        leaf.prop_recursive(4, 32, 2, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone()).prop_map(|(a, b)| a + b),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| a - b),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| a * b),
                inner.prop_map(|a| -a),
            ]
        })
    }

    proptest! {
        #[test]
        fn engine_replay_matches_direct_interpretation(expr in arb_expr()) {
            let expected = eval_direct(&expr);

            let compiled = compile(&expr, &NoNamed).unwrap();
            let ctx = FieldContext::with_unit_weights(vec![]);
            let mut engine = StackEngine::new(&ctx);
            replay(&compiled.program, &mut engine).unwrap();

            match engine.pop_result().unwrap() {
                EvalResult::Value(Value::Scalar(got)) => {
                    prop_assert!(nearly_equal(got, expected, Tolerances::default()));
                }
                other => prop_assert!(false, "expected scalar, got {other:?}"),
            }
        }
    }
}
