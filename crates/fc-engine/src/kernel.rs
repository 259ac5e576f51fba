//! Value- and column-level operator kernels.
//!
//! `unary_value` / `binary_value` define the runtime semantics of every
//! opcode on single values; the column helpers map them over field data,
//! in parallel once columns are large enough to pay for it. Arithmetic is
//! IEEE elementwise: division by zero and domain errors produce infs and
//! NaNs that propagate until a reduction checks them.

use fc_core::{Complex64, Value, ValueKind};
use rayon::prelude::*;

use fc_expr::{BinaryOp, UnaryOp};

use crate::error::{EngineError, EngineResult};

/// Columns at least this long are mapped with rayon.
const PAR_THRESHOLD: usize = 4096;

/// Apply a unary opcode to one value.
pub fn unary_value(op: UnaryOp, v: Value) -> EngineResult<Value> {
    use UnaryOp::*;
    use Value::{Complex, Scalar, Vector};

    let mismatch = || EngineError::UnaryKindMismatch {
        op: op.mnemonic(),
        operand: v.kind(),
    };

    Ok(match (op, v) {
        (Neg, Scalar(s)) => Value::Scalar(-s),
        (Neg, Complex(c)) => Value::Complex(-c),
        (Neg, Vector(x)) => Value::Vector(-x),

        (Abs, Scalar(s)) => Value::Scalar(s.abs()),
        (Sqrt, Scalar(s)) => Value::Scalar(s.sqrt()),
        (Exp, Scalar(s)) => Value::Scalar(s.exp()),
        (Ln, Scalar(s)) => Value::Scalar(s.ln()),
        (Log10, Scalar(s)) => Value::Scalar(s.log10()),
        (Sin, Scalar(s)) => Value::Scalar(s.sin()),
        (Cos, Scalar(s)) => Value::Scalar(s.cos()),
        (Tan, Scalar(s)) => Value::Scalar(s.tan()),
        (Asin, Scalar(s)) => Value::Scalar(s.asin()),
        (Acos, Scalar(s)) => Value::Scalar(s.acos()),
        (Atan, Scalar(s)) => Value::Scalar(s.atan()),

        (Real, Complex(c)) => Value::Scalar(c.re),
        (Imag, Complex(c)) => Value::Scalar(c.im),
        (Conj, Complex(c)) => Value::Complex(c.conj()),
        (Phase, Complex(c)) => Value::Scalar(c.arg()),
        (Mag, Complex(c)) => Value::Scalar(c.norm()),

        (Mag, Vector(x)) => Value::Scalar(x.norm()),
        (CompX, Vector(x)) => Value::Scalar(x.x),
        (CompY, Vector(x)) => Value::Scalar(x.y),
        (CompZ, Vector(x)) => Value::Scalar(x.z),
        (Normalize, Vector(x)) => Value::Vector(x / x.norm()),

        _ => return Err(mismatch()),
    })
}

/// Apply a binary opcode to a value pair (left, right).
pub fn binary_value(op: BinaryOp, a: Value, b: Value) -> EngineResult<Value> {
    use BinaryOp::*;
    use Value::{Complex, Scalar, Vector};

    let mismatch = || EngineError::KindMismatch {
        op: op.mnemonic(),
        lhs: a.kind(),
        rhs: b.kind(),
    };

    // Scalar operands promote to complex when paired with complex.
    let complex_pair = |a: Value, b: Value| -> Option<(Complex64, Complex64)> {
        match (a, b) {
            (Complex(x), Complex(y)) => Some((x, y)),
            (Complex(x), Scalar(y)) => Some((x, Complex64::new(y, 0.0))),
            (Scalar(x), Complex(y)) => Some((Complex64::new(x, 0.0), y)),
            _ => None,
        }
    };

    Ok(match op {
        Add => match (a, b) {
            (Scalar(x), Scalar(y)) => Value::Scalar(x + y),
            (Vector(x), Vector(y)) => Value::Vector(x + y),
            _ => Value::Complex(complex_pair(a, b).ok_or_else(mismatch).map(|(x, y)| x + y)?),
        },
        Sub => match (a, b) {
            (Scalar(x), Scalar(y)) => Value::Scalar(x - y),
            (Vector(x), Vector(y)) => Value::Vector(x - y),
            _ => Value::Complex(complex_pair(a, b).ok_or_else(mismatch).map(|(x, y)| x - y)?),
        },
        Mul => match (a, b) {
            (Scalar(x), Scalar(y)) => Value::Scalar(x * y),
            (Scalar(x), Vector(y)) => Value::Vector(y * x),
            (Vector(x), Scalar(y)) => Value::Vector(x * y),
            (Vector(_), Vector(_)) => return Err(mismatch()),
            _ => Value::Complex(complex_pair(a, b).ok_or_else(mismatch).map(|(x, y)| x * y)?),
        },
        Div => match (a, b) {
            (Scalar(x), Scalar(y)) => Value::Scalar(x / y),
            (Vector(x), Scalar(y)) => Value::Vector(x / y),
            (Vector(_), Vector(_)) | (Scalar(_), Vector(_)) | (Complex(_), Vector(_)) => {
                return Err(mismatch());
            }
            _ => Value::Complex(complex_pair(a, b).ok_or_else(mismatch).map(|(x, y)| x / y)?),
        },
        Pow => match (a, b) {
            (Scalar(x), Scalar(y)) => Value::Scalar(x.powf(y)),
            _ => return Err(mismatch()),
        },
        Atan2 => match (a, b) {
            (Scalar(x), Scalar(y)) => Value::Scalar(x.atan2(y)),
            _ => return Err(mismatch()),
        },
        Min => match (a, b) {
            (Scalar(x), Scalar(y)) => Value::Scalar(x.min(y)),
            _ => return Err(mismatch()),
        },
        Max => match (a, b) {
            (Scalar(x), Scalar(y)) => Value::Scalar(x.max(y)),
            _ => return Err(mismatch()),
        },
        Dot => match (a, b) {
            (Vector(x), Vector(y)) => Value::Scalar(x.dot(&y)),
            _ => return Err(mismatch()),
        },
        Cross => match (a, b) {
            (Vector(x), Vector(y)) => Value::Vector(x.cross(&y)),
            _ => return Err(mismatch()),
        },
    })
}

/// Map a unary opcode over a column.
pub fn unary_column(op: UnaryOp, values: &[Value]) -> EngineResult<Vec<Value>> {
    if values.len() >= PAR_THRESHOLD {
        values.par_iter().map(|&v| unary_value(op, v)).collect()
    } else {
        values.iter().map(|&v| unary_value(op, v)).collect()
    }
}

/// Map a binary opcode over two aligned columns.
pub fn binary_columns(op: BinaryOp, a: &[Value], b: &[Value]) -> EngineResult<Vec<Value>> {
    if a.len() != b.len() {
        return Err(EngineError::LengthMismatch {
            what: "field columns",
            expected: a.len(),
            got: b.len(),
        });
    }
    if a.len() >= PAR_THRESHOLD {
        a.par_iter()
            .zip(b.par_iter())
            .map(|(&x, &y)| binary_value(op, x, y))
            .collect()
    } else {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| binary_value(op, x, y))
            .collect()
    }
}

/// Map a binary opcode over a column with a uniform right operand.
pub fn binary_column_uniform(op: BinaryOp, a: &[Value], b: Value) -> EngineResult<Vec<Value>> {
    if a.len() >= PAR_THRESHOLD {
        a.par_iter().map(|&x| binary_value(op, x, b)).collect()
    } else {
        a.iter().map(|&x| binary_value(op, x, b)).collect()
    }
}

/// Map a binary opcode over a column with a uniform left operand.
pub fn binary_uniform_column(op: BinaryOp, a: Value, b: &[Value]) -> EngineResult<Vec<Value>> {
    if b.len() >= PAR_THRESHOLD {
        b.par_iter().map(|&y| binary_value(op, a, y)).collect()
    } else {
        b.iter().map(|&y| binary_value(op, a, y)).collect()
    }
}

/// Runtime result kind of a binary application; mirrors the compiler rule.
pub fn binary_result_kind(op: BinaryOp, lhs: ValueKind, rhs: ValueKind) -> EngineResult<ValueKind> {
    op.result_kind(lhs, rhs)
        .ok_or(EngineError::KindMismatch {
            op: op.mnemonic(),
            lhs,
            rhs,
        })
}

/// Runtime result kind of a unary application; mirrors the compiler rule.
pub fn unary_result_kind(op: UnaryOp, operand: ValueKind) -> EngineResult<ValueKind> {
    op.result_kind(operand)
        .ok_or(EngineError::UnaryKindMismatch {
            op: op.mnemonic(),
            operand,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::{Tolerances, nearly_equal};

    #[test]
    fn scalar_arithmetic() {
        let v = binary_value(BinaryOp::Add, Value::scalar(2.0), Value::scalar(0.5)).unwrap();
        assert_eq!(v, Value::scalar(2.5));

        let v = binary_value(BinaryOp::Pow, Value::scalar(2.0), Value::scalar(10.0)).unwrap();
        assert_eq!(v, Value::scalar(1024.0));
    }

    #[test]
    fn scalar_promotes_next_to_complex() {
        let v = binary_value(BinaryOp::Mul, Value::scalar(2.0), Value::complex(1.0, -1.0)).unwrap();
        assert_eq!(v, Value::complex(2.0, -2.0));
    }

    #[test]
    fn vector_products() {
        let x = Value::vector(1.0, 0.0, 0.0);
        let y = Value::vector(0.0, 1.0, 0.0);
        assert_eq!(binary_value(BinaryOp::Dot, x, y).unwrap(), Value::scalar(0.0));
        assert_eq!(
            binary_value(BinaryOp::Cross, x, y).unwrap(),
            Value::vector(0.0, 0.0, 1.0)
        );
        // elementwise vector product stays undefined at runtime too
        assert!(binary_value(BinaryOp::Mul, x, y).is_err());
    }

    #[test]
    fn division_by_zero_is_ieee() {
        let v = binary_value(BinaryOp::Div, Value::scalar(1.0), Value::scalar(0.0)).unwrap();
        assert_eq!(v, Value::scalar(f64::INFINITY));
    }

    #[test]
    fn complex_unaries() {
        let c = Value::complex(3.0, 4.0);
        assert_eq!(unary_value(UnaryOp::Mag, c).unwrap(), Value::scalar(5.0));
        assert_eq!(unary_value(UnaryOp::Real, c).unwrap(), Value::scalar(3.0));
        assert_eq!(
            unary_value(UnaryOp::Conj, c).unwrap(),
            Value::complex(3.0, -4.0)
        );
        let phase = unary_value(UnaryOp::Phase, c).unwrap();
        let got = phase.as_scalar().unwrap();
        assert!(nearly_equal(got, (4.0_f64 / 3.0).atan(), Tolerances::default()));
    }

    #[test]
    fn vector_unaries() {
        let v = Value::vector(3.0, 0.0, 4.0);
        assert_eq!(unary_value(UnaryOp::Mag, v).unwrap(), Value::scalar(5.0));
        assert_eq!(unary_value(UnaryOp::CompZ, v).unwrap(), Value::scalar(4.0));
        assert_eq!(
            unary_value(UnaryOp::Normalize, v).unwrap(),
            Value::vector(0.6, 0.0, 0.8)
        );
    }

    #[test]
    fn kind_mismatches_are_reported() {
        assert!(unary_value(UnaryOp::Sqrt, Value::vector(1.0, 1.0, 1.0)).is_err());
        assert!(unary_value(UnaryOp::Real, Value::scalar(1.0)).is_err());
        assert!(
            binary_value(
                BinaryOp::Add,
                Value::complex(1.0, 0.0),
                Value::vector(1.0, 0.0, 0.0)
            )
            .is_err()
        );
    }

    #[test]
    fn column_helpers_match_value_semantics() {
        let a = vec![Value::scalar(1.0), Value::scalar(2.0)];
        let b = vec![Value::scalar(10.0), Value::scalar(20.0)];
        assert_eq!(
            binary_columns(BinaryOp::Add, &a, &b).unwrap(),
            vec![Value::scalar(11.0), Value::scalar(22.0)]
        );
        assert_eq!(
            binary_column_uniform(BinaryOp::Mul, &a, Value::scalar(3.0)).unwrap(),
            vec![Value::scalar(3.0), Value::scalar(6.0)]
        );
        assert_eq!(
            binary_uniform_column(BinaryOp::Sub, Value::scalar(1.0), &a).unwrap(),
            vec![Value::scalar(0.0), Value::scalar(-1.0)]
        );
        assert_eq!(
            unary_column(UnaryOp::Neg, &a).unwrap(),
            vec![Value::scalar(-1.0), Value::scalar(-2.0)]
        );
    }
}
