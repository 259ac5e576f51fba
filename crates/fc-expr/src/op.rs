//! Calculator operator vocabulary and typing rules.
//!
//! The opcodes here are the instruction set of the stack calculator:
//! - **Unary**: pop one operand, push one result
//! - **Binary**: pop two operands (right on top), push one result
//! - **Reduce**: pop a geometry and a field operand, push one aggregate
//!
//! `result_kind` methods encode the typing rules; they return `None` for
//! unsupported operand kinds and the compiler turns that into an error.

use core::fmt;

use fc_core::ValueKind;
use serde::{Deserialize, Serialize};

/// Geometry domain a reduction ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeomDomain {
    Point,
    Line,
    Surface,
    Volume,
}

impl GeomDomain {
    pub fn label(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Line => "line",
            Self::Surface => "surface",
            Self::Volume => "volume",
        }
    }
}

impl fmt::Display for GeomDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One-operand opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Abs,
    Sqrt,
    Exp,
    Ln,
    Log10,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Real,
    Imag,
    Conj,
    Phase,
    Mag,
    CompX,
    CompY,
    CompZ,
    Normalize,
}

impl UnaryOp {
    /// Opcode mnemonic as it appears in RPN listings and scripts.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Neg => "neg",
            Self::Abs => "abs",
            Self::Sqrt => "sqrt",
            Self::Exp => "exp",
            Self::Ln => "ln",
            Self::Log10 => "log10",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Real => "real",
            Self::Imag => "imag",
            Self::Conj => "conj",
            Self::Phase => "phase",
            Self::Mag => "mag",
            Self::CompX => "comp_x",
            Self::CompY => "comp_y",
            Self::CompZ => "comp_z",
            Self::Normalize => "normalize",
        }
    }

    /// Result kind for an operand kind, or `None` if unsupported.
    pub fn result_kind(self, operand: ValueKind) -> Option<ValueKind> {
        use ValueKind::{Complex, Scalar, Vector};
        match self {
            Self::Neg => Some(operand),
            Self::Abs
            | Self::Sqrt
            | Self::Exp
            | Self::Ln
            | Self::Log10
            | Self::Sin
            | Self::Cos
            | Self::Tan
            | Self::Asin
            | Self::Acos
            | Self::Atan => (operand == Scalar).then_some(Scalar),
            Self::Real | Self::Imag | Self::Phase => (operand == Complex).then_some(Scalar),
            Self::Conj => (operand == Complex).then_some(Complex),
            Self::Mag => matches!(operand, Vector | Complex).then_some(Scalar),
            Self::CompX | Self::CompY | Self::CompZ => (operand == Vector).then_some(Scalar),
            Self::Normalize => (operand == Vector).then_some(Vector),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Two-operand opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Atan2,
    Min,
    Max,
    Dot,
    Cross,
}

impl BinaryOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Pow => "pow",
            Self::Atan2 => "atan2",
            Self::Min => "min",
            Self::Max => "max",
            Self::Dot => "dot",
            Self::Cross => "cross",
        }
    }

    /// Result kind for an operand kind pair, or `None` if incompatible.
    ///
    /// Scalars promote to complex under the arithmetic operators; scalars
    /// scale vectors under `Mul`/`Div`; complex and vector never mix.
    pub fn result_kind(self, lhs: ValueKind, rhs: ValueKind) -> Option<ValueKind> {
        use ValueKind::{Scalar, Vector};
        match self {
            Self::Add | Self::Sub => ValueKind::join(lhs, rhs),
            Self::Mul => match (lhs, rhs) {
                (Scalar, Vector) | (Vector, Scalar) => Some(Vector),
                // no elementwise vector product; dot and cross are explicit
                (Vector, Vector) => None,
                _ => ValueKind::join(lhs, rhs),
            },
            Self::Div => match (lhs, rhs) {
                (Vector, Scalar) => Some(Vector),
                (Vector, Vector) => None,
                _ => ValueKind::join(lhs, rhs),
            },
            Self::Pow | Self::Atan2 | Self::Min | Self::Max => {
                (lhs == Scalar && rhs == Scalar).then_some(Scalar)
            }
            Self::Dot => (lhs == Vector && rhs == Vector).then_some(Scalar),
            Self::Cross => (lhs == Vector && rhs == Vector).then_some(Vector),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Aggregating opcodes: collapse a field over a geometry into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceOp {
    Integrate,
    Maximum,
    Minimum,
    Mean,
}

impl ReduceOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Integrate => "integrate",
            Self::Maximum => "maximum",
            Self::Minimum => "minimum",
            Self::Mean => "mean",
        }
    }

    /// Result kind for an operand kind, or `None` if unsupported.
    pub fn result_kind(self, operand: ValueKind) -> Option<ValueKind> {
        match self {
            // Weighted sums and averages are defined componentwise.
            Self::Integrate | Self::Mean => Some(operand),
            // Extrema need an ordering.
            Self::Maximum | Self::Minimum => {
                (operand == ValueKind::Scalar).then_some(ValueKind::Scalar)
            }
        }
    }

    /// Whether the reduction is meaningful over the given domain.
    ///
    /// Integration needs a measure; a point carries none.
    pub fn accepts_domain(self, domain: GeomDomain) -> bool {
        match self {
            Self::Integrate => !matches!(domain, GeomDomain::Point),
            Self::Maximum | Self::Minimum | Self::Mean => true,
        }
    }
}

impl fmt::Display for ReduceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ValueKind::{Complex, Scalar, Vector};

    #[test]
    fn add_promotes_scalar_to_complex() {
        assert_eq!(BinaryOp::Add.result_kind(Scalar, Complex), Some(Complex));
        assert_eq!(BinaryOp::Add.result_kind(Scalar, Vector), None);
    }

    #[test]
    fn mul_scales_vectors() {
        assert_eq!(BinaryOp::Mul.result_kind(Scalar, Vector), Some(Vector));
        assert_eq!(BinaryOp::Mul.result_kind(Vector, Scalar), Some(Vector));
        assert_eq!(BinaryOp::Div.result_kind(Vector, Scalar), Some(Vector));
        // Scalar / vector and elementwise vector products are not defined.
        assert_eq!(BinaryOp::Div.result_kind(Scalar, Vector), None);
        assert_eq!(BinaryOp::Mul.result_kind(Vector, Vector), None);
        assert_eq!(BinaryOp::Div.result_kind(Vector, Vector), None);
    }

    #[test]
    fn dot_and_cross_are_vector_only() {
        assert_eq!(BinaryOp::Dot.result_kind(Vector, Vector), Some(Scalar));
        assert_eq!(BinaryOp::Cross.result_kind(Vector, Vector), Some(Vector));
        assert_eq!(BinaryOp::Dot.result_kind(Scalar, Vector), None);
    }

    #[test]
    fn mag_accepts_vector_and_complex() {
        assert_eq!(UnaryOp::Mag.result_kind(Vector), Some(Scalar));
        assert_eq!(UnaryOp::Mag.result_kind(Complex), Some(Scalar));
        assert_eq!(UnaryOp::Mag.result_kind(Scalar), None);
    }

    #[test]
    fn extrema_are_scalar_only() {
        assert_eq!(ReduceOp::Maximum.result_kind(Scalar), Some(Scalar));
        assert_eq!(ReduceOp::Maximum.result_kind(Vector), None);
        assert_eq!(ReduceOp::Integrate.result_kind(Vector), Some(Vector));
    }

    #[test]
    fn integrate_rejects_point_domains() {
        assert!(!ReduceOp::Integrate.accepts_domain(GeomDomain::Point));
        assert!(ReduceOp::Integrate.accepts_domain(GeomDomain::Surface));
        assert!(ReduceOp::Maximum.accepts_domain(GeomDomain::Point));
    }
}
