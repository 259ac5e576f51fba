//! Expression trees over named field quantities.
//!
//! An `Expr` is an immutable tree built from leaf references (literals,
//! named quantities, registered expressions, physical constants) combined
//! with the calculator opcodes. Trees are cheap to clone and carry no kind
//! information of their own: kinds are inferred when the tree is compiled
//! to a postfix program, so construction never fails and the `std::ops`
//! overloads stay total.

use core::fmt;
use std::collections::HashMap;

use fc_core::{Complex64, Real, ValueKind, Vec3};

use crate::op::{BinaryOp, GeomDomain, ReduceOp, UnaryOp};

/// Built-in physical and mathematical constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedConstant {
    Pi,
    Tau,
    /// Vacuum permittivity [F/m].
    Eps0,
    /// Vacuum permeability [H/m].
    Mu0,
    /// Speed of light in vacuum [m/s].
    C0,
}

impl NamedConstant {
    pub fn value(self) -> Real {
        match self {
            Self::Pi => core::f64::consts::PI,
            Self::Tau => core::f64::consts::TAU,
            Self::Eps0 => 8.854_187_812_8e-12,
            Self::Mu0 => 1.256_637_062_12e-6,
            Self::C0 => 299_792_458.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pi => "pi",
            Self::Tau => "tau",
            Self::Eps0 => "eps0",
            Self::Mu0 => "mu0",
            Self::C0 => "c0",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "pi" => Some(Self::Pi),
            "tau" => Some(Self::Tau),
            "eps0" => Some(Self::Eps0),
            "mu0" => Some(Self::Mu0),
            "c0" => Some(Self::C0),
            _ => None,
        }
    }
}

/// Reference to a named geometry a reduction ranges over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeomRef {
    pub name: String,
    pub domain: GeomDomain,
}

impl GeomRef {
    pub fn new(name: impl Into<String>, domain: GeomDomain) -> Self {
        Self {
            name: name.into(),
            domain,
        }
    }
}

/// Resolver for `Expr::Named` references.
///
/// Implemented by the calculator registry; the compiler consults it to
/// learn the kind of an already-registered expression.
pub trait NamedKinds {
    fn kind_of(&self, name: &str) -> Option<ValueKind>;
}

/// Resolver that knows no names; for expressions without `Named` leaves.
pub struct NoNamed;

impl NamedKinds for NoNamed {
    fn kind_of(&self, _name: &str) -> Option<ValueKind> {
        None
    }
}

impl NamedKinds for HashMap<String, ValueKind> {
    fn kind_of(&self, name: &str) -> Option<ValueKind> {
        self.get(name).copied()
    }
}

/// An expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Real scalar literal.
    Literal(Real),
    /// Complex scalar literal.
    ComplexLit(Complex64),
    /// Real 3-vector literal.
    VectorLit(Vec3),
    /// Named field quantity of a declared kind.
    Quantity { name: String, kind: ValueKind },
    /// Reference to a previously registered named expression.
    Named { name: String },
    /// Built-in constant.
    Constant(NamedConstant),
    /// Unary application.
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Binary application; `lhs` is emitted first.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Reduction of `operand` over a named geometry.
    Reduce {
        op: ReduceOp,
        geom: GeomRef,
        operand: Box<Expr>,
    },
}

impl Expr {
    pub fn literal(v: Real) -> Self {
        Self::Literal(v)
    }

    pub fn complex(re: Real, im: Real) -> Self {
        Self::ComplexLit(Complex64::new(re, im))
    }

    pub fn vector(x: Real, y: Real, z: Real) -> Self {
        Self::VectorLit(Vec3::new(x, y, z))
    }

    pub fn quantity(name: impl Into<String>, kind: ValueKind) -> Self {
        Self::Quantity {
            name: name.into(),
            kind,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into() }
    }

    pub fn constant(c: NamedConstant) -> Self {
        Self::Constant(c)
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn reduce(op: ReduceOp, geom: GeomRef, operand: Expr) -> Self {
        Self::Reduce {
            op,
            geom,
            operand: Box::new(operand),
        }
    }

    /// Number of nodes in the tree (leaves included).
    pub fn node_count(&self) -> usize {
        match self {
            Self::Literal(_)
            | Self::ComplexLit(_)
            | Self::VectorLit(_)
            | Self::Quantity { .. }
            | Self::Named { .. }
            | Self::Constant(_) => 1,
            Self::Unary { operand, .. } | Self::Reduce { operand, .. } => 1 + operand.node_count(),
            Self::Binary { lhs, rhs, .. } => 1 + lhs.node_count() + rhs.node_count(),
        }
    }
}

// Method combinators for everything not expressible as a `std::ops`
// operator. Each consumes self and wraps it in one more node.
impl Expr {
    pub fn abs(self) -> Expr {
        Expr::unary(UnaryOp::Abs, self)
    }

    pub fn sqrt(self) -> Expr {
        Expr::unary(UnaryOp::Sqrt, self)
    }

    pub fn exp(self) -> Expr {
        Expr::unary(UnaryOp::Exp, self)
    }

    pub fn ln(self) -> Expr {
        Expr::unary(UnaryOp::Ln, self)
    }

    pub fn log10(self) -> Expr {
        Expr::unary(UnaryOp::Log10, self)
    }

    pub fn sin(self) -> Expr {
        Expr::unary(UnaryOp::Sin, self)
    }

    pub fn cos(self) -> Expr {
        Expr::unary(UnaryOp::Cos, self)
    }

    pub fn tan(self) -> Expr {
        Expr::unary(UnaryOp::Tan, self)
    }

    pub fn asin(self) -> Expr {
        Expr::unary(UnaryOp::Asin, self)
    }

    pub fn acos(self) -> Expr {
        Expr::unary(UnaryOp::Acos, self)
    }

    pub fn atan(self) -> Expr {
        Expr::unary(UnaryOp::Atan, self)
    }

    pub fn atan2(self, x: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Atan2, self, x.into())
    }

    pub fn pow(self, exponent: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Pow, self, exponent.into())
    }

    pub fn min(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Min, self, other.into())
    }

    pub fn max(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Max, self, other.into())
    }

    /// Real part of a complex expression.
    pub fn real(self) -> Expr {
        Expr::unary(UnaryOp::Real, self)
    }

    /// Imaginary part of a complex expression.
    pub fn imag(self) -> Expr {
        Expr::unary(UnaryOp::Imag, self)
    }

    pub fn conj(self) -> Expr {
        Expr::unary(UnaryOp::Conj, self)
    }

    pub fn phase(self) -> Expr {
        Expr::unary(UnaryOp::Phase, self)
    }

    /// Magnitude of a vector or complex expression.
    pub fn mag(self) -> Expr {
        Expr::unary(UnaryOp::Mag, self)
    }

    pub fn normalize(self) -> Expr {
        Expr::unary(UnaryOp::Normalize, self)
    }

    /// X component of a vector expression.
    pub fn x(self) -> Expr {
        Expr::unary(UnaryOp::CompX, self)
    }

    /// Y component of a vector expression.
    pub fn y(self) -> Expr {
        Expr::unary(UnaryOp::CompY, self)
    }

    /// Z component of a vector expression.
    pub fn z(self) -> Expr {
        Expr::unary(UnaryOp::CompZ, self)
    }

    pub fn dot(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Dot, self, other.into())
    }

    pub fn cross(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Cross, self, other.into())
    }

    pub fn integrate(self, geom: &GeomRef) -> Expr {
        Expr::reduce(ReduceOp::Integrate, geom.clone(), self)
    }

    pub fn maximum(self, geom: &GeomRef) -> Expr {
        Expr::reduce(ReduceOp::Maximum, geom.clone(), self)
    }

    pub fn minimum(self, geom: &GeomRef) -> Expr {
        Expr::reduce(ReduceOp::Minimum, geom.clone(), self)
    }

    pub fn mean(self, geom: &GeomRef) -> Expr {
        Expr::reduce(ReduceOp::Mean, geom.clone(), self)
    }
}

impl From<Real> for Expr {
    fn from(v: Real) -> Self {
        Self::Literal(v)
    }
}

impl From<Complex64> for Expr {
    fn from(v: Complex64) -> Self {
        Self::ComplexLit(v)
    }
}

impl From<Vec3> for Expr {
    fn from(v: Vec3) -> Self {
        Self::VectorLit(v)
    }
}

impl fmt::Display for Expr {
    /// Infix rendering in the same surface syntax the parser accepts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{v}"),
            Self::ComplexLit(v) => write!(f, "complex({}, {})", v.re, v.im),
            Self::VectorLit(v) => write!(f, "vector({}, {}, {})", v.x, v.y, v.z),
            Self::Quantity { name, .. } => f.write_str(name),
            Self::Named { name } => f.write_str(name),
            Self::Constant(c) => f.write_str(c.label()),
            Self::Unary { op, operand } => match op {
                UnaryOp::Neg => write!(f, "(-{operand})"),
                _ => write!(f, "{}({operand})", op.mnemonic()),
            },
            Self::Binary { op, lhs, rhs } => match op {
                BinaryOp::Add => write!(f, "({lhs} + {rhs})"),
                BinaryOp::Sub => write!(f, "({lhs} - {rhs})"),
                BinaryOp::Mul => write!(f, "({lhs} * {rhs})"),
                BinaryOp::Div => write!(f, "({lhs} / {rhs})"),
                BinaryOp::Pow => write!(f, "({lhs} ^ {rhs})"),
                _ => write!(f, "{}({lhs}, {rhs})", op.mnemonic()),
            },
            Self::Reduce { op, geom, operand } => {
                write!(f, "{}({operand}, {})", op.mnemonic(), geom.name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_count_counts_leaves_and_operators() {
        let e = Expr::quantity("T", ValueKind::Scalar);
        assert_eq!(e.node_count(), 1);

        let sum = Expr::quantity("T", ValueKind::Scalar) + Expr::literal(1.0);
        assert_eq!(sum.node_count(), 3);

        let nested = sum.sqrt();
        assert_eq!(nested.node_count(), 4);
    }

    #[test]
    fn constants_round_trip_labels() {
        for c in [
            NamedConstant::Pi,
            NamedConstant::Tau,
            NamedConstant::Eps0,
            NamedConstant::Mu0,
            NamedConstant::C0,
        ] {
            assert_eq!(NamedConstant::from_label(c.label()), Some(c));
        }
        assert_eq!(NamedConstant::from_label("planck"), None);
    }

    #[test]
    fn display_matches_parser_syntax() {
        let e = Expr::quantity("E", ValueKind::Vector);
        let h = Expr::quantity("H", ValueKind::Vector);
        let s = e.cross(h).mag();
        assert_eq!(s.to_string(), "mag(cross(E, H))");

        let t = Expr::quantity("T", ValueKind::Scalar);
        let shifted = (t - 273.15) / 10.0;
        assert_eq!(shifted.to_string(), "((T - 273.15) / 10)");
    }

    #[test]
    fn display_reduction_names_geometry() {
        let surf = GeomRef::new("inlet", GeomDomain::Surface);
        let flux = Expr::quantity("q", ValueKind::Scalar).integrate(&surf);
        assert_eq!(flux.to_string(), "integrate(q, inlet)");
    }
}
