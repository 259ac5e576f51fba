//! Calculator value types and the kind lattice.
//!
//! Every operand on the calculator stack is a `Value`: a real scalar, a
//! complex scalar, or a real 3-vector. `ValueKind` is the static type used
//! by the expression compiler. Promotion rules: scalars promote to
//! complex, scalars scale vectors under multiplication and division,
//! complex and vector never mix.

use core::fmt;

use crate::error::FcError;
use crate::numeric::Real;

pub type Complex64 = num_complex::Complex<Real>;
pub type Vec3 = nalgebra::Vector3<Real>;

/// Static type of a calculator value or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValueKind {
    Scalar,
    Complex,
    Vector,
}

impl ValueKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Complex => "complex",
            Self::Vector => "vector",
        }
    }

    /// Join two kinds under the additive promotion rule.
    ///
    /// Scalar joins Complex as Complex; everything else must match.
    pub fn join(a: ValueKind, b: ValueKind) -> Option<ValueKind> {
        match (a, b) {
            (x, y) if x == y => Some(x),
            (Self::Scalar, Self::Complex) | (Self::Complex, Self::Scalar) => Some(Self::Complex),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single calculator value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Scalar(Real),
    Complex(Complex64),
    Vector(Vec3),
}

impl Value {
    pub fn scalar(v: Real) -> Self {
        Self::Scalar(v)
    }

    pub fn complex(re: Real, im: Real) -> Self {
        Self::Complex(Complex64::new(re, im))
    }

    pub fn vector(x: Real, y: Real, z: Real) -> Self {
        Self::Vector(Vec3::new(x, y, z))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Scalar(_) => ValueKind::Scalar,
            Self::Complex(_) => ValueKind::Complex,
            Self::Vector(_) => ValueKind::Vector,
        }
    }

    /// Promote a scalar to complex; other kinds are unchanged.
    pub fn promote_complex(self) -> Self {
        match self {
            Self::Scalar(v) => Self::Complex(Complex64::new(v, 0.0)),
            other => other,
        }
    }

    pub fn as_scalar(&self) -> Option<Real> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<Complex64> {
        match self {
            Self::Complex(v) => Some(*v),
            Self::Scalar(v) => Some(Complex64::new(*v, 0.0)),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vec3> {
        match self {
            Self::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Self::Scalar(v) => v.is_finite(),
            Self::Complex(v) => v.re.is_finite() && v.im.is_finite(),
            Self::Vector(v) => v.x.is_finite() && v.y.is_finite() && v.z.is_finite(),
        }
    }

    pub fn ensure_finite(self, what: &'static str) -> Result<Self, FcError> {
        if self.is_finite() {
            Ok(self)
        } else {
            Err(FcError::NonFinite {
                what,
                value: match self {
                    Self::Scalar(v) => v,
                    Self::Complex(v) => {
                        if v.re.is_finite() {
                            v.im
                        } else {
                            v.re
                        }
                    }
                    Self::Vector(v) => [v.x, v.y, v.z]
                        .into_iter()
                        .find(|c| !c.is_finite())
                        .unwrap_or(Real::NAN),
                },
            })
        }
    }
}

impl From<Real> for Value {
    fn from(v: Real) -> Self {
        Self::Scalar(v)
    }
}

impl From<Complex64> for Value {
    fn from(v: Complex64) -> Self {
        Self::Complex(v)
    }
}

impl From<Vec3> for Value {
    fn from(v: Vec3) -> Self {
        Self::Vector(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => write!(f, "{v}"),
            Self::Complex(v) => write!(f, "{}{:+}i", v.re, v.im),
            Self::Vector(v) => write!(f, "[{}, {}, {}]", v.x, v.y, v.z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_join_promotes_scalar_to_complex() {
        assert_eq!(
            ValueKind::join(ValueKind::Scalar, ValueKind::Complex),
            Some(ValueKind::Complex)
        );
        assert_eq!(
            ValueKind::join(ValueKind::Complex, ValueKind::Scalar),
            Some(ValueKind::Complex)
        );
        assert_eq!(
            ValueKind::join(ValueKind::Vector, ValueKind::Vector),
            Some(ValueKind::Vector)
        );
        assert_eq!(ValueKind::join(ValueKind::Complex, ValueKind::Vector), None);
        assert_eq!(ValueKind::join(ValueKind::Scalar, ValueKind::Vector), None);
    }

    #[test]
    fn value_accessors() {
        let s = Value::scalar(2.5);
        assert_eq!(s.kind(), ValueKind::Scalar);
        assert_eq!(s.as_scalar(), Some(2.5));
        assert_eq!(s.as_complex(), Some(Complex64::new(2.5, 0.0)));
        assert_eq!(s.as_vector(), None);

        let v = Value::vector(1.0, 2.0, 3.0);
        assert_eq!(v.kind(), ValueKind::Vector);
        assert_eq!(v.as_vector(), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(v.as_scalar(), None);
    }

    #[test]
    fn finite_check_covers_all_components() {
        assert!(Value::vector(1.0, 2.0, 3.0).is_finite());
        assert!(!Value::vector(1.0, Real::NAN, 3.0).is_finite());
        assert!(!Value::complex(Real::INFINITY, 0.0).is_finite());
        assert!(
            Value::vector(1.0, Real::NAN, 3.0)
                .ensure_finite("test")
                .is_err()
        );
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::scalar(2.5).to_string(), "2.5");
        assert_eq!(Value::complex(1.0, -2.0).to_string(), "1-2i");
        assert_eq!(Value::vector(1.0, 0.0, -1.0).to_string(), "[1, 0, -1]");
    }
}
