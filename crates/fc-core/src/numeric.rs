use crate::FcError;
use crate::value::{Complex64, Vec3};

/// Floating point type used throughout the calculator
pub type Real = f64;

/// Absolute + relative comparison tolerances, used by tests and by the
/// reduction finiteness checks.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Componentwise comparison for complex scalars.
pub fn nearly_equal_complex(a: Complex64, b: Complex64, tol: Tolerances) -> bool {
    nearly_equal(a.re, b.re, tol) && nearly_equal(a.im, b.im, tol)
}

/// Componentwise comparison for 3-vectors.
pub fn nearly_equal_vec3(a: Vec3, b: Vec3, tol: Tolerances) -> bool {
    nearly_equal(a.x, b.x, tol) && nearly_equal(a.y, b.y, tol) && nearly_equal(a.z, b.z, tol)
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, FcError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(FcError::NonFinite { what, value: v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn nearly_equal_complex_checks_both_parts() {
        let tol = Tolerances::default();
        let a = Complex64::new(1.0, 2.0);
        assert!(nearly_equal_complex(a, Complex64::new(1.0, 2.0), tol));
        assert!(!nearly_equal_complex(a, Complex64::new(1.0, 2.1), tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn nearly_equal_is_symmetric(a in -1e6_f64..1e6, b in -1e6_f64..1e6) {
            let tol = Tolerances::default();
            prop_assert_eq!(nearly_equal(a, b, tol), nearly_equal(b, a, tol));
        }

        #[test]
        fn nearly_equal_is_reflexive(a in -1e12_f64..1e12) {
            prop_assert!(nearly_equal(a, a, Tolerances::default()));
        }
    }
}
