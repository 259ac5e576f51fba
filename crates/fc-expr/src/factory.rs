//! Leaf-node factories.
//!
//! Each factory is a namespace with one constructor per reference kind:
//! `Fields` produces quantity leaves bound to a name and kind, `Geometry`
//! produces geometry references for reductions, and `consts` holds the
//! built-in constants as ready expressions.

use fc_core::ValueKind;

use crate::expr::{Expr, GeomRef, NamedConstant};
use crate::op::GeomDomain;

/// Factory for named field-quantity leaves.
pub struct Fields;

impl Fields {
    /// A scalar field quantity (temperature, loss density, ...).
    pub fn scalar(name: impl Into<String>) -> Expr {
        Expr::quantity(name, ValueKind::Scalar)
    }

    /// A complex scalar field quantity (phasor amplitude, ...).
    pub fn complex(name: impl Into<String>) -> Expr {
        Expr::quantity(name, ValueKind::Complex)
    }

    /// A vector field quantity (E, H, heat flux, ...).
    pub fn vector(name: impl Into<String>) -> Expr {
        Expr::quantity(name, ValueKind::Vector)
    }
}

/// Factory for named geometry references.
pub struct Geometry;

impl Geometry {
    pub fn point(name: impl Into<String>) -> GeomRef {
        GeomRef::new(name, GeomDomain::Point)
    }

    pub fn line(name: impl Into<String>) -> GeomRef {
        GeomRef::new(name, GeomDomain::Line)
    }

    pub fn surface(name: impl Into<String>) -> GeomRef {
        GeomRef::new(name, GeomDomain::Surface)
    }

    pub fn volume(name: impl Into<String>) -> GeomRef {
        GeomRef::new(name, GeomDomain::Volume)
    }
}

/// Ready-made constant leaves.
pub mod consts {
    use super::*;

    pub fn pi() -> Expr {
        Expr::constant(NamedConstant::Pi)
    }

    pub fn tau() -> Expr {
        Expr::constant(NamedConstant::Tau)
    }

    pub fn eps0() -> Expr {
        Expr::constant(NamedConstant::Eps0)
    }

    pub fn mu0() -> Expr {
        Expr::constant(NamedConstant::Mu0)
    }

    pub fn c0() -> Expr {
        Expr::constant(NamedConstant::C0)
    }
}
