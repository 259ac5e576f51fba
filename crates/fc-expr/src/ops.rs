//! `std::ops` overloads on expression trees.
//!
//! Arithmetic on `Expr` builds new nodes; nothing is evaluated. Operand
//! order is preserved so the compiled postfix program emits the left
//! operand first, the right operand second, then the opcode.

use core::ops;

use fc_core::Real;

use crate::expr::Expr;
use crate::op::{BinaryOp, UnaryOp};

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $opcode:expr) => {
        impl ops::$trait for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($opcode, self, rhs)
            }
        }

        impl ops::$trait<&Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary($opcode, self, rhs.clone())
            }
        }

        impl ops::$trait<Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($opcode, self.clone(), rhs)
            }
        }

        impl ops::$trait<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary($opcode, self.clone(), rhs.clone())
            }
        }

        impl ops::$trait<Real> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Real) -> Expr {
                Expr::binary($opcode, self, Expr::literal(rhs))
            }
        }

        impl ops::$trait<Real> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Real) -> Expr {
                Expr::binary($opcode, self.clone(), Expr::literal(rhs))
            }
        }

        impl ops::$trait<Expr> for Real {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($opcode, Expr::literal(self), rhs)
            }
        }

        impl ops::$trait<&Expr> for Real {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary($opcode, Expr::literal(self), rhs.clone())
            }
        }
    };
}

impl_binary_op!(Add, add, BinaryOp::Add);
impl_binary_op!(Sub, sub, BinaryOp::Sub);
impl_binary_op!(Mul, mul, BinaryOp::Mul);
impl_binary_op!(Div, div, BinaryOp::Div);

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

impl ops::Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::ValueKind;

    #[test]
    fn operators_build_nodes() {
        let t = Expr::quantity("T", ValueKind::Scalar);
        let e = (&t + 1.0) * 2.0 - &t;
        match e {
            Expr::Binary {
                op: BinaryOp::Sub, ..
            } => {}
            other => panic!("expected Sub at root, got {other:?}"),
        }
    }

    #[test]
    fn operand_order_is_preserved() {
        let a = Expr::quantity("a", ValueKind::Scalar);
        let b = Expr::quantity("b", ValueKind::Scalar);
        let e = &a / &b;
        match e {
            Expr::Binary { lhs, rhs, .. } => {
                assert_eq!(*lhs, a);
                assert_eq!(*rhs, b);
            }
            other => panic!("expected Binary, got {other:?}"),
        }
    }

    #[test]
    fn scalar_literals_lift_on_both_sides() {
        let t = Expr::quantity("T", ValueKind::Scalar);
        let left = 2.0 * &t;
        let right = &t * 2.0;
        match (left, right) {
            (Expr::Binary { lhs: l, .. }, Expr::Binary { rhs: r, .. }) => {
                assert_eq!(*l, Expr::literal(2.0));
                assert_eq!(*r, Expr::literal(2.0));
            }
            _ => panic!("expected Binary nodes"),
        }
    }

    #[test]
    fn double_negation_nests() {
        let t = Expr::quantity("T", ValueKind::Scalar);
        let e = -(-&t);
        assert_eq!(e.node_count(), 3);
    }
}
