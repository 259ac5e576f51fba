//! Postfix instruction programs.
//!
//! A `Program` is the flat, replayable form of a compiled expression: push
//! instructions for leaves, opcode instructions for operators, in strict
//! post-order. Programs serialize for persistence and hash to a stable
//! content fingerprint.

use core::fmt;

use fc_core::{Real, ValueKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ExprError, ExprResult};
use crate::op::{BinaryOp, GeomDomain, ReduceOp, UnaryOp};

/// One postfix instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "instr", rename_all = "snake_case")]
pub enum Instr {
    PushScalar { value: Real },
    PushComplex { re: Real, im: Real },
    PushVector { x: Real, y: Real, z: Real },
    PushQuantity { name: String, kind: ValueKind },
    PushGeometry { name: String, domain: GeomDomain },
    PushNamed { name: String },
    Unary { op: UnaryOp },
    Binary { op: BinaryOp },
    Reduce { op: ReduceOp },
}

impl Instr {
    /// Operands popped / pushed by this instruction.
    fn stack_effect(&self) -> (usize, usize) {
        match self {
            Self::PushScalar { .. }
            | Self::PushComplex { .. }
            | Self::PushVector { .. }
            | Self::PushQuantity { .. }
            | Self::PushGeometry { .. }
            | Self::PushNamed { .. } => (0, 1),
            Self::Unary { .. } => (1, 1),
            Self::Binary { .. } | Self::Reduce { .. } => (2, 1),
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PushScalar { value } => write!(f, "push_scalar {value}"),
            Self::PushComplex { re, im } => write!(f, "push_complex {re} {im}"),
            Self::PushVector { x, y, z } => write!(f, "push_vector {x} {y} {z}"),
            Self::PushQuantity { name, kind } => write!(f, "push_quantity {name} {kind}"),
            Self::PushGeometry { name, domain } => write!(f, "push_geometry {name} {domain}"),
            Self::PushNamed { name } => write!(f, "push_named {name}"),
            Self::Unary { op } => write!(f, "unary {op}"),
            Self::Binary { op } => write!(f, "binary {op}"),
            Self::Reduce { op } => write!(f, "reduce {op}"),
        }
    }
}

/// A compiled postfix program.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub instrs: Vec<Instr>,
}

impl Program {
    pub fn new(instrs: Vec<Instr>) -> Self {
        Self { instrs }
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instr> {
        self.instrs.iter()
    }

    /// Names of registered expressions this program references.
    pub fn named_refs(&self) -> impl Iterator<Item = &str> {
        self.instrs.iter().filter_map(|i| match i {
            Instr::PushNamed { name } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Stable hex SHA-256 of the serialized instruction list.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let json = serde_json::to_string(&self.instrs).unwrap_or_default();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Peak operand-stack depth, computed by replaying stack effects.
    ///
    /// Programs produced by the compiler are always well-formed; persisted
    /// programs may not be, so underflow is reported rather than assumed
    /// away.
    pub fn max_stack_depth(&self) -> ExprResult<usize> {
        let mut depth = 0usize;
        let mut peak = 0usize;
        for (at, instr) in self.instrs.iter().enumerate() {
            let (pops, pushes) = instr.stack_effect();
            if depth < pops {
                return Err(ExprError::MalformedProgram { at });
            }
            depth = depth - pops + pushes;
            peak = peak.max(depth);
        }
        Ok(peak)
    }
}

impl fmt::Display for Program {
    /// RPN listing, one instruction per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.instrs {
            writeln!(f, "{instr}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Program {
        Program::new(vec![
            Instr::PushQuantity {
                name: "E".into(),
                kind: ValueKind::Vector,
            },
            Instr::PushQuantity {
                name: "H".into(),
                kind: ValueKind::Vector,
            },
            Instr::Binary { op: BinaryOp::Dot },
            Instr::PushScalar { value: 0.5 },
            Instr::Binary { op: BinaryOp::Mul },
        ])
    }

    #[test]
    fn listing_is_one_instruction_per_line() {
        let listing = sample().to_string();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "push_quantity E vector");
        assert_eq!(lines[2], "binary dot");
        assert_eq!(lines[3], "push_scalar 0.5");
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let a = sample();
        let b = sample();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut c = sample();
        c.instrs[3] = Instr::PushScalar { value: 0.25 };
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn max_stack_depth_replays_effects() {
        assert_eq!(sample().max_stack_depth().unwrap(), 2);

        // push a; push b; push c; mul; mul -> peak 3
        let deep = Program::new(vec![
            Instr::PushScalar { value: 1.0 },
            Instr::PushScalar { value: 2.0 },
            Instr::PushScalar { value: 3.0 },
            Instr::Binary { op: BinaryOp::Mul },
            Instr::Binary { op: BinaryOp::Mul },
        ]);
        assert_eq!(deep.max_stack_depth().unwrap(), 3);
    }

    #[test]
    fn underflow_is_reported_with_position() {
        let bad = Program::new(vec![
            Instr::PushScalar { value: 1.0 },
            Instr::Binary { op: BinaryOp::Add },
        ]);
        assert_eq!(
            bad.max_stack_depth(),
            Err(ExprError::MalformedProgram { at: 1 })
        );
    }

    #[test]
    fn named_refs_are_extracted_in_order() {
        let p = Program::new(vec![
            Instr::PushNamed { name: "a".into() },
            Instr::PushNamed { name: "b".into() },
            Instr::Binary { op: BinaryOp::Add },
        ]);
        let refs: Vec<&str> = p.named_refs().collect();
        assert_eq!(refs, vec!["a", "b"]);
    }

    #[test]
    fn serde_round_trip() {
        let p = sample();
        let json = serde_json::to_string(&p).unwrap();
        let back: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
