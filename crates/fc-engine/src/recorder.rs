//! Script-recording backend.
//!
//! `ScriptRecorder` performs no arithmetic: it appends one script line
//! per backend call, tracking only the stack depth so malformed programs
//! still fail. The output is the call sequence an external stack
//! calculator would receive.

use core::fmt;

use fc_core::{Complex64, Real, ValueKind, Vec3};
use fc_expr::{BinaryOp, GeomDomain, ReduceOp, UnaryOp};

use crate::backend::CalcBackend;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Default)]
pub struct ScriptRecorder {
    lines: Vec<String>,
    depth: usize,
}

impl ScriptRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded script lines in call order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The whole script, one call per line.
    pub fn script(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    fn consume(&mut self, op: &'static str, wanted: usize) -> EngineResult<()> {
        if self.depth < wanted {
            return Err(EngineError::StackUnderflow {
                op,
                wanted,
                have: self.depth,
            });
        }
        self.depth -= wanted;
        Ok(())
    }
}

impl fmt::Display for ScriptRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.script())
    }
}

impl CalcBackend for ScriptRecorder {
    fn push_scalar(&mut self, value: Real) -> EngineResult<()> {
        self.lines.push(format!("push_scalar {value}"));
        self.depth += 1;
        Ok(())
    }

    fn push_complex(&mut self, value: Complex64) -> EngineResult<()> {
        self.lines
            .push(format!("push_complex {} {}", value.re, value.im));
        self.depth += 1;
        Ok(())
    }

    fn push_vector(&mut self, value: Vec3) -> EngineResult<()> {
        self.lines
            .push(format!("push_vector {} {} {}", value.x, value.y, value.z));
        self.depth += 1;
        Ok(())
    }

    fn push_quantity(&mut self, name: &str, kind: ValueKind) -> EngineResult<()> {
        self.lines.push(format!("push_quantity {name} {kind}"));
        self.depth += 1;
        Ok(())
    }

    fn push_geometry(&mut self, name: &str, domain: GeomDomain) -> EngineResult<()> {
        self.lines.push(format!("push_geometry {name} {domain}"));
        self.depth += 1;
        Ok(())
    }

    fn push_named(&mut self, name: &str) -> EngineResult<()> {
        self.lines.push(format!("push_named {name}"));
        self.depth += 1;
        Ok(())
    }

    fn apply_unary(&mut self, op: UnaryOp) -> EngineResult<()> {
        self.consume(op.mnemonic(), 1)?;
        self.lines.push(format!("unary {op}"));
        self.depth += 1;
        Ok(())
    }

    fn apply_binary(&mut self, op: BinaryOp) -> EngineResult<()> {
        self.consume(op.mnemonic(), 2)?;
        self.lines.push(format!("binary {op}"));
        self.depth += 1;
        Ok(())
    }

    fn apply_reduce(&mut self, op: ReduceOp) -> EngineResult<()> {
        self.consume(op.mnemonic(), 2)?;
        self.lines.push(format!("reduce {op}"));
        self.depth += 1;
        Ok(())
    }

    fn store_named(&mut self, name: &str) -> EngineResult<()> {
        self.consume("store_named", 1)?;
        self.lines.push(format!("store_named {name}"));
        Ok(())
    }

    fn stack_len(&self) -> usize {
        self.depth
    }
}
