//! Named-expression registry and replay driver.
//!
//! `FieldCalculator` owns the compiled form of every registered
//! expression. Registration compiles against the names already present,
//! so the registration order is a topological order of the dependency
//! graph and reference cycles are unrepresentable. Replay walks the
//! dependencies of a target in that order, storing each result under its
//! name before the target itself runs.

use std::collections::{HashMap, HashSet};

use fc_core::{FcError, NamedId, ValueKind};
use fc_expr::{Expr, NamedKinds, Program, compile};
use tracing::{debug, debug_span};

use crate::backend::{CalcBackend, replay};
use crate::context::FieldContext;
use crate::error::{EngineError, EngineResult};
use crate::stack::{EvalResult, StackEngine};

/// A registered expression: compiled program plus identity.
#[derive(Debug, Clone)]
pub struct NamedExpression {
    pub id: NamedId,
    pub name: String,
    pub kind: ValueKind,
    pub program: Program,
    pub fingerprint: String,
}

/// The named-expression registry and replay driver.
#[derive(Debug, Default)]
pub struct FieldCalculator {
    entries: Vec<NamedExpression>,
    index: HashMap<String, NamedId>,
}

impl NamedKinds for FieldCalculator {
    fn kind_of(&self, name: &str) -> Option<ValueKind> {
        self.get(name).map(|e| e.kind)
    }
}

impl FieldCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile an expression and register its stack value under `name`.
    ///
    /// The expression may reference any name registered earlier; blank
    /// and duplicate names are rejected.
    pub fn add_named_expression(&mut self, name: &str, expr: &Expr) -> EngineResult<NamedId> {
        if name.trim().is_empty() {
            return Err(FcError::InvalidArg {
                what: "expression name must not be blank",
            }
            .into());
        }
        if self.index.contains_key(name) {
            return Err(FcError::DuplicateName {
                name: name.to_string(),
            }
            .into());
        }

        let compiled = compile(expr, self)?;
        let fingerprint = compiled.program.fingerprint();
        let id = NamedId::from_index(self.entries.len() as u32);

        debug!(
            name,
            kind = %compiled.kind,
            instrs = compiled.program.len(),
            fingerprint = %&fingerprint[..12],
            "registered named expression"
        );

        self.index.insert(name.to_string(), id);
        self.entries.push(NamedExpression {
            id,
            name: name.to_string(),
            kind: compiled.kind,
            program: compiled.program,
            fingerprint,
        });
        Ok(id)
    }

    pub fn get(&self, name: &str) -> Option<&NamedExpression> {
        self.index.get(name).map(|id| self.by_id(*id))
    }

    pub fn by_id(&self, id: NamedId) -> &NamedExpression {
        &self.entries[id.index() as usize]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered expressions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &NamedExpression> {
        self.entries.iter()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Transitive dependencies of `name`, in registration order.
    fn dependencies(&self, target: &NamedExpression) -> EngineResult<Vec<&NamedExpression>> {
        let mut needed: HashSet<&str> = HashSet::new();
        let mut pending: Vec<&NamedExpression> = vec![target];
        while let Some(entry) = pending.pop() {
            for name in entry.program.named_refs() {
                let dep = self.get(name).ok_or_else(|| EngineError::UnknownNamed {
                    name: name.to_string(),
                })?;
                if needed.insert(&dep.name) {
                    pending.push(dep);
                }
            }
        }
        Ok(self
            .entries
            .iter()
            .filter(|e| needed.contains(e.name.as_str()))
            .collect())
    }

    /// Replay `name` onto a backend.
    ///
    /// Each dependency is replayed once and stored under its name; the
    /// target is stored too, then copied back so the value ends both
    /// registered and on top of the backend's stack.
    pub fn replay_onto(&self, name: &str, backend: &mut dyn CalcBackend) -> EngineResult<()> {
        let target = self.get(name).ok_or_else(|| EngineError::UnknownNamed {
            name: name.to_string(),
        })?;

        let span = debug_span!("replay", name = %target.name);
        let _enter = span.enter();

        for dep in self.dependencies(target)? {
            replay(&dep.program, backend)?;
            backend.store_named(&dep.name)?;
        }
        replay(&target.program, backend)?;
        backend.store_named(&target.name)?;
        backend.push_named(&target.name)?;
        Ok(())
    }

    /// Evaluate `name` against a field context on a fresh stack engine.
    pub fn evaluate(&self, name: &str, ctx: &FieldContext) -> EngineResult<EvalResult> {
        let mut engine = StackEngine::new(ctx);
        self.replay_onto(name, &mut engine)?;
        engine.pop_result()
    }
}
