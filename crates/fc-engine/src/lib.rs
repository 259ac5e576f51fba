//! fc-engine: calculator backends and the named-expression driver.
//!
//! This crate is the back end of the field calculator:
//! - `CalcBackend` is the replay surface for compiled postfix programs
//! - `StackEngine` executes programs against sampled field contexts
//! - `ScriptRecorder` captures the call sequence an external calculator
//!   would receive
//! - `FieldCalculator` registers compiled expressions under names and
//!   drives dependency-ordered replay
//!
//! # Design Principles
//!
//! - **Checked replay**: the engine re-validates kinds and stack depth
//!   even though compiled programs cannot violate them, because programs
//!   may arrive from persisted files
//! - **IEEE elementwise**: pointwise arithmetic never fails on values;
//!   only reduction outputs are finite-checked

pub mod backend;
pub mod context;
pub mod driver;
pub mod error;
pub mod kernel;
pub mod recorder;
pub mod stack;

pub use backend::{CalcBackend, replay};
pub use context::{ContextDef, FieldContext, FieldData, GeometrySet, GeometrySetDef, QuantityDataDef};
pub use driver::{FieldCalculator, NamedExpression};
pub use error::{EngineError, EngineResult};
pub use recorder::ScriptRecorder;
pub use stack::{EvalResult, Slot, StackEngine};
