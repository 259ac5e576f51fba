//! fc-core: stable foundation for fieldcalc.
//!
//! Contains:
//! - values (scalar / complex / vector calculator values + kind lattice)
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable compact IDs for registry handles)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod value;

// Re-exports: nice ergonomics for downstream crates
pub use error::{FcError, FcResult};
pub use ids::*;
pub use numeric::*;
pub use value::*;
