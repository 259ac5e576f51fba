//! fc-library: expression library file format and validation.

pub mod builder;
pub mod migrate;
pub mod schema;
pub mod validate;

pub use builder::build_calculator;
pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{ValidationError, validate_library};

use fc_engine::{ContextDef, EngineError, FieldContext};

pub type LibraryResult<T> = Result<T, LibraryError>;

#[derive(thiserror::Error, Debug)]
pub enum LibraryError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Parse error: {0}")]
    Parse(#[from] fc_expr::ParseError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> LibraryResult<Library> {
    let content = std::fs::read_to_string(path)?;
    let mut library: Library = serde_yaml::from_str(&content)?;
    library = migrate_to_latest(library)?;
    validate_library(&library)?;
    Ok(library)
}

pub fn save_yaml(path: &std::path::Path, library: &Library) -> LibraryResult<()> {
    validate_library(library)?;
    let content = serde_yaml::to_string(library)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> LibraryResult<Library> {
    let content = std::fs::read_to_string(path)?;
    let mut library: Library = serde_json::from_str(&content)?;
    library = migrate_to_latest(library)?;
    validate_library(&library)?;
    Ok(library)
}

pub fn save_json(path: &std::path::Path, library: &Library) -> LibraryResult<()> {
    validate_library(library)?;
    let content = serde_json::to_string_pretty(library)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a field-context file (YAML or JSON by extension) and build it.
pub fn load_context(path: &std::path::Path) -> LibraryResult<FieldContext> {
    let content = std::fs::read_to_string(path)?;
    let def: ContextDef = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };
    Ok(def.build()?)
}
