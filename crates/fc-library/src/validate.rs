//! Library validation logic.

use fc_core::ValueKind;
use fc_expr::{ExprError, ParseError, SymbolTable, infer_kind, parse_expression};

use crate::schema::Library;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate name: {name} in {context}")]
    DuplicateName { name: String, context: String },

    #[error("Blank name in {context}")]
    BlankName { context: String },

    #[error("Quantity '{name}' has no kind (unmigrated version-1 entry?)")]
    MissingKind { name: String },

    #[error("Quantity '{name}' carries a geometry domain (unmigrated version-1 entry?)")]
    InlineGeometry { name: String },

    #[error("Expression '{name}' failed to parse: {source}")]
    Parse { name: String, source: ParseError },

    #[error("Expression '{name}' does not type-check: {source}")]
    Kind { name: String, source: ExprError },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

/// Validate a library at the current schema version.
pub fn validate_library(library: &Library) -> Result<(), ValidationError> {
    if library.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: library.version,
        });
    }

    let mut table = declaration_table(library)?;

    for def in &library.expressions {
        if def.name.trim().is_empty() {
            return Err(ValidationError::BlankName {
                context: "expressions".to_string(),
            });
        }
        if table.contains(&def.name) {
            return Err(ValidationError::DuplicateName {
                name: def.name.clone(),
                context: "expressions".to_string(),
            });
        }

        let expr = parse_expression(&def.expr, &table).map_err(|source| ValidationError::Parse {
            name: def.name.clone(),
            source,
        })?;
        let kind = infer_kind(&expr, &table).map_err(|source| ValidationError::Kind {
            name: def.name.clone(),
            source,
        })?;
        table.add_named(&def.name, kind);
    }

    Ok(())
}

/// Build the symbol table of declared quantities and geometries.
pub(crate) fn declaration_table(library: &Library) -> Result<SymbolTable, ValidationError> {
    let mut table = SymbolTable::new();

    for quantity in &library.quantities {
        if quantity.name.trim().is_empty() {
            return Err(ValidationError::BlankName {
                context: "quantities".to_string(),
            });
        }
        if quantity.domain.is_some() {
            return Err(ValidationError::InlineGeometry {
                name: quantity.name.clone(),
            });
        }
        let kind: ValueKind = quantity.kind.ok_or_else(|| ValidationError::MissingKind {
            name: quantity.name.clone(),
        })?;
        if !table.add_quantity(&quantity.name, kind) {
            return Err(ValidationError::DuplicateName {
                name: quantity.name.clone(),
                context: "quantities".to_string(),
            });
        }
    }

    for geometry in &library.geometries {
        if geometry.name.trim().is_empty() {
            return Err(ValidationError::BlankName {
                context: "geometries".to_string(),
            });
        }
        if !table.add_geometry(&geometry.name, geometry.domain) {
            return Err(ValidationError::DuplicateName {
                name: geometry.name.clone(),
                context: "geometries".to_string(),
            });
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{GeometryDef, NamedExpressionDef, QuantityDef};
    use fc_expr::GeomDomain;

    fn quantity(name: &str, kind: ValueKind) -> QuantityDef {
        QuantityDef {
            name: name.to_string(),
            kind: Some(kind),
            domain: None,
        }
    }

    fn expression(name: &str, expr: &str) -> NamedExpressionDef {
        NamedExpressionDef {
            name: name.to_string(),
            expr: expr.to_string(),
            description: None,
        }
    }

    fn sample() -> Library {
        let mut library = Library::new("sample");
        library.quantities = vec![
            quantity("E", ValueKind::Vector),
            quantity("H", ValueKind::Vector),
        ];
        library.geometries = vec![GeometryDef {
            name: "aperture".to_string(),
            domain: GeomDomain::Surface,
        }];
        library.expressions = vec![
            expression("S_avg", "0.5 * cross(E, H)"),
            expression("P_rad", "integrate(mag(S_avg), aperture)"),
        ];
        library
    }

    #[test]
    fn valid_library_passes() {
        assert!(validate_library(&sample()).is_ok());
    }

    #[test]
    fn duplicate_names_across_sections_fail() {
        let mut library = sample();
        library.geometries.push(GeometryDef {
            name: "E".to_string(),
            domain: GeomDomain::Volume,
        });
        assert!(matches!(
            validate_library(&library).unwrap_err(),
            ValidationError::DuplicateName { .. }
        ));
    }

    #[test]
    fn expressions_see_earlier_definitions_only() {
        let mut library = sample();
        library.expressions.swap(0, 1);
        // P_rad now precedes S_avg and cannot resolve it
        assert!(matches!(
            validate_library(&library).unwrap_err(),
            ValidationError::Parse { .. }
        ));
    }

    #[test]
    fn kind_errors_carry_the_expression_name() {
        let mut library = sample();
        library
            .expressions
            .push(expression("broken", "E + 1"));
        match validate_library(&library).unwrap_err() {
            ValidationError::Kind { name, .. } => assert_eq!(name, "broken"),
            other => panic!("expected kind error, got {other}"),
        }
    }

    #[test]
    fn unmigrated_entries_fail() {
        let mut library = sample();
        library.quantities.push(QuantityDef {
            name: "legacy".to_string(),
            kind: None,
            domain: Some(GeomDomain::Line),
        });
        assert!(matches!(
            validate_library(&library).unwrap_err(),
            ValidationError::InlineGeometry { .. }
        ));

        let mut library = sample();
        library.quantities.push(QuantityDef {
            name: "unkinded".to_string(),
            kind: None,
            domain: None,
        });
        assert!(matches!(
            validate_library(&library).unwrap_err(),
            ValidationError::MissingKind { .. }
        ));
    }

    #[test]
    fn future_versions_are_rejected() {
        let mut library = sample();
        library.version = 99;
        assert!(matches!(
            validate_library(&library).unwrap_err(),
            ValidationError::UnsupportedVersion { version: 99 }
        ));
    }
}
