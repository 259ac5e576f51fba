//! Library-to-calculator compilation.

use fc_engine::FieldCalculator;
use fc_expr::parse_expression;

use crate::schema::Library;
use crate::validate::{declaration_table, validate_library};
use crate::{LibraryError, LibraryResult};

/// Parse and register every expression of a library, in file order.
pub fn build_calculator(library: &Library) -> LibraryResult<FieldCalculator> {
    validate_library(library)?;

    let mut table = declaration_table(library)?;
    let mut calc = FieldCalculator::new();

    for def in &library.expressions {
        let expr = parse_expression(&def.expr, &table).map_err(LibraryError::Parse)?;
        let id = calc.add_named_expression(&def.name, &expr)?;
        table.add_named(&def.name, calc.by_id(id).kind);
    }

    Ok(calc)
}
