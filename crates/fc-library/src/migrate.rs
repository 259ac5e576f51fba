//! Schema migration framework.

use crate::LibraryError;
use crate::schema::{GeometryDef, Library};

pub const LATEST_VERSION: u32 = 2;

pub fn migrate_to_latest(mut library: Library) -> Result<Library, LibraryError> {
    while library.version < LATEST_VERSION {
        library = migrate_one_version(library)?;
    }
    Ok(library)
}

fn migrate_one_version(library: Library) -> Result<Library, LibraryError> {
    match library.version {
        1 => migrate_v1_to_v2(library),
        v => Err(LibraryError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 1 declared geometries inline in `quantities` with a `domain`
/// field; version 2 gives them their own section.
fn migrate_v1_to_v2(mut library: Library) -> Result<Library, LibraryError> {
    let mut remaining = Vec::with_capacity(library.quantities.len());

    for quantity in library.quantities.drain(..) {
        match (quantity.kind, quantity.domain) {
            (None, Some(domain)) => library.geometries.push(GeometryDef {
                name: quantity.name,
                domain,
            }),
            (Some(_), None) => remaining.push(quantity),
            (Some(_), Some(_)) => {
                return Err(LibraryError::Migration {
                    what: format!(
                        "quantity '{}' declares both a kind and a domain",
                        quantity.name
                    ),
                });
            }
            (None, None) => {
                return Err(LibraryError::Migration {
                    what: format!("quantity '{}' declares neither kind nor domain", quantity.name),
                });
            }
        }
    }

    library.quantities = remaining;
    library.version = 2;
    Ok(library)
}
