//! Hierarchical hook resolution
//!
//! A unit's name minus its marker is its subject path, e.g. `company`,
//! `finance`, `invoice` for `test_case_company_finance_invoice`. Hooks are
//! looked up for decreasing prefixes of that path, so the most specific hook
//! wins and a hook for a broader subject is shared by every unit beneath it:
//!
//! ```text
//! test_setup_company_finance_invoice   (tried first)
//! test_setup_company_finance
//! test_setup_company                   (tried last)
//! ```
//!
//! Lookups use the unit's schema and exact names.

use dbunit_core::{Conventions, HookKind, QualifiedName};
use dbunit_engine::{Catalog, RoutineHandle};

/// Find the most specific hook for a unit
///
/// `prefix_tokens` is the number of leading delimiter-separated tokens that
/// make up the unit's own marker. Returns `None` when no candidate exists,
/// including when the unit has no subject path.
pub fn resolve(
    catalog: &Catalog,
    unit: &QualifiedName,
    prefix_tokens: usize,
    marker: &str,
    delimiter: &str,
) -> Option<RoutineHandle> {
    if delimiter.is_empty() {
        return None;
    }
    let tokens: Vec<&str> = unit.name.split(delimiter).collect();
    let subject = tokens.get(prefix_tokens..)?;
    if subject.iter().all(|token| token.is_empty()) {
        return None;
    }

    (1..=subject.len()).rev().find_map(|len| {
        let candidate = format!("{}{}{}", marker, delimiter, subject[..len].join(delimiter));
        catalog.lookup(&unit.sibling(candidate))
    })
}

/// Find the hook of `kind` for a unit using the configured conventions
pub fn resolve_hook(
    catalog: &Catalog,
    conventions: &Conventions,
    unit: &QualifiedName,
    kind: HookKind,
) -> Option<RoutineHandle> {
    resolve(
        catalog,
        unit,
        conventions.prefix_token_count(&conventions.test_case),
        conventions.marker(kind),
        &conventions.delimiter,
    )
}
