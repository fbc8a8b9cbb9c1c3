//! Slice-scoped action-type naming.

/// Derive the action type for a handler within a slice: `"<slice>/<handler>"`.
///
/// Pure and total; no escaping is performed. Callers keep handler names
/// unique within a slice and slice names unique globally.
pub fn scoped(slice: &str, handler: &str) -> String {
    format!("{slice}/{handler}")
}
