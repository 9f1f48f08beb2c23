//! Span constructors for query execution and relation resolution.
//!
//! Callers enter the returned span for the duration of the operation:
//!
//! ```ignore
//! #[cfg(feature = "tracing")]
//! let _span = tracing_helpers::execute_query_span(sql).entered();
//! ```

use tracing::{debug_span, Span};

/// Span around prepare + execute of one statement.
pub fn execute_query_span(sql: &str) -> Span {
    debug_span!("mooring.query", sql = %sql)
}

/// Span around the deferred query of a lazy relation handle.
pub fn resolve_relation_span(entity: &str, kind: &'static str) -> Span {
    debug_span!("mooring.relation", entity = %entity, kind = kind)
}
