//! Driver error classification.

use crate::connection::DriverError;
use crate::error::OrmError;

/// Wrap a driver failure for `sql`, separating integrity constraint
/// violations from other query failures.
pub(crate) fn translate(error: DriverError, sql: &str) -> OrmError {
    if error.is_integrity_violation() {
        OrmError::Constraint {
            sql: sql.to_string(),
            source: error,
        }
    } else {
        OrmError::Query {
            sql: sql.to_string(),
            source: error,
        }
    }
}
