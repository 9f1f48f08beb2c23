//! Statement execution against a [`Connection`].
//!
//! Every builder goes through these two functions, so every driver failure is
//! translated the same way and every statement is logged once.

use log::debug;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

use super::error_handling::translate;
use crate::connection::{Connection, Row};
use crate::error::Result;
use crate::value::Value;

/// Prepare and execute a statement that returns no rows.
pub(crate) fn execute(connection: &dyn Connection, sql: &str, params: &[Value]) -> Result<()> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::execute_query_span(sql).entered();

    debug!("executing {sql} with {} parameter(s)", params.len());
    let mut statement = connection.prepare(sql).map_err(|e| translate(e, sql))?;
    statement.execute(params).map_err(|e| translate(e, sql))
}

/// Prepare and execute a query and fetch every row it produces.
///
/// Rows are fetched before returning, so the connection is free again when
/// the caller starts materializing them.
pub(crate) fn query(connection: &dyn Connection, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::execute_query_span(sql).entered();

    debug!("querying {sql} with {} parameter(s)", params.len());
    let mut statement = connection.prepare(sql).map_err(|e| translate(e, sql))?;
    statement.execute(params).map_err(|e| translate(e, sql))?;

    let mut rows = Vec::new();
    while let Some(row) = statement.fetch_row().map_err(|e| translate(e, sql))? {
        rows.push(row);
    }
    Ok(rows)
}
