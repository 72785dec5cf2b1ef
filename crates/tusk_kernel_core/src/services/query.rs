//! Raw statement execution.
//!
//! Cells that are not meta-commands go to the server unchanged through the
//! simple query protocol, so a cell may hold several statements.

use std::time::Instant;

use crate::error::KernelError;
use crate::models::QueryOutcome;
use crate::services::connection::DatabaseConnection;

/// Service for executing user SQL.
pub struct QueryService;

impl QueryService {
    /// Execute a cell verbatim and time it.
    pub async fn execute<C: DatabaseConnection>(
        conn: &mut C,
        sql: &str,
    ) -> Result<QueryOutcome, KernelError> {
        let start = Instant::now();

        tracing::debug!(sql_len = sql.len(), "Executing statement");

        let results = conn.simple_query(sql).await.inspect_err(|e| {
            tracing::warn!(error = %e, code = e.pg_code(), "Statement failed");
        })?;
        let elapsed_secs = start.elapsed().as_secs_f64();

        tracing::debug!(
            statements = results.len(),
            row_count = results.last().map(|r| r.row_count()).unwrap_or(0),
            elapsed_ms = (elapsed_secs * 1000.0) as u64,
            "Statement completed"
        );

        Ok(QueryOutcome { results, elapsed_secs })
    }
}
