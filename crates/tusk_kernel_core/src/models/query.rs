//! Query result models.

use serde::{Deserialize, Serialize};

/// Text rendition of one statement's result.
///
/// Every value arrives as PostgreSQL's text output; `None` is SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names, empty when the statement returns no row description
    pub columns: Vec<String>,
    /// Result rows, each as long as `columns`
    pub rows: Vec<Vec<Option<String>>>,
    /// Row count reported by the server's command tag
    pub rows_affected: Option<u64>,
}

impl ResultSet {
    /// Create a result set with columns and rows; the row count follows the rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let rows_affected = Some(rows.len() as u64);
        Self { columns, rows, rows_affected }
    }

    /// Get the number of rows returned.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the statement produced a row description (a table to show).
    pub fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Get a cell as text, treating NULL and out-of-range as empty.
    pub fn text(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|v| v.as_deref())
            .unwrap_or("")
    }

    /// Get a cell, keeping NULL distinct from empty text.
    pub fn value(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(column)).and_then(|v| v.as_deref())
    }
}

/// Everything a raw statement cell produced, timed end to end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    /// One entry per statement, in execution order
    pub results: Vec<ResultSet>,
    /// Wall-clock time in seconds
    pub elapsed_secs: f64,
}

impl QueryOutcome {
    /// The last statement's result, which drives the summary line.
    pub fn last(&self) -> Option<&ResultSet> {
        self.results.last()
    }
}
