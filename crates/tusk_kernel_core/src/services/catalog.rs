//! Catalog queries behind the listing and describe commands.
//!
//! Queries PostgreSQL system catalogs the way `psql -E` shows them. All SQL
//! text is fixed; kind codes come from [`ObjectKind`] and anything the user
//! typed (schema patterns, table names) is bound as a parameter.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::KernelError;
use crate::models::{ColumnRow, ObjectKind, ResultSet, SectionKind, TableReport};
use crate::services::connection::DatabaseConnection;

/// A catalog statement with its bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    /// SQL text with `$n` placeholders
    pub sql: String,
    /// Values for the placeholders, in order
    pub params: Vec<String>,
}

impl CatalogQuery {
    fn fixed(sql: &str) -> Self {
        Self { sql: sql.to_string(), params: Vec::new() }
    }

    fn with_param(sql: &str, param: impl Into<String>) -> Self {
        Self { sql: sql.to_string(), params: vec![param.into()] }
    }

    async fn run<C: DatabaseConnection>(&self, conn: &mut C) -> Result<ResultSet, KernelError> {
        let params: Vec<&str> = self.params.iter().map(String::as_str).collect();
        conn.query(&self.sql, &params).await
    }
}

// ============================================================================
// Listing queries
// ============================================================================

/// Columns added to object listings by the `+` suffix.
const OBJECT_DETAIL_COLUMNS: &str = r#",
    pg_catalog.pg_size_pretty(pg_catalog.pg_table_size(c.oid)) AS "Size",
    pg_catalog.obj_description(c.oid, 'pg_class') AS "Description""#;

/// Restriction used when no schema pattern is given.
const VISIBLE_USER_OBJECTS: &str = "
  AND n.nspname <> 'pg_catalog'
  AND n.nspname <> 'information_schema'
  AND n.nspname !~ '^pg_toast'
  AND pg_catalog.pg_table_is_visible(c.oid)";

/// Columns added to the schema listing by the `+` suffix.
const SCHEMA_DETAIL_COLUMNS: &str = r#",
    pg_catalog.array_to_string(n.nspacl, E'\n') AS "Access privileges",
    pg_catalog.obj_description(n.oid, 'pg_namespace') AS "Description""#;

/// Anchor a user pattern so it must match the whole schema name.
pub fn full_match_pattern(pattern: &str) -> String {
    format!("^({pattern})$")
}

/// Build the object listing query for `\d`, `\di`, `\dm`, `\ds`, `\dt`, `\dv`.
pub fn list_objects_query(
    kinds: &[ObjectKind],
    detail: bool,
    schema_pattern: Option<&str>,
) -> CatalogQuery {
    let mut sql = String::from(
        r#"SELECT n.nspname::text AS "Schema",
    c.relname::text AS "Name",
    CASE c.relkind"#,
    );
    for kind in ObjectKind::ALL {
        let _ = write!(sql, " WHEN '{}' THEN '{}'", kind.code(), kind.label());
    }
    sql.push_str(
        r#" END AS "Type",
    pg_catalog.pg_get_userbyid(c.relowner)::text AS "Owner""#,
    );
    if detail {
        sql.push_str(OBJECT_DETAIL_COLUMNS);
    }

    let codes: Vec<String> = kinds.iter().map(|k| format!("'{}'", k.code())).collect();
    let _ = write!(
        sql,
        "
FROM pg_catalog.pg_class c
LEFT JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE c.relkind IN ({})",
        codes.join(", ")
    );

    let params = match schema_pattern {
        None => {
            sql.push_str(VISIBLE_USER_OBJECTS);
            Vec::new()
        }
        Some(pattern) => {
            sql.push_str("\n  AND n.nspname ~ $1");
            vec![full_match_pattern(pattern)]
        }
    };

    sql.push_str("\nORDER BY 1, 2");
    CatalogQuery { sql, params }
}

/// Build the schema listing query for `\dn`.
pub fn list_schemas_query(detail: bool) -> CatalogQuery {
    let mut sql = String::from(
        r#"SELECT n.nspname::text AS "Name",
    pg_catalog.pg_get_userbyid(n.nspowner)::text AS "Owner""#,
    );
    if detail {
        sql.push_str(SCHEMA_DETAIL_COLUMNS);
    }
    sql.push_str(
        "
FROM pg_catalog.pg_namespace n
WHERE n.nspname !~ '^pg_' AND n.nspname <> 'information_schema'
ORDER BY 1",
    );
    CatalogQuery::fixed(&sql)
}

// ============================================================================
// Table detail queries
// ============================================================================

/// Columns: name, type, not-null flag, default expression.
const TABLE_COLUMNS_SQL: &str = r#"
SELECT a.attname::text AS "Column",
    pg_catalog.format_type(a.atttypid, a.atttypmod) AS "Type",
    a.attnotnull::text AS not_null,
    pg_catalog.pg_get_expr(d.adbin, d.adrelid) AS default_value
FROM pg_catalog.pg_attribute a
LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
WHERE a.attrelid = pg_catalog.to_regclass($1)
  AND a.attnum > 0
  AND NOT a.attisdropped
ORDER BY a.attnum"#;

/// Indexes with the backing constraint's definition where there is one.
const TABLE_INDEXES_SQL: &str = r#"
SELECT c2.relname::text AS name,
    COALESCE(
        pg_catalog.pg_get_constraintdef(con.oid, true),
        pg_catalog.pg_get_indexdef(i.indexrelid, 0, true)
    ) AS definition
FROM pg_catalog.pg_index i
JOIN pg_catalog.pg_class c2 ON c2.oid = i.indexrelid
LEFT JOIN pg_catalog.pg_constraint con
    ON con.conrelid = i.indrelid
   AND con.conindid = i.indexrelid
   AND con.contype IN ('p', 'u', 'x')
WHERE i.indrelid = pg_catalog.to_regclass($1)
ORDER BY i.indisprimary DESC, i.indisunique DESC, c2.relname"#;

const TABLE_CHECKS_SQL: &str = r#"
SELECT r.conname::text AS name,
    pg_catalog.pg_get_constraintdef(r.oid, true) AS definition
FROM pg_catalog.pg_constraint r
WHERE r.conrelid = pg_catalog.to_regclass($1)
  AND r.contype = 'c'
ORDER BY 1"#;

/// User triggers, plus internal ones that have been disabled.
const TABLE_TRIGGERS_SQL: &str = r#"
SELECT t.tgname::text AS name,
    pg_catalog.pg_get_triggerdef(t.oid, true) AS definition
FROM pg_catalog.pg_trigger t
WHERE t.tgrelid = pg_catalog.to_regclass($1)
  AND (NOT t.tgisinternal OR (t.tgisinternal AND t.tgenabled = 'D'))
ORDER BY 1"#;

const TABLE_PARENTS_SQL: &str = r#"
SELECT c.oid::pg_catalog.regclass::text AS parent
FROM pg_catalog.pg_inherits i
JOIN pg_catalog.pg_class c ON c.oid = i.inhparent
WHERE i.inhrelid = pg_catalog.to_regclass($1)
ORDER BY i.inhseqno"#;

/// `CREATE [CONSTRAINT] TRIGGER <name> ` at the start of a trigger definition.
static TRIGGER_PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^CREATE\s+(?:CONSTRAINT\s+)?TRIGGER\s+(?:"(?:[^"]|"")*"|\S+)\s+"#)
        .expect("trigger preamble pattern is valid")
});

/// Drop the `CREATE TRIGGER name` preamble, leaving timing, events and body.
pub fn strip_trigger_preamble(definition: &str) -> &str {
    match TRIGGER_PREAMBLE.find(definition) {
        Some(m) => &definition[m.end()..],
        None => definition,
    }
}

/// Column rows from the columns query result.
pub fn column_rows(result: &ResultSet) -> Vec<ColumnRow> {
    (0..result.row_count())
        .map(|i| {
            ColumnRow::new(
                result.text(i, 0),
                result.text(i, 1),
                result.text(i, 2) == "true",
                result.value(i, 3),
            )
        })
        .collect()
}

/// `"name" definition` lines for index and check sections.
pub fn quoted_name_lines(result: &ResultSet) -> Vec<String> {
    (0..result.row_count())
        .map(|i| format!("\"{}\" {}", result.text(i, 0), result.text(i, 1)))
        .collect()
}

/// `name definition` lines for the trigger section.
pub fn trigger_lines(result: &ResultSet) -> Vec<String> {
    (0..result.row_count())
        .map(|i| format!("{} {}", result.text(i, 0), strip_trigger_preamble(result.text(i, 1))))
        .collect()
}

/// The single inheritance line, absent when the table has no parents.
pub fn inherits_lines(result: &ResultSet) -> Vec<String> {
    if result.is_empty() {
        return Vec::new();
    }
    let parents: Vec<&str> = (0..result.row_count()).map(|i| result.text(i, 0)).collect();
    vec![parents.join(", ")]
}

// ============================================================================
// Service
// ============================================================================

/// Catalog introspection service.
pub struct CatalogService;

impl CatalogService {
    /// List relations of the given kinds.
    pub async fn list_objects<C: DatabaseConnection>(
        conn: &mut C,
        kinds: &[ObjectKind],
        detail: bool,
        schema_pattern: Option<&str>,
    ) -> Result<ResultSet, KernelError> {
        tracing::debug!(?kinds, detail, schema_pattern, "Listing objects");
        list_objects_query(kinds, detail, schema_pattern).run(conn).await
    }

    /// List non-system schemas.
    pub async fn list_schemas<C: DatabaseConnection>(
        conn: &mut C,
        detail: bool,
    ) -> Result<ResultSet, KernelError> {
        tracing::debug!(detail, "Listing schemas");
        list_schemas_query(detail).run(conn).await
    }

    /// Build the `\d <table>` report.
    ///
    /// A table that does not resolve yields an empty column grid and no
    /// sections rather than an error.
    pub async fn describe_table<C: DatabaseConnection>(
        conn: &mut C,
        table: &str,
    ) -> Result<TableReport, KernelError> {
        tracing::debug!(table, "Describing table");

        let columns = CatalogQuery::with_param(TABLE_COLUMNS_SQL, table).run(conn).await?;
        let mut report = TableReport::new(table, column_rows(&columns));

        let indexes = CatalogQuery::with_param(TABLE_INDEXES_SQL, table).run(conn).await?;
        report.push_section(SectionKind::Indexes, quoted_name_lines(&indexes));

        let checks = CatalogQuery::with_param(TABLE_CHECKS_SQL, table).run(conn).await?;
        report.push_section(SectionKind::CheckConstraints, quoted_name_lines(&checks));

        let triggers = CatalogQuery::with_param(TABLE_TRIGGERS_SQL, table).run(conn).await?;
        report.push_section(SectionKind::Triggers, trigger_lines(&triggers));

        let parents = CatalogQuery::with_param(TABLE_PARENTS_SQL, table).run(conn).await?;
        report.push_section(SectionKind::Inherits, inherits_lines(&parents));

        if report.columns.is_empty() {
            tracing::debug!(table, "Table has no visible columns");
        }

        Ok(report)
    }
}
