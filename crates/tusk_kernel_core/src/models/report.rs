//! Table detail report models.

use serde::{Deserialize, Serialize};

/// One row of the column grid in `\d <table>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRow {
    /// Column name
    pub name: String,
    /// Type as rendered by `format_type`
    pub data_type: String,
    /// `not null` and/or `default <expr>`, space separated; may be empty
    pub modifiers: String,
}

impl ColumnRow {
    /// Build a column row, deriving the modifier text.
    pub fn new(
        name: impl Into<String>,
        data_type: impl Into<String>,
        not_null: bool,
        default: Option<&str>,
    ) -> Self {
        Self { name: name.into(), data_type: data_type.into(), modifiers: modifiers(not_null, default) }
    }
}

/// Combine the nullability flag and default expression into modifier text.
pub fn modifiers(not_null: bool, default: Option<&str>) -> String {
    let mut parts = Vec::with_capacity(2);
    if not_null {
        parts.push("not null".to_string());
    }
    if let Some(expr) = default {
        parts.push(format!("default {expr}"));
    }
    parts.join(" ")
}

/// Optional sections of a table report, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    /// Indexes and index-backed constraints
    Indexes,
    /// CHECK constraints
    CheckConstraints,
    /// Triggers
    Triggers,
    /// Parent tables
    Inherits,
}

impl SectionKind {
    /// Section heading.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Indexes => "Indexes",
            Self::CheckConstraints => "Check constraints",
            Self::Triggers => "Triggers",
            Self::Inherits => "Inherits",
        }
    }
}

/// A titled block of lines under the column grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Which section this is
    pub kind: SectionKind,
    /// Lines in display order
    pub lines: Vec<String>,
}

impl ReportSection {
    /// Section heading.
    pub fn title(&self) -> &'static str {
        self.kind.title()
    }
}

/// Everything `\d <table>` shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    /// Table identifier as requested
    pub table_name: String,
    /// Columns in attribute order
    pub columns: Vec<ColumnRow>,
    /// Non-empty sections, ordered by [`SectionKind`]
    pub sections: Vec<ReportSection>,
}

impl TableReport {
    /// Create a report with no sections.
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnRow>) -> Self {
        Self { table_name: table_name.into(), columns, sections: Vec::new() }
    }

    /// Add a section. Empty sections are dropped and order is kept fixed
    /// regardless of insertion order.
    pub fn push_section(&mut self, kind: SectionKind, lines: Vec<String>) {
        if lines.is_empty() {
            return;
        }
        self.sections.push(ReportSection { kind, lines });
        self.sections.sort_by_key(|s| s.kind);
    }

    /// Find a section by kind.
    pub fn section(&self, kind: SectionKind) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }
}
