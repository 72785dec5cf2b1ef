//! Meta-command models.

use serde::{Deserialize, Serialize};

/// Character that marks a cell as a meta-command.
pub const COMMAND_ESCAPE: char = '\\';

/// Suffix on a command name requesting extended output columns.
pub const DETAIL_SUFFIX: char = '+';

/// A parsed backslash command line, before routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name with escape and detail suffix removed.
    pub name: String,
    /// True when the typed name ended with `+`.
    pub detail: bool,
    /// Positional arguments in order.
    pub args: Vec<String>,
}

/// PostgreSQL relation kind, as stored in `pg_class.relkind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Ordinary table (`r`)
    Table,
    /// View (`v`)
    View,
    /// Materialized view (`m`)
    MaterializedView,
    /// Index (`i`)
    Index,
    /// Sequence (`S`)
    Sequence,
    /// Special (`s`)
    Special,
    /// Foreign table (`f`)
    ForeignTable,
}

impl ObjectKind {
    /// Every kind, in label-table order.
    pub const ALL: [ObjectKind; 7] = [
        Self::Table,
        Self::View,
        Self::MaterializedView,
        Self::Index,
        Self::Sequence,
        Self::Special,
        Self::ForeignTable,
    ];

    /// Catalog kind code.
    pub fn code(&self) -> char {
        match self {
            Self::Table => 'r',
            Self::View => 'v',
            Self::MaterializedView => 'm',
            Self::Index => 'i',
            Self::Sequence => 'S',
            Self::Special => 's',
            Self::ForeignTable => 'f',
        }
    }

    /// Human-readable label shown in listings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::View => "view",
            Self::MaterializedView => "materialized view",
            Self::Index => "index",
            Self::Sequence => "sequence",
            Self::Special => "special",
            Self::ForeignTable => "foreign table",
        }
    }
}

/// A routed meta-command, ready to run against a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    /// `\c` / `\connect`
    Connect {
        /// Raw `key=value` and flag tokens.
        args: Vec<String>,
    },
    /// `\conninfo`
    ConnectionInfo,
    /// `\d <table>`
    DescribeTable {
        /// Table identifier as typed.
        name: String,
    },
    /// `\d`, `\di`, `\dm`, `\ds`, `\dt`, `\dv`
    ListObjects {
        /// Kinds to include.
        kinds: Vec<ObjectKind>,
        /// Include size and description columns.
        detail: bool,
        /// Schema-name pattern, matched as a full-string regular expression.
        schema_pattern: Option<String>,
    },
    /// `\dn`
    ListSchemas {
        /// Include access privileges and description columns.
        detail: bool,
    },
}
