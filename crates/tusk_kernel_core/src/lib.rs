//! Core of the Tusk PostgreSQL notebook kernel.
//!
//! Cells are either raw SQL, sent to the server unchanged, or psql-style
//! meta-commands (`\dt`, `\d table`, `\dn+`, `\connect ...`) that are turned
//! into catalog queries and rendered as HTML.
//!
//! - **error**: Error kinds and the report sent back to the host
//! - **config**: Connection defaults
//! - **models**: Commands, parameters, result sets, reports, replies
//! - **services**: Dispatcher, catalog queries, connections, rendering
//! - **session**: The per-notebook context owning the connection
//! - **logging**: Structured logging setup

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod session;

#[cfg(test)]
mod verification_tests;

pub use config::KernelConfig;
pub use error::{ErrorReport, KernelError};
pub use models::{
    ColumnRow, Command, ConnectionInfo, ConnectionParameters, ExecuteReply, ExecutionStatus,
    MetaCommand, ObjectKind, Output, QueryOutcome, ResultSet, SectionKind, StreamName, TableReport,
};
pub use services::{
    CatalogService, Connector, DatabaseConnection, Dispatcher, PgConnector, QueryService,
    SecretPrompt, TerminalPrompt,
};
pub use session::KernelSession;
