//! Services behind the kernel session.
//!
//! - `dispatcher` - Backslash command parsing and routing
//! - `catalog` - Catalog queries for listings and table reports
//! - `connection` - Connector traits and the tokio-postgres implementation
//! - `query` - Raw statement execution with timing
//! - `render` - HTML tables, reports and duration formatting
//! - `prompt` - Interactive password prompt

pub mod catalog;
pub mod connection;
pub mod dispatcher;
pub mod prompt;
pub mod query;
pub mod render;

pub use catalog::CatalogService;
pub use connection::{Connector, DatabaseConnection, PgConnection, PgConnector};
pub use dispatcher::{is_meta_command, Dispatcher};
pub use prompt::{SecretPrompt, TerminalPrompt};
pub use query::QueryService;
