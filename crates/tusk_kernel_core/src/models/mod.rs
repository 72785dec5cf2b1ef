//! Data models for the Tusk kernel.
//!
//! This module contains all core data structures:
//! - `command` - Command, MetaCommand, ObjectKind
//! - `connection` - ConnectionParameters, ConnectionInfo
//! - `query` - ResultSet, QueryOutcome
//! - `report` - TableReport and its sections
//! - `reply` - ExecuteReply, Output

pub mod command;
pub mod connection;
pub mod query;
pub mod reply;
pub mod report;

pub use command::{Command, MetaCommand, ObjectKind};
pub use connection::{ConnectionInfo, ConnectionParameters};
pub use query::{QueryOutcome, ResultSet};
pub use reply::{ExecuteReply, ExecutionStatus, Output, StreamName};
pub use report::{ColumnRow, ReportSection, SectionKind, TableReport};
