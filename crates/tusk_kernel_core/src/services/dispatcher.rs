//! Meta-command parsing and routing.
//!
//! A cell beginning with `\` is split on spaces into a name and positional
//! arguments, then mapped onto a [`MetaCommand`]. The routing table is fixed
//! and case-sensitive.

use crate::error::KernelError;
use crate::models::command::{Command, MetaCommand, ObjectKind, COMMAND_ESCAPE, DETAIL_SUFFIX};

/// Kinds listed by `\d` without an argument.
const DEFAULT_LISTING: &[ObjectKind] = &[
    ObjectKind::Table,
    ObjectKind::View,
    ObjectKind::MaterializedView,
    ObjectKind::Sequence,
    ObjectKind::ForeignTable,
];

/// Listing commands and the kinds each one shows.
fn listing_kinds(name: &str) -> Option<&'static [ObjectKind]> {
    match name {
        "d" => Some(DEFAULT_LISTING),
        "di" => Some(&[ObjectKind::Index]),
        "dm" => Some(&[ObjectKind::MaterializedView]),
        "ds" => Some(&[ObjectKind::Sequence]),
        "dt" => Some(&[ObjectKind::Table]),
        "dv" => Some(&[ObjectKind::View]),
        _ => None,
    }
}

/// Check whether a cell is a meta-command rather than SQL.
pub fn is_meta_command(code: &str) -> bool {
    code.starts_with(COMMAND_ESCAPE)
}

/// Parser and router for backslash commands.
pub struct Dispatcher;

impl Dispatcher {
    /// Parse and route a command line in one step.
    pub fn dispatch(line: &str) -> Result<MetaCommand, KernelError> {
        let command = Self::parse(line)?;
        Self::route(command)
    }

    /// Split a command line into name, detail flag and arguments.
    ///
    /// The line must start with the escape character; callers check this with
    /// [`is_meta_command`] first.
    pub fn parse(line: &str) -> Result<Command, KernelError> {
        let body = line
            .strip_prefix(COMMAND_ESCAPE)
            .ok_or_else(|| KernelError::internal("meta-command must start with '\\'"))?;

        let mut tokens = body.trim_end_matches(['\r', '\n']).split(' ').filter(|t| !t.is_empty());
        let raw_name = tokens.next().unwrap_or_default();
        let args: Vec<String> = tokens.map(String::from).collect();

        let (name, detail) = match raw_name.strip_suffix(DETAIL_SUFFIX) {
            Some(stripped) => (stripped, true),
            None => (raw_name, false),
        };

        tracing::debug!(command = name, detail, arg_count = args.len(), "Parsed meta-command");

        Ok(Command { name: name.to_string(), detail, args })
    }

    /// Map a parsed command onto the operation it names.
    pub fn route(command: Command) -> Result<MetaCommand, KernelError> {
        let Command { name, detail, mut args } = command;

        match name.as_str() {
            "c" | "connect" => return Ok(MetaCommand::Connect { args }),
            "conninfo" => return Ok(MetaCommand::ConnectionInfo),
            "d" if args.len() == 1 => {
                return Ok(MetaCommand::DescribeTable { name: args.remove(0) });
            }
            "dn" => return Ok(MetaCommand::ListSchemas { detail }),
            _ => {}
        }

        let Some(kinds) = listing_kinds(&name) else {
            tracing::debug!(command = %name, "Unknown meta-command");
            return Err(KernelError::unknown_command(name));
        };

        if args.len() > 1 {
            return Err(KernelError::too_many_arguments(name, args.len()));
        }

        Ok(MetaCommand::ListObjects { kinds: kinds.to_vec(), detail, schema_pattern: args.pop() })
    }
}
