//! Error types for the Tusk kernel.
//!
//! Every failure a cell can produce is a [`KernelError`]. The session never
//! retries or swallows one: it is turned into an [`ErrorReport`] and handed
//! back to the host alongside the reply.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Meta-command name not present in the routing table.
    #[error("Unknown command: '{name}'")]
    UnknownCommand {
        /// The command name as typed, without the escape character.
        name: String,
    },

    /// A listing command received more than one positional argument.
    #[error("Too many arguments for \\{command}: expected at most 1, got {count}")]
    TooManyArguments {
        /// Command name without the detail suffix.
        command: String,
        /// Number of positional arguments received.
        count: usize,
    },

    /// Both `password=...` and the `nopassword` flag were given to connect.
    #[error("you specified both a password and the nopassword flag")]
    ConflictingCredentials,

    /// A bare connect token other than `nopassword`.
    #[error("Unsupported flag '{flag}' (only 'nopassword' is supported)")]
    UnsupportedFlag {
        /// The offending token.
        flag: String,
    },

    /// A connect parameter with an unknown key or an unparsable value.
    #[error("Invalid connection parameter '{key}': {message}")]
    InvalidParameter {
        /// Parameter key as typed.
        key: String,
        /// What was wrong with it.
        message: String,
    },

    /// Anything raised by the database client: syntax errors, missing
    /// objects, authentication and connectivity failures alike.
    #[error("{message}")]
    Database {
        /// PostgreSQL (or client) error message.
        message: String,
        /// Additional detail from PostgreSQL.
        detail: Option<String>,
        /// PostgreSQL hint.
        hint: Option<String>,
        /// Position in the statement (1-indexed).
        position: Option<usize>,
        /// SQLSTATE code (e.g., "42P01").
        code: Option<String>,
        /// Underlying client error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The interactive password prompt failed.
    #[error("Password prompt failed: {message}")]
    Prompt {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unexpected internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl KernelError {
    // ========== Constructors ==========

    /// Create an unknown command error.
    pub fn unknown_command(name: impl Into<String>) -> Self {
        Self::UnknownCommand { name: name.into() }
    }

    /// Create a too-many-arguments error.
    pub fn too_many_arguments(command: impl Into<String>, count: usize) -> Self {
        Self::TooManyArguments { command: command.into(), count }
    }

    /// Create an unsupported flag error.
    pub fn unsupported_flag(flag: impl Into<String>) -> Self {
        Self::UnsupportedFlag { flag: flag.into() }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter { key: key.into(), message: message.into() }
    }

    /// Create a database error with only a message.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            detail: None,
            hint: None,
            position: None,
            code: None,
            source: None,
        }
    }

    /// Create a prompt error with source.
    pub fn prompt_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Prompt { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    // ========== Methods ==========

    /// Get the error kind name reported to the host.
    pub fn ename(&self) -> &'static str {
        match self {
            Self::UnknownCommand { .. } => "UnknownCommand",
            Self::TooManyArguments { .. } => "TooManyArguments",
            Self::ConflictingCredentials => "ConflictingCredentials",
            Self::UnsupportedFlag { .. } => "UnsupportedFlag",
            Self::InvalidParameter { .. } => "InvalidParameter",
            Self::Database { .. } => "DatabaseError",
            Self::Prompt { .. } => "PromptError",
            Self::Internal { .. } => "InternalError",
        }
    }

    /// Get actionable hint for the user.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::UnknownCommand { .. } => {
                Some("Supported commands: \\c, \\conninfo, \\d, \\di, \\dm, \\dn, \\ds, \\dt, \\dv")
            }
            Self::TooManyArguments { .. } => Some("Pass a single schema pattern"),
            Self::ConflictingCredentials => Some("Drop either password= or nopassword"),
            Self::UnsupportedFlag { .. } => Some("Parameters are written as key=value"),
            Self::InvalidParameter { .. } => {
                Some("Supported keys: host, port, user, password, dbname, application_name, connect_timeout, options")
            }
            Self::Database { hint, .. } => hint.as_deref(),
            Self::Prompt { .. } => Some("Pass password=... or nopassword to \\connect"),
            Self::Internal { .. } => Some("Please report this issue"),
        }
    }

    /// Get the SQLSTATE code (if applicable).
    pub fn pg_code(&self) -> Option<&str> {
        match self {
            Self::Database { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Convert to the report sent back to the host.
    ///
    /// The traceback holds the message, any PostgreSQL details, the hint and
    /// then the chain of underlying causes, one entry per line.
    pub fn to_error_report(&self) -> ErrorReport {
        let mut traceback = vec![format!("{}: {}", self.ename(), self)];

        if let Self::Database { detail, position, code, .. } = self {
            if let Some(code) = code {
                traceback.push(format!("Code: {code}"));
            }
            if let Some(pos) = position {
                traceback.push(format!("Position: {pos}"));
            }
            if let Some(detail) = detail {
                traceback.push(format!("Detail: {detail}"));
            }
        }
        if let Some(hint) = self.hint() {
            traceback.push(format!("Hint: {hint}"));
        }

        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            traceback.push(format!("Caused by: {err}"));
            cause = err.source();
        }

        ErrorReport { ename: self.ename().to_string(), evalue: self.to_string(), traceback }
    }
}

/// Error payload of a failed execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error kind name (e.g., "UnknownCommand").
    pub ename: String,
    /// Human-readable message.
    pub evalue: String,
    /// Rendered trace, one entry per line.
    pub traceback: Vec<String>,
}

// ========== Error Conversions ==========

/// Convert from tokio_postgres::Error to KernelError.
///
/// Server errors keep their SQLSTATE details; client-side failures
/// (connection refused, closed connection) keep the client message. Both end
/// up as [`KernelError::Database`].
impl From<tokio_postgres::Error> for KernelError {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let message = db_err.message().to_string();
            let detail = db_err.detail().map(String::from);
            let hint = db_err.hint().map(String::from);
            let position = db_err.position().and_then(|p| match p {
                tokio_postgres::error::ErrorPosition::Original(pos) => Some(*pos as usize),
                tokio_postgres::error::ErrorPosition::Internal { .. } => None,
            });
            let code = Some(db_err.code().code().to_string());
            return KernelError::Database { message, detail, hint, position, code, source: None };
        }

        let message =
            if err.is_closed() { "Connection closed".to_string() } else { err.to_string() };
        KernelError::Database {
            message,
            detail: None,
            hint: None,
            position: None,
            code: None,
            source: Some(Box::new(err)),
        }
    }
}

/// Convert from std::io::Error to KernelError.
impl From<std::io::Error> for KernelError {
    fn from(err: std::io::Error) -> Self {
        KernelError::Internal { message: err.to_string(), source: Some(Box::new(err)) }
    }
}

/// Convert from serde_json::Error to KernelError.
impl From<serde_json::Error> for KernelError {
    fn from(err: serde_json::Error) -> Self {
        KernelError::Internal { message: format!("JSON error: {err}"), source: Some(Box::new(err)) }
    }
}
