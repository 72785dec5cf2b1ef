//! Execution reply models sent back to the host.

use serde::{Deserialize, Serialize};

use crate::error::ErrorReport;

/// Outcome of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Cell ran to completion
    Ok,
    /// Cell failed; see `ExecuteReply::error`
    Error,
}

/// Stream an output text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamName {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

/// One published output, in publication order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Output {
    /// Rich display data
    DisplayData {
        /// Rendered `text/html`
        html: String,
    },
    /// Plain text
    Stream {
        /// Target stream
        name: StreamName,
        /// Text content
        text: String,
    },
}

impl Output {
    /// Create an HTML display output.
    pub fn html(html: impl Into<String>) -> Self {
        Self::DisplayData { html: html.into() }
    }

    /// Create a stdout text output.
    pub fn stdout(text: impl Into<String>) -> Self {
        Self::Stream { name: StreamName::Stdout, text: text.into() }
    }
}

/// Reply to one `execute` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteReply {
    /// ok or error
    pub status: ExecutionStatus,
    /// Counter of this execution within the session (1-based)
    pub execution_count: u64,
    /// Outputs published while running
    pub outputs: Vec<Output>,
    /// Error details when `status` is error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl ExecuteReply {
    /// Successful reply.
    pub fn ok(execution_count: u64, outputs: Vec<Output>) -> Self {
        Self { status: ExecutionStatus::Ok, execution_count, outputs, error: None }
    }

    /// Failed reply.
    pub fn error(execution_count: u64, outputs: Vec<Output>, report: ErrorReport) -> Self {
        Self { status: ExecutionStatus::Error, execution_count, outputs, error: Some(report) }
    }

    /// Check if the execution succeeded.
    pub fn is_ok(&self) -> bool {
        self.status == ExecutionStatus::Ok
    }

    /// Concatenated stdout text.
    pub fn stdout_text(&self) -> String {
        self.outputs
            .iter()
            .filter_map(|o| match o {
                Output::Stream { name: StreamName::Stdout, text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All HTML outputs in order.
    pub fn html_outputs(&self) -> Vec<&str> {
        self.outputs
            .iter()
            .filter_map(|o| match o {
                Output::DisplayData { html } => Some(html.as_str()),
                _ => None,
            })
            .collect()
    }
}
