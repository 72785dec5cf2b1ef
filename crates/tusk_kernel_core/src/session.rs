//! Kernel session.
//!
//! A [`KernelSession`] is the context every cell runs against. It owns at
//! most one live connection; `\connect` closes and replaces it. Cells run one
//! at a time, each to completion, and every outcome (including errors) comes
//! back as an [`ExecuteReply`].

use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use crate::config::KernelConfig;
use crate::error::KernelError;
use crate::models::connection::NO_PASSWORD_FLAG;
use crate::models::{
    ConnectionInfo, ConnectionParameters, ExecuteReply, MetaCommand, Output, ResultSet,
};
use crate::services::connection::{Connector, DatabaseConnection, PgConnector};
use crate::services::dispatcher::{is_meta_command, Dispatcher};
use crate::services::prompt::{SecretPrompt, TerminalPrompt, PASSWORD_PROMPT};
use crate::services::render::{render_result_table, render_table_report, summary_line};
use crate::services::{CatalogService, QueryService};

/// Reported by `\conninfo` when there is no live connection.
pub const NOT_CONNECTED_MESSAGE: &str =
    "-- not connected (use \\connect to initiate a connection) --";

/// The connection the session currently holds.
struct LiveConnection<T> {
    conn: T,
    info: ConnectionInfo,
}

/// One notebook session against one PostgreSQL server.
pub struct KernelSession<C: Connector = PgConnector, P: SecretPrompt = TerminalPrompt> {
    /// Identifies this session in logs
    id: Uuid,
    /// Defaults for `\connect`
    config: KernelConfig,
    /// Opens connections
    connector: C,
    /// Asks for passwords
    prompt: P,
    /// At most one live connection
    connection: Option<LiveConnection<C::Connection>>,
    /// Number of cells executed so far
    execution_count: u64,
}

impl KernelSession {
    /// Create a session that connects with tokio-postgres and prompts on the terminal.
    pub fn new(config: KernelConfig) -> Self {
        Self::with_parts(config, PgConnector, TerminalPrompt)
    }
}

impl<C: Connector, P: SecretPrompt> KernelSession<C, P> {
    /// Create a session from its collaborators.
    pub fn with_parts(config: KernelConfig, connector: C, prompt: P) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session_id = %id, "Kernel session created");
        Self { id, config, connector, prompt, connection: None, execution_count: 0 }
    }

    /// Get the session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the session configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Number of cells executed so far.
    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    /// Check if a connection is open.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Details of the live connection, if any.
    pub fn connection_info(&self) -> Option<&ConnectionInfo> {
        self.connection.as_ref().map(|live| &live.info)
    }

    // ========== Execution ==========

    /// Run one cell and build the reply for the host.
    ///
    /// Cells starting with `\` are meta-commands; everything else is sent to
    /// the server verbatim.
    pub async fn execute(&mut self, code: &str) -> ExecuteReply {
        self.execution_count += 1;
        let execution_count = self.execution_count;
        let mut outputs = Vec::new();

        tracing::debug!(session_id = %self.id, execution_count, "Executing cell");

        let result = self.run_cell(code, &mut outputs).await;
        match result {
            Ok(()) => ExecuteReply::ok(execution_count, outputs),
            Err(e) => {
                tracing::warn!(
                    session_id = %self.id,
                    execution_count,
                    error_kind = e.ename(),
                    error = %e,
                    "Cell failed"
                );
                ExecuteReply::error(execution_count, outputs, e.to_error_report())
            }
        }
    }

    async fn run_cell(&mut self, code: &str, outputs: &mut Vec<Output>) -> Result<(), KernelError> {
        if is_meta_command(code) {
            let command = Dispatcher::dispatch(code)?;
            self.run_command(command, outputs).await
        } else {
            self.run_sql(code, outputs).await
        }
    }

    /// Run a routed meta-command.
    pub async fn run_command(
        &mut self,
        command: MetaCommand,
        outputs: &mut Vec<Output>,
    ) -> Result<(), KernelError> {
        match command {
            MetaCommand::Connect { args } => {
                self.connect(&args).await?;
                outputs.push(Output::stdout("ok"));
            }
            MetaCommand::ConnectionInfo => {
                outputs.push(Output::stdout(self.connection_info_text()));
            }
            MetaCommand::DescribeTable { name } => {
                let conn = self.connection().await?;
                let report = CatalogService::describe_table(conn, &name).await?;
                outputs.push(Output::html(render_table_report(&report)));
            }
            MetaCommand::ListObjects { kinds, detail, schema_pattern } => {
                let conn = self.connection().await?;
                let start = Instant::now();
                let result =
                    CatalogService::list_objects(conn, &kinds, detail, schema_pattern.as_deref())
                        .await?;
                push_result(outputs, &result, start.elapsed().as_secs_f64());
            }
            MetaCommand::ListSchemas { detail } => {
                let conn = self.connection().await?;
                let start = Instant::now();
                let result = CatalogService::list_schemas(conn, detail).await?;
                push_result(outputs, &result, start.elapsed().as_secs_f64());
            }
        }
        Ok(())
    }

    /// Run user SQL, rendering every statement that returned columns.
    pub async fn run_sql(&mut self, sql: &str, outputs: &mut Vec<Output>) -> Result<(), KernelError> {
        let conn = self.connection().await?;
        let outcome = QueryService::execute(conn, sql).await?;

        for result in outcome.results.iter().filter(|r| r.has_columns()) {
            outputs.push(Output::html(render_result_table(result)));
        }
        outputs.push(Output::stdout(summary_line(outcome.last(), outcome.elapsed_secs)));
        Ok(())
    }

    // ========== Connection Management ==========

    /// Close any open connection, then connect with `\connect` arguments.
    ///
    /// Flag and credential errors are raised before the password prompt and
    /// before any network activity.
    pub async fn connect(&mut self, args: &[String]) -> Result<(), KernelError> {
        self.disconnect();

        let mut params = ConnectionParameters::parse(args, &self.config)?;
        if params.needs_password() {
            params.password = Some(self.prompt.prompt_secret(PASSWORD_PROMPT)?);
        }

        tracing::debug!(session_id = %self.id, params = ?params, "Connecting");

        let conn = self.connector.connect(&params).await?;
        self.connection =
            Some(LiveConnection { conn, info: ConnectionInfo { params, connected_at: Utc::now() } });
        Ok(())
    }

    /// Close the open connection, if any.
    pub fn disconnect(&mut self) {
        if let Some(live) = self.connection.take() {
            tracing::debug!(
                session_id = %self.id,
                host = %live.info.params.host,
                connected_at = %live.info.connected_at,
                "Disconnecting"
            );
            live.conn.close();
        }
    }

    /// Text shown by `\conninfo`.
    pub fn connection_info_text(&self) -> String {
        match self.connection_info() {
            Some(info) => info.params.describe(),
            None => NOT_CONNECTED_MESSAGE.to_string(),
        }
    }

    /// The live connection, opening a default one (`nopassword`) if needed.
    async fn connection(&mut self) -> Result<&mut C::Connection, KernelError> {
        if self.connection.is_none() {
            tracing::debug!(session_id = %self.id, "No connection; connecting with defaults");
            self.connect(&[NO_PASSWORD_FLAG.to_string()]).await?;
        }
        self.connection
            .as_mut()
            .map(|live| &mut live.conn)
            .ok_or_else(|| KernelError::internal("connection missing after connect"))
    }
}

impl<C: Connector, P: SecretPrompt> Drop for KernelSession<C, P> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Publish a catalog listing: the table, then the summary line.
fn push_result(outputs: &mut Vec<Output>, result: &ResultSet, elapsed_secs: f64) {
    outputs.push(Output::html(render_result_table(result)));
    outputs.push(Output::stdout(summary_line(Some(result), elapsed_secs)));
}
