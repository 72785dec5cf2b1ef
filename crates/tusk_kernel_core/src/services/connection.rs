//! Database connections.
//!
//! The session talks to PostgreSQL through two small traits:
//! - [`Connector`] opens a connection from [`ConnectionParameters`]
//! - [`DatabaseConnection`] runs raw and parameterized statements
//!
//! [`PgConnector`] / [`PgConnection`] implement them on tokio-postgres.
//! Connections run in autocommit mode: tokio-postgres never opens an
//! implicit transaction, so every statement commits on its own and explicit
//! `BEGIN`/`COMMIT` in user SQL behaves as typed.

use std::future::Future;
use std::time::Duration;

use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, SimpleQueryMessage};

use crate::error::KernelError;
use crate::models::{ConnectionParameters, ResultSet};

/// A live connection able to run statements.
pub trait DatabaseConnection: Send {
    /// Run one or more raw statements with the simple query protocol.
    ///
    /// Returns one result per completed statement, in order.
    fn simple_query(
        &mut self,
        sql: &str,
    ) -> impl Future<Output = Result<Vec<ResultSet>, KernelError>> + Send;

    /// Run a single statement with text parameters bound to `$1..$n`.
    ///
    /// Every selected column must be of a text-like type.
    fn query(
        &mut self,
        sql: &str,
        params: &[&str],
    ) -> impl Future<Output = Result<ResultSet, KernelError>> + Send;

    /// Close the connection.
    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// Opens connections.
pub trait Connector: Send {
    /// Connection type produced.
    type Connection: DatabaseConnection;

    /// Open a connection. Parameters are complete: any password prompt has
    /// already run.
    fn connect(
        &self,
        params: &ConnectionParameters,
    ) -> impl Future<Output = Result<Self::Connection, KernelError>> + Send;
}

/// Connector backed by tokio-postgres.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

impl PgConnector {
    /// Build the tokio-postgres configuration for a connect attempt.
    pub fn pg_config(params: &ConnectionParameters) -> tokio_postgres::Config {
        let mut pg_config = tokio_postgres::Config::new();
        pg_config.host(&params.host);
        pg_config.port(params.port);
        pg_config.user(&params.user);
        if let Some(password) = &params.password {
            pg_config.password(password);
        }
        if let Some(dbname) = &params.dbname {
            pg_config.dbname(dbname);
        }
        if let Some(options) = &params.options {
            pg_config.options(options);
        }
        pg_config.application_name(&params.application_name);
        pg_config.connect_timeout(Duration::from_secs(params.connect_timeout_secs as u64));
        pg_config
    }
}

impl Connector for PgConnector {
    type Connection = PgConnection;

    async fn connect(&self, params: &ConnectionParameters) -> Result<PgConnection, KernelError> {
        let pg_config = Self::pg_config(params);

        let (client, connection) = pg_config.connect(NoTls).await.map_err(|e| {
            tracing::warn!(host = %params.host, port = params.port, error = %e, "Connection failed");
            KernelError::from(e)
        })?;

        // The connection object drives the socket; it finishes once the client is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "Connection terminated with error");
            }
        });

        tracing::info!(
            host = %params.host,
            port = params.port,
            user = %params.user,
            "Connection established"
        );

        Ok(PgConnection { client })
    }
}

/// A tokio-postgres client.
pub struct PgConnection {
    client: tokio_postgres::Client,
}

impl DatabaseConnection for PgConnection {
    async fn simple_query(&mut self, sql: &str) -> Result<Vec<ResultSet>, KernelError> {
        let messages = self.client.simple_query(sql).await?;
        Ok(collect_simple_results(messages))
    }

    async fn query(&mut self, sql: &str, params: &[&str]) -> Result<ResultSet, KernelError> {
        let statement = self.client.prepare(sql).await?;
        let columns: Vec<String> =
            statement.columns().iter().map(|c| c.name().to_string()).collect();

        let bound: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let rows = self.client.query(&statement, &bound).await?;

        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut cells = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                cells.push(row.try_get::<_, Option<String>>(idx)?);
            }
            values.push(cells);
        }

        Ok(ResultSet::new(columns, values))
    }

    fn close(self) {
        drop(self.client);
        tracing::info!("Connection closed");
    }
}

/// What a simple-protocol message contributes to a statement result.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StatementEvent {
    /// Column names from the row description
    Columns(Vec<String>),
    /// One data row
    Row(Vec<Option<String>>),
    /// Statement finished with the count from its command tag
    Complete(u64),
}

impl StatementEvent {
    fn from_message(message: SimpleQueryMessage) -> Option<Self> {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                Some(Self::Columns(columns.iter().map(|c| c.name().to_string()).collect()))
            }
            SimpleQueryMessage::Row(row) => {
                Some(Self::Row((0..row.len()).map(|i| row.get(i).map(String::from)).collect()))
            }
            SimpleQueryMessage::CommandComplete(count) => Some(Self::Complete(count)),
            _ => None,
        }
    }
}

/// Fold simple-protocol messages into one result per completed statement.
fn collect_simple_results(messages: Vec<SimpleQueryMessage>) -> Vec<ResultSet> {
    fold_statements(messages.into_iter().filter_map(StatementEvent::from_message))
}

fn fold_statements(events: impl IntoIterator<Item = StatementEvent>) -> Vec<ResultSet> {
    let mut results = Vec::new();
    let mut current = ResultSet::default();

    for event in events {
        match event {
            StatementEvent::Columns(columns) => current.columns = columns,
            StatementEvent::Row(values) => current.rows.push(values),
            StatementEvent::Complete(count) => {
                current.rows_affected = Some(count);
                results.push(std::mem::take(&mut current));
            }
        }
    }

    results
}
