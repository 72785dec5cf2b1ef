//! End-to-end behavior of a kernel session against an in-memory connector.
//!
//! The fake connector records every connect, statement and close, and answers
//! catalog queries from a responder closure, so these tests exercise
//! dispatch, parameter handling, catalog composition and rendering without a
//! PostgreSQL server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::KernelConfig;
use crate::error::KernelError;
use crate::models::{ConnectionParameters, ExecutionStatus, ResultSet};
use crate::services::{Connector, DatabaseConnection, SecretPrompt};
use crate::session::{KernelSession, NOT_CONNECTED_MESSAGE};

// =========================================================================
// Test doubles
// =========================================================================

#[derive(Default)]
struct Recorder {
    connects: Vec<ConnectionParameters>,
    simple: Vec<String>,
    queries: Vec<(String, Vec<String>)>,
    closed: usize,
    prompts: usize,
}

type Shared = Arc<Mutex<Recorder>>;
type Responder = Arc<dyn Fn(&str) -> ResultSet + Send + Sync>;

struct FakeConnector {
    recorder: Shared,
    responder: Responder,
    refuse_connect: bool,
    fail_marker: Option<&'static str>,
    connect_delay: Option<Duration>,
}

struct FakeConnection {
    recorder: Shared,
    responder: Responder,
    fail_marker: Option<&'static str>,
}

impl FakeConnection {
    fn check(&self, sql: &str) -> Result<(), KernelError> {
        match self.fail_marker {
            Some(marker) if sql.contains(marker) => Err(KernelError::Database {
                message: format!("syntax error at or near \"{marker}\""),
                detail: None,
                hint: None,
                position: Some(1),
                code: Some("42601".to_string()),
                source: None,
            }),
            _ => Ok(()),
        }
    }
}

impl Connector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(&self, params: &ConnectionParameters) -> Result<FakeConnection, KernelError> {
        self.recorder.lock().unwrap().connects.push(params.clone());
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if self.refuse_connect {
            return Err(KernelError::database("Connection refused"));
        }
        Ok(FakeConnection {
            recorder: self.recorder.clone(),
            responder: self.responder.clone(),
            fail_marker: self.fail_marker,
        })
    }
}

impl DatabaseConnection for FakeConnection {
    async fn simple_query(&mut self, sql: &str) -> Result<Vec<ResultSet>, KernelError> {
        self.recorder.lock().unwrap().simple.push(sql.to_string());
        self.check(sql)?;
        Ok(vec![(self.responder)(sql)])
    }

    async fn query(&mut self, sql: &str, params: &[&str]) -> Result<ResultSet, KernelError> {
        self.recorder
            .lock()
            .unwrap()
            .queries
            .push((sql.to_string(), params.iter().map(|p| p.to_string()).collect()));
        self.check(sql)?;
        Ok((self.responder)(sql))
    }

    fn close(self) {
        self.recorder.lock().unwrap().closed += 1;
    }
}

struct FakePrompt {
    recorder: Shared,
    answer: &'static str,
}

impl SecretPrompt for FakePrompt {
    fn prompt_secret(&mut self, _message: &str) -> Result<String, KernelError> {
        self.recorder.lock().unwrap().prompts += 1;
        Ok(self.answer.to_string())
    }
}

fn rows(columns: &[&str], values: &[&[Option<&str>]]) -> ResultSet {
    ResultSet::new(
        columns.iter().map(|c| c.to_string()).collect(),
        values.iter().map(|r| r.iter().map(|v| v.map(String::from)).collect()).collect(),
    )
}

fn one_row_responder() -> Responder {
    Arc::new(|_sql: &str| rows(&["n"], &[&[Some("1")]]))
}

type TestSession = KernelSession<FakeConnector, FakePrompt>;

fn session_with(responder: Responder) -> (TestSession, Shared) {
    let recorder = Shared::default();
    let connector = FakeConnector {
        recorder: recorder.clone(),
        responder,
        refuse_connect: false,
        fail_marker: None,
        connect_delay: None,
    };
    let prompt = FakePrompt { recorder: recorder.clone(), answer: "prompted-secret" };
    (KernelSession::with_parts(KernelConfig::default(), connector, prompt), recorder)
}

fn session() -> (TestSession, Shared) {
    session_with(one_row_responder())
}

// =========================================================================
// Raw statements
// =========================================================================

/// Non-command cells reach the connection byte for byte.
#[tokio::test]
async fn test_raw_sql_passes_through_unchanged() {
    let (mut session, recorder) = session();

    for sql in ["SELECT 1 AS n", "  \\dt looks like a command but is not", "select 'a\\b'"] {
        let reply = session.execute(sql).await;
        assert!(reply.is_ok(), "{sql}: {reply:?}");
    }

    let recorder = recorder.lock().unwrap();
    assert_eq!(
        recorder.simple,
        vec![
            "SELECT 1 AS n".to_string(),
            "  \\dt looks like a command but is not".to_string(),
            "select 'a\\b'".to_string(),
        ]
    );
    assert!(recorder.queries.is_empty());
}

#[tokio::test]
async fn test_raw_sql_renders_table_and_summary() {
    let (mut session, _recorder) = session();

    let reply = session.execute("SELECT 1 AS n").await;

    assert_eq!(reply.status, ExecutionStatus::Ok);
    assert_eq!(reply.html_outputs(), vec!["<table><tr><th>n</th></tr><tr><td>1</td></tr></table>"]);
    let summary = reply.stdout_text();
    assert!(summary.starts_with("1 rows (took "), "{summary}");
}

#[tokio::test]
async fn test_statement_without_rows_reports_ok() {
    let (mut session, _recorder) =
        session_with(Arc::new(|_sql: &str| ResultSet { rows_affected: Some(0), ..ResultSet::default() }));

    let reply = session.execute("BEGIN").await;

    assert!(reply.html_outputs().is_empty());
    assert!(reply.stdout_text().starts_with("ok (took "));

    let reply = session.execute("UPDATE accounts SET balance = 0 WHERE false").await;
    assert!(reply.html_outputs().is_empty());
    assert!(reply.stdout_text().starts_with("ok (took "));
}

/// A raw query with no prior connect uses the defaults and never prompts.
#[tokio::test]
async fn test_first_query_connects_with_defaults() {
    let (mut session, recorder) = session();

    assert!(session.execute("SELECT 1").await.is_ok());

    let recorder = recorder.lock().unwrap();
    assert_eq!(recorder.prompts, 0);
    assert_eq!(recorder.connects.len(), 1);
    let params = &recorder.connects[0];
    assert_eq!(params.host, "localhost");
    assert_eq!(params.port, 5432);
    assert_eq!(params.user, "postgres");
    assert_eq!(params.password, None);
}

#[tokio::test]
async fn test_database_error_reported_not_raised() {
    let recorder = Shared::default();
    let connector = FakeConnector {
        recorder: recorder.clone(),
        responder: one_row_responder(),
        refuse_connect: false,
        fail_marker: Some("SELEC "),
        connect_delay: None,
    };
    let prompt = FakePrompt { recorder: recorder.clone(), answer: "" };
    let mut session = KernelSession::with_parts(KernelConfig::default(), connector, prompt);

    let reply = session.execute("SELEC 1").await;

    assert_eq!(reply.status, ExecutionStatus::Error);
    let report = reply.error.expect("error report");
    assert_eq!(report.ename, "DatabaseError");
    assert!(report.evalue.contains("syntax error"));
    assert!(report.traceback.contains(&"Code: 42601".to_string()));

    // The session stays usable after a failed statement.
    assert!(session.is_connected());
}

// =========================================================================
// Connection management
// =========================================================================

#[tokio::test]
async fn test_connect_nopassword_then_query_never_prompts() {
    let (mut session, recorder) = session();

    let reply = session.execute("\\connect nopassword").await;
    assert!(reply.is_ok());
    assert_eq!(reply.stdout_text(), "ok");

    assert!(session.execute("SELECT 1").await.is_ok());

    let recorder = recorder.lock().unwrap();
    assert_eq!(recorder.prompts, 0);
    assert_eq!(recorder.connects.len(), 1);
    assert_eq!(recorder.connects[0].host, "localhost");
    assert_eq!(recorder.connects[0].port, 5432);
    assert_eq!(recorder.connects[0].user, "postgres");
}

#[tokio::test]
async fn test_conflicting_credentials_fail_before_connecting() {
    let (mut session, recorder) = session();

    let reply = session.execute("\\c password=x nopassword").await;

    assert_eq!(reply.status, ExecutionStatus::Error);
    assert_eq!(reply.error.unwrap().ename, "ConflictingCredentials");
    let recorder = recorder.lock().unwrap();
    assert!(recorder.connects.is_empty());
    assert_eq!(recorder.prompts, 0);
}

#[tokio::test]
async fn test_unsupported_flag() {
    let (mut session, recorder) = session();

    let reply = session.execute("\\c sslmode").await;

    let report = reply.error.unwrap();
    assert_eq!(report.ename, "UnsupportedFlag");
    assert!(report.evalue.contains("sslmode"));
    assert!(recorder.lock().unwrap().connects.is_empty());
}

#[tokio::test]
async fn test_missing_password_is_prompted() {
    let (mut session, recorder) = session();

    assert!(session.execute("\\c user=alice dbname=app").await.is_ok());

    let recorder = recorder.lock().unwrap();
    assert_eq!(recorder.prompts, 1);
    let params = &recorder.connects[0];
    assert_eq!(params.user, "alice");
    assert_eq!(params.dbname.as_deref(), Some("app"));
    assert_eq!(params.password.as_deref(), Some("prompted-secret"));
}

#[tokio::test]
async fn test_reconnect_closes_previous_connection() {
    let (mut session, recorder) = session();

    assert!(session.execute("\\c nopassword").await.is_ok());
    assert!(session.execute("\\c host=replica nopassword").await.is_ok());

    {
        let recorder = recorder.lock().unwrap();
        assert_eq!(recorder.connects.len(), 2);
        assert_eq!(recorder.closed, 1);
    }
    assert_eq!(session.connection_info().unwrap().params.host, "replica");

    drop(session);
    assert_eq!(recorder.lock().unwrap().closed, 2);
}

#[tokio::test]
async fn test_failed_connect_leaves_session_disconnected() {
    let recorder = Shared::default();
    let connector = FakeConnector {
        recorder: recorder.clone(),
        responder: one_row_responder(),
        refuse_connect: true,
        fail_marker: None,
        connect_delay: None,
    };
    let prompt = FakePrompt { recorder: recorder.clone(), answer: "" };
    let mut session = KernelSession::with_parts(KernelConfig::default(), connector, prompt);

    let reply = session.execute("\\c nopassword").await;

    assert_eq!(reply.error.unwrap().ename, "DatabaseError");
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_conninfo() {
    let (mut session, _recorder) = session();

    let reply = session.execute("\\conninfo").await;
    assert_eq!(reply.stdout_text(), NOT_CONNECTED_MESSAGE);

    assert!(session.execute("\\c host=db password=hunter2").await.is_ok());
    let reply = session.execute("\\conninfo").await;
    assert_eq!(reply.stdout_text(), "host=db, port=5432, user=postgres, password=********");
}

// =========================================================================
// Dispatch errors
// =========================================================================

#[tokio::test]
async fn test_unknown_command_reports_name() {
    let (mut session, recorder) = session();

    let reply = session.execute("\\foo").await;

    assert_eq!(reply.status, ExecutionStatus::Error);
    let report = reply.error.unwrap();
    assert_eq!(report.ename, "UnknownCommand");
    assert!(report.evalue.contains("'foo'"));
    assert!(recorder.lock().unwrap().connects.is_empty());
}

#[tokio::test]
async fn test_listing_with_two_arguments_fails() {
    let (mut session, recorder) = session();

    let reply = session.execute("\\dt a b").await;

    assert_eq!(reply.error.unwrap().ename, "TooManyArguments");
    assert!(recorder.lock().unwrap().queries.is_empty());
}

#[tokio::test]
async fn test_execution_count_increments_on_errors_too() {
    let (mut session, _recorder) = session();

    assert_eq!(session.execute("\\foo").await.execution_count, 1);
    assert_eq!(session.execute("SELECT 1").await.execution_count, 2);
    assert_eq!(session.execution_count(), 2);
}

// =========================================================================
// Listings
// =========================================================================

/// Auto-connect time is not part of a listing's reported duration.
#[tokio::test]
async fn test_listing_duration_excludes_auto_connect() {
    for cell in ["\\dt", "\\dn"] {
        let recorder = Shared::default();
        let connector = FakeConnector {
            recorder: recorder.clone(),
            responder: one_row_responder(),
            refuse_connect: false,
            fail_marker: None,
            connect_delay: Some(Duration::from_millis(1100)),
        };
        let prompt = FakePrompt { recorder: recorder.clone(), answer: "" };
        let mut session = KernelSession::with_parts(KernelConfig::default(), connector, prompt);

        let reply = session.execute(cell).await;

        assert!(reply.is_ok());
        assert_eq!(recorder.lock().unwrap().connects.len(), 1);
        let summary = reply.stdout_text();
        assert!(summary.starts_with("1 rows (took "), "{cell}: {summary}");
        assert!(summary.ends_with("ms)"), "{cell}: {summary}");
    }
}

#[tokio::test]
async fn test_dt_lists_visible_user_tables() {
    let (mut session, recorder) = session_with(Arc::new(|_sql: &str| {
        rows(
            &["Schema", "Name", "Type", "Owner"],
            &[&[Some("public"), Some("accounts"), Some("table"), Some("postgres")]],
        )
    }));

    let reply = session.execute("\\dt").await;
    assert!(reply.is_ok());
    assert!(reply.html_outputs()[0].contains("<td>accounts</td><td>table</td>"));
    assert!(reply.stdout_text().starts_with("1 rows (took "));

    let recorder = recorder.lock().unwrap();
    let (sql, params) = &recorder.queries[0];
    assert!(sql.contains("c.relkind IN ('r')"));
    assert!(sql.contains("n.nspname <> 'pg_catalog'"));
    assert!(sql.contains("n.nspname <> 'information_schema'"));
    assert!(sql.contains("n.nspname !~ '^pg_toast'"));
    assert!(params.is_empty());
}

#[tokio::test]
async fn test_dt_with_schema_binds_full_match_pattern() {
    let (mut session, recorder) = session();

    assert!(session.execute("\\dt myschema").await.is_ok());

    let recorder = recorder.lock().unwrap();
    let (sql, params) = &recorder.queries[0];
    assert!(!sql.contains("'pg_catalog'"));
    assert_eq!(params, &vec!["^(myschema)$".to_string()]);
}

#[tokio::test]
async fn test_detail_suffix_adds_size_and_description() {
    let (mut session, recorder) = session();

    assert!(session.execute("\\dv").await.is_ok());
    assert!(session.execute("\\dv+").await.is_ok());

    let recorder = recorder.lock().unwrap();
    let plain = &recorder.queries[0].0;
    let detailed = &recorder.queries[1].0;
    assert!(plain.contains("c.relkind IN ('v')"));
    assert!(!plain.contains("\"Size\"") && !plain.contains("\"Description\""));
    assert!(detailed.contains("\"Size\"") && detailed.contains("\"Description\""));
}

#[tokio::test]
async fn test_dn_lists_schemas() {
    let (mut session, recorder) = session();

    assert!(session.execute("\\dn+").await.is_ok());

    let recorder = recorder.lock().unwrap();
    let sql = &recorder.queries[0].0;
    assert!(sql.contains("pg_catalog.pg_namespace"));
    assert!(sql.contains("\"Access privileges\""));
}

// =========================================================================
// Table detail report
// =========================================================================

fn table_responder() -> Responder {
    Arc::new(|sql: &str| {
        if sql.contains("pg_catalog.pg_attribute") {
            rows(
                &["Column", "Type", "not_null", "default_value"],
                &[
                    &[Some("id"), Some("integer"), Some("true"), None],
                    &[Some("balance"), Some("numeric(12,2)"), Some("false"), Some("0")],
                ],
            )
        } else if sql.contains("r.contype = 'c'") {
            rows(&["name", "definition"], &[&[Some("balance_positive"), Some("CHECK (balance >= 0)")]])
        } else {
            rows(&["name", "definition"], &[])
        }
    })
}

#[tokio::test]
async fn test_describe_table_with_one_check_constraint() {
    let (mut session, recorder) = session_with(table_responder());

    let reply = session.execute("\\d mytable").await;
    assert!(reply.is_ok(), "{reply:?}");

    let html = reply.html_outputs()[0];
    assert!(html.starts_with("<h3>Table \"mytable\"</h3>"));
    assert_eq!(html.matches("<tr><td>").count(), 2);
    assert!(html.contains("<td>id</td><td>integer</td><td>not null</td>"));
    assert!(html.contains("<td>balance</td><td>numeric(12,2)</td><td>default 0</td>"));
    assert!(html.contains("<h4>Check constraints:</h4>"));
    assert!(html.contains("&quot;balance_positive&quot; CHECK (balance &gt;= 0)"));
    assert!(!html.contains("Indexes:"));
    assert!(!html.contains("Triggers:"));
    assert!(!html.contains("Inherits:"));

    let recorder = recorder.lock().unwrap();
    assert_eq!(recorder.queries.len(), 5);
    assert!(recorder.queries.iter().all(|(_, params)| params == &vec!["mytable".to_string()]));
}

#[tokio::test]
async fn test_describe_missing_table_renders_empty_report() {
    let (mut session, _recorder) = session_with(Arc::new(|_sql: &str| ResultSet::default()));

    let reply = session.execute("\\d no_such_table").await;

    assert!(reply.is_ok());
    let html = reply.html_outputs()[0];
    assert!(html.starts_with("<h3>Table \"no_such_table\"</h3>"));
    assert_eq!(html.matches("<tr><td>").count(), 0);
    assert!(!html.contains("<h4>"));
}

#[tokio::test]
async fn test_describe_table_all_sections_in_order() {
    let (mut session, _recorder) = session_with(Arc::new(|sql: &str| {
        if sql.contains("pg_catalog.pg_attribute") {
            rows(
                &["Column", "Type", "not_null", "default_value"],
                &[&[Some("id"), Some("integer"), Some("true"), None]],
            )
        } else if sql.contains("pg_catalog.pg_inherits") {
            rows(&["parent"], &[&[Some("base")], &[Some("audit.mixin")]])
        } else if sql.contains("pg_catalog.pg_trigger") {
            rows(
                &["name", "definition"],
                &[&[
                    Some("audit_ins"),
                    Some("CREATE TRIGGER audit_ins AFTER INSERT ON t FOR EACH ROW EXECUTE FUNCTION audit()"),
                ]],
            )
        } else if sql.contains("r.contype = 'c'") {
            rows(&["name", "definition"], &[&[Some("id_positive"), Some("CHECK (id > 0)")]])
        } else {
            rows(&["name", "definition"], &[&[Some("t_pkey"), Some("PRIMARY KEY (id)")]])
        }
    }));

    let reply = session.execute("\\d t").await;
    let html = reply.html_outputs()[0];

    let positions: Vec<usize> =
        ["Indexes:", "Check constraints:", "Triggers:", "Inherits:"]
            .iter()
            .map(|title| html.find(title).unwrap_or_else(|| panic!("missing {title}")))
            .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(html.contains("<li>&quot;t_pkey&quot; PRIMARY KEY (id)</li>"));
    assert!(html.contains("<li>audit_ins AFTER INSERT ON t FOR EACH ROW EXECUTE FUNCTION audit()</li>"));
    assert!(html.contains("<li>base, audit.mixin</li>"));
}
