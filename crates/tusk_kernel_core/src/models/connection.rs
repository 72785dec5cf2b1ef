//! Connection parameter models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::KernelConfig;
use crate::error::KernelError;

/// Flag that disables the interactive password prompt.
pub const NO_PASSWORD_FLAG: &str = "nopassword";

/// Shown in place of the password wherever parameters are displayed.
const PASSWORD_MASK: &str = "********";

/// Parameters for a single connect attempt.
///
/// Built fresh from the `\connect` arguments on every call. The password is
/// never logged or serialized in clear text.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionParameters {
    /// Server hostname or IP
    pub host: String,
    /// Server port
    pub port: u16,
    /// Login username
    pub user: String,
    /// Password, if supplied or prompted for
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Whether the `nopassword` flag was given
    pub no_password: bool,
    /// Database name (server default when absent)
    pub dbname: Option<String>,
    /// Application name sent to PostgreSQL
    pub application_name: String,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u32,
    /// Server options (`-c key=value ...`)
    pub options: Option<String>,
    /// The `key=value` pairs as supplied, in order, password value masked
    pub supplied: Vec<(String, String)>,
}

impl ConnectionParameters {
    /// Parameters with every value taken from the configuration defaults.
    pub fn from_config(config: &KernelConfig) -> Self {
        Self {
            host: config.default_host.clone(),
            port: config.default_port,
            user: config.default_user.clone(),
            password: None,
            no_password: false,
            dbname: None,
            application_name: config.application_name.clone(),
            connect_timeout_secs: config.connect_timeout_secs,
            options: None,
            supplied: Vec::new(),
        }
    }

    /// Parse `\connect` arguments on top of the configuration defaults.
    ///
    /// Tokens containing `=` are parameters (split on the first `=`); bare
    /// tokens are flags. Credential and flag errors are reported before any
    /// parameter value is interpreted, so nothing touches the network or the
    /// prompt when they fail.
    pub fn parse(args: &[String], config: &KernelConfig) -> Result<Self, KernelError> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut flags: Vec<&str> = Vec::new();

        for arg in args {
            match arg.split_once('=') {
                Some((key, value)) => pairs.push((key.to_string(), value.to_string())),
                None => flags.push(arg.as_str()),
            }
        }

        let mut no_password = false;
        for flag in flags {
            if flag != NO_PASSWORD_FLAG {
                return Err(KernelError::unsupported_flag(flag));
            }
            if pairs.iter().any(|(key, _)| key == "password") {
                return Err(KernelError::ConflictingCredentials);
            }
            no_password = true;
        }

        let mut params = Self::from_config(config);
        params.no_password = no_password;

        for (key, value) in &pairs {
            match key.as_str() {
                "host" => params.host = value.clone(),
                "port" => {
                    params.port = value.parse().map_err(|_| {
                        KernelError::invalid_parameter(key, format!("'{value}' is not a valid port"))
                    })?
                }
                "user" => params.user = value.clone(),
                "password" => params.password = Some(value.clone()),
                "dbname" | "database" => params.dbname = Some(value.clone()),
                "application_name" => params.application_name = value.clone(),
                "connect_timeout" => {
                    params.connect_timeout_secs = value.parse().map_err(|_| {
                        KernelError::invalid_parameter(
                            key,
                            format!("'{value}' is not a number of seconds"),
                        )
                    })?
                }
                "options" => params.options = Some(value.clone()),
                _ => return Err(KernelError::invalid_parameter(key, "unknown parameter")),
            }
        }

        params.supplied = pairs
            .into_iter()
            .map(|(key, value)| match key.as_str() {
                "password" => (key, PASSWORD_MASK.to_string()),
                _ => (key, value),
            })
            .collect();
        Ok(params)
    }

    /// Whether the password prompt must run before connecting.
    pub fn needs_password(&self) -> bool {
        self.password.is_none() && !self.no_password
    }

    /// Render the effective host, port and user followed by any other
    /// supplied `key=value` pairs, with the password masked.
    pub fn describe(&self) -> String {
        let mut parts =
            vec![format!("host={}", self.host), format!("port={}", self.port), format!("user={}", self.user)];
        for (key, value) in &self.supplied {
            match key.as_str() {
                "host" | "port" | "user" => {}
                "password" => parts.push(format!("password={PASSWORD_MASK}")),
                _ => parts.push(format!("{key}={value}")),
            }
        }
        parts.join(", ")
    }
}

impl std::fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| PASSWORD_MASK))
            .field("no_password", &self.no_password)
            .field("dbname", &self.dbname)
            .field("application_name", &self.application_name)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// What `\conninfo` reports about the live connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Parameters the connection was opened with
    pub params: ConnectionParameters,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
}
