//! Kernel configuration.
//!
//! Holds the defaults a `\connect` starts from. Nothing here is read from the
//! process environment; every value can be overridden per connect with a
//! `key=value` argument.

use serde::{Deserialize, Serialize};

/// Default server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5432;

/// Default login role.
pub const DEFAULT_USER: &str = "postgres";

/// Kernel-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Host used when `host=` is not given
    pub default_host: String,
    /// Port used when `port=` is not given
    pub default_port: u16,
    /// Role used when `user=` is not given
    pub default_user: String,
    /// Application name sent to PostgreSQL
    pub application_name: String,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            default_host: DEFAULT_HOST.to_string(),
            default_port: DEFAULT_PORT,
            default_user: DEFAULT_USER.to_string(),
            application_name: "tusk-kernel".to_string(),
            connect_timeout_secs: 10,
        }
    }
}
