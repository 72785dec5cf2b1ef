//! Interactive secret prompt.

use std::io;

use crate::error::KernelError;

/// Message shown when asking for the database password.
pub const PASSWORD_PROMPT: &str = "Database password: ";

/// Asks the user for a secret value.
pub trait SecretPrompt: Send {
    /// Show `message` and return what the user entered, without the
    /// trailing newline.
    fn prompt_secret(&mut self, message: &str) -> Result<String, KernelError>;
}

/// Prompt on the controlling terminal with echo turned off.
///
/// Stdout is left alone because the host protocol uses it.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl SecretPrompt for TerminalPrompt {
    fn prompt_secret(&mut self, message: &str) -> Result<String, KernelError> {
        secret_from_input(rpassword::prompt_password(message))
    }
}

/// Map the terminal read. End of input is an error, not an empty password.
fn secret_from_input(input: io::Result<String>) -> Result<String, KernelError> {
    match input {
        Ok(secret) => Ok(secret.trim_end_matches(['\r', '\n']).to_string()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(
            KernelError::prompt_with_source("input closed before a password was entered", e),
        ),
        Err(e) => Err(KernelError::prompt_with_source("could not read password", e)),
    }
}
