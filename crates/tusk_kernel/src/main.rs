//! Tusk kernel - line-oriented host for the PostgreSQL notebook kernel.
//!
//! Reads one cell per line from stdin and writes one JSON execute reply per
//! line to stdout. Logs go to stderr and the log directory.

use std::io::Write;
use std::process::ExitCode;

use tusk_kernel_core::logging::init_logging_default;
use tusk_kernel_core::{KernelConfig, KernelError, KernelSession};

fn main() -> ExitCode {
    let _logging_guard = init_logging_default();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Tusk kernel");

    match run() {
        Ok(()) => {
            tracing::info!("Input closed, shutting down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Kernel stopped");
            eprintln!("tusk-kernel: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), KernelError> {
    // Cells run strictly one after another; a current-thread runtime is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| KernelError::internal(format!("Failed to create tokio runtime: {e}")))?;

    let mut session = KernelSession::new(KernelConfig::default());
    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }

        let cell = line.trim_end_matches(['\r', '\n']);
        if cell.trim().is_empty() {
            continue;
        }

        let reply = runtime.block_on(session.execute(cell));
        let json = serde_json::to_string(&reply)?;

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}")?;
        stdout.flush()?;
    }

    session.disconnect();
    Ok(())
}
