//! Logging setup and the per-invocation run log.

use crate::errors::{FlowError, Result};
use chrono::Utc;
use serde_json::json;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Initialise terminal logging; `verbose` lowers the level to debug.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)
        .map_err(|e| FlowError::Generic(format!("Failed to initialize logger: {e}")))
}

/// Append one JSON line describing this invocation to `path`.
pub fn write_run_log(path: &Path, command: &str, argv: &[String]) -> Result<()> {
    let record = json!({
        "timestamp": Utc::now().to_rfc3339(),
        "command": command,
        "args": argv,
    });

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", serde_json::to_string(&record)?)?;

    log::debug!("Run logged to {}", path.display());
    Ok(())
}
