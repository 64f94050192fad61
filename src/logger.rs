//! Tracing setup for askbot.
//!
//! [`init`] runs once in `main`, after the config (and `ASKBOT_LOG_LEVEL`)
//! has been resolved.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::AppError;

/// Install the global subscriber.
///
/// `level` is an `EnvFilter` directive: a bare level such as `"debug"` or a
/// per-target list such as `"askbot=debug,reqwest=warn"`. A directive that
/// does not parse defers to `RUST_LOG`.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(level)?)
        .with_writer(writer(log_file)?)
        .try_init()
        .map_err(|e| AppError::Logger(format!("subscriber already installed: {e}")))
}

fn filter(level: &str) -> Result<EnvFilter, AppError> {
    EnvFilter::try_new(level).or_else(|bad_level| {
        EnvFilter::try_from_default_env().map_err(|bad_env| {
            AppError::Logger(format!(
                "log_level '{level}' rejected ({bad_level}) and RUST_LOG unusable ({bad_env})"
            ))
        })
    })
}

/// Stderr, or the configured file opened for append with its directory
/// created on demand.
fn writer(log_file: Option<&Path>) -> Result<BoxMakeWriter, AppError> {
    let Some(path) = log_file else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::Logger(format!("cannot create {}: {e}", dir.display())))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::Logger(format!("cannot open {}: {e}", path.display())))?;
    Ok(BoxMakeWriter::new(Mutex::new(file)))
}
