//! Tracing subscriber setup.
//!
//! Human-readable (or JSON) output goes to stderr so stdout stays free for
//! command output. An optional log file rolls daily.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Install the global subscriber. Keep the returned guard alive until exit,
/// or buffered file output is lost.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log level: {}", config.level))?,
    };

    let stderr = if config.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let (dir, name) = split_log_path(path)?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory: {:?}", dir))?;
            let appender = tracing_appender::rolling::daily(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(path) = &config.file {
        tracing::debug!("Logging to {:?} (rotated daily)", path);
    }
    Ok(guard)
}

/// `logs/support-mesh.log` → (`logs`, `support-mesh.log`); a bare file name
/// logs to the current directory.
fn split_log_path(path: &Path) -> Result<(PathBuf, OsString)> {
    let name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {:?}", path))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name.to_os_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/mesh/support-mesh.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log/mesh"));
        assert_eq!(name, OsString::from("support-mesh.log"));

        let (dir, name) = split_log_path(Path::new("mesh.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, OsString::from("mesh.log"));
    }

    #[test]
    fn test_path_without_file_name_is_rejected() {
        assert!(split_log_path(Path::new("/")).is_err());
    }
}
