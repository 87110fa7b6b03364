#![forbid(unsafe_code)]

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    /// Append to a file; used while the TUI owns the terminal.
    File(PathBuf),
}

/// Installs the global subscriber. `RUST_LOG` wins over `default_level`.
/// Later calls are no-ops.
pub fn init(default_level: &str, target: &LogTarget) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    match target {
        LogTarget::Stderr => {
            builder.with_writer(std::io::stderr).try_init().ok();
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .ok();
        }
    }

    tracing::debug!(destination = ?target, "logging initialised");
    Ok(())
}
