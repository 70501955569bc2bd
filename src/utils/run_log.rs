use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::db::LogEntry;
use crate::error::{ProvisionError, Result};

const RUN_HEADER: &str = "Starting setup from SQL file...";

/// Append-only log of one provisioning run.
///
/// Every entry goes to the console through `tracing` and is appended as one
/// line to the log file. Writing never fails the run.
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// Truncate (or create) the log file and write the run header.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ProvisionError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let header = format!(
            "{RUN_HEADER}\nRun started at {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        fs::write(path, header).map_err(|source| ProvisionError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(&LogEntry::ok(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(&LogEntry::error(message));
    }

    pub fn record(&mut self, entry: &LogEntry) {
        if entry.success {
            tracing::info!("{}", entry.message);
        } else {
            tracing::error!("{}", entry.message);
        }

        if let Err(err) = self.append_line(&entry.message) {
            tracing::warn!("Failed to append to {}: {err}", self.path.display());
        }
    }

    fn append_line(&self, message: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        writeln!(file, "{message}")
    }
}
