// File-backed audit sink
// Author: kelexine (https://github.com/kelexine)

use super::{AuditRecord, AuditSink};
use crate::metrics;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Writes each record to its own file under a directory.
///
/// `record` only pushes onto an unbounded channel; a single background
/// task owns the files. Files are opened with `create_new`, so an existing
/// record is never overwritten.
#[derive(Clone)]
pub struct FileAuditSink {
    sender: mpsc::UnboundedSender<AuditRecord>,
}

impl FileAuditSink {
    /// Start the writer task. It exits once every sink clone is dropped and
    /// the backlog is written; await the handle to drain on shutdown.
    pub fn spawn(directory: impl Into<PathBuf>) -> (Self, JoinHandle<()>) {
        let directory = directory.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<AuditRecord>();

        let handle = tokio::spawn(async move {
            while let Some(record) = receiver.recv().await {
                let direction = record.direction.to_string();
                match write_record(&directory, &record).await {
                    Ok(path) => {
                        metrics::record_audit_write(&direction, true);
                        debug!("Audit record written to {}", path.display());
                    }
                    Err(e) => {
                        metrics::record_audit_write(&direction, false);
                        warn!(
                            "Failed to write {} audit record for exchange {}: {}",
                            direction, record.exchange_id, e
                        );
                    }
                }
            }
            debug!("Audit writer stopped");
        });

        (Self { sender }, handle)
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, record: AuditRecord) {
        if let Err(e) = self.sender.send(record) {
            warn!(
                "Audit writer is gone, dropping {} record for exchange {}",
                e.0.direction, e.0.exchange_id
            );
        }
    }
}

async fn write_record(directory: &Path, record: &AuditRecord) -> io::Result<PathBuf> {
    tokio::fs::create_dir_all(directory).await?;

    let path = directory.join(record.file_name());
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await?;
    file.write_all(record.payload.as_bytes()).await?;
    file.flush().await?;
    Ok(path)
}
