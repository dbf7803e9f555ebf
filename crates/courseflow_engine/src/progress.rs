/// Pipeline side-channel events: upload progress and dedup decisions are
/// reported as they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishEvent {
    UploadStarted {
        key: String,
        bytes: u64,
    },
    UploadProgress {
        key: String,
        sent: u64,
        total: u64,
    },
    /// The expected key already holds this exact content.
    BlobUnchanged {
        key: String,
        hash: String,
    },
    /// Identical bytes already live in the course namespace under a
    /// different key; that key was reused instead of uploading.
    BlobReused {
        key: String,
        hash: String,
    },
    /// The expected key exists with different content and will be replaced.
    BlobOverwritten {
        key: String,
        hash: String,
    },
    DocumentPublished {
        path: String,
    },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: PublishEvent);
}

/// Default sink: turns events into log lines.
#[derive(Debug, Default)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: PublishEvent) {
        match event {
            PublishEvent::UploadStarted { key, bytes } => {
                log::info!(
                    "uploading {} ({:.1}M)",
                    key,
                    bytes as f64 / 1024.0 / 1024.0
                );
            }
            PublishEvent::UploadProgress { key, sent, total } => {
                log::debug!("{}: {}/{} bytes", key, sent, total);
            }
            PublishEvent::BlobUnchanged { hash, .. } => {
                log::info!("object with hash '{}' already exists", hash);
            }
            PublishEvent::BlobReused { key, hash } => {
                log::info!(
                    "object with hash '{}' already exists under another name ({})",
                    hash,
                    key
                );
            }
            PublishEvent::BlobOverwritten { key, hash } => {
                log::info!("{} changed (hash '{}'), will be overwritten", key, hash);
            }
            PublishEvent::DocumentPublished { path } => {
                log::info!("{} published", path);
            }
        }
    }
}
