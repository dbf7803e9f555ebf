use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("io error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("http client init failed: {0}")]
    Client(#[from] reqwest::Error),
    #[error("document upload failed for {path}: {source}")]
    Upload {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("document store rejected {path} with status {status}")]
    Rejected { path: String, status: u16 },
}

/// Path-addressable document store, as consumed by the tree builder.
/// Callers must not assume a given write had an observable effect; the
/// remote sink degrades to a no-op without credentials.
pub trait DocumentSink {
    fn write(&self, path: &str, bytes: &[u8], overwrite: bool) -> Result<(), SinkError>;
}

/// Writes documents under a local output root. Used when operating without
/// remote connectivity.
pub struct LocalDocumentSink {
    root: PathBuf,
}

impl LocalDocumentSink {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl DocumentSink for LocalDocumentSink {
    /// Atomic write: temp file in the target directory, then rename.
    fn write(&self, path: &str, bytes: &[u8], overwrite: bool) -> Result<(), SinkError> {
        let target = self.root.join(path.trim_start_matches('/'));
        if !overwrite && target.exists() {
            return Ok(());
        }
        let io_err = |source: io::Error| SinkError::Io {
            path: path.to_string(),
            source,
        };

        let parent = target.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(bytes).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.as_file_mut().sync_all().map_err(io_err)?;

        // Replace an existing file to keep reruns deterministic.
        if target.exists() {
            fs::remove_file(&target).map_err(io_err)?;
        }
        tmp.persist(&target).map_err(|err| SinkError::Io {
            path: path.to_string(),
            source: err.error,
        })?;
        Ok(())
    }
}

/// Pushes documents to the remote document store over HTTP. An absent
/// access token makes every write a silent no-op, not an error: partial
/// credential setups are expected during archival.
pub struct HttpDocumentSink {
    client: reqwest::blocking::Client,
    endpoint: Url,
    token: Option<String>,
}

impl HttpDocumentSink {
    pub fn new(endpoint: Url, token: Option<String>) -> Result<Self, SinkError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            token,
        })
    }
}

impl DocumentSink for HttpDocumentSink {
    fn write(&self, path: &str, bytes: &[u8], overwrite: bool) -> Result<(), SinkError> {
        let Some(token) = self.token.as_deref() else {
            log::debug!("document sink token absent; skipping {path}");
            return Ok(());
        };

        let args = serde_json::json!({
            "path": format!("/{}", path.trim_start_matches('/')),
            "mode": if overwrite { "overwrite" } else { "add" },
        });
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(token)
            .header("X-Publish-Args", args.to_string())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .map_err(|source| SinkError::Upload {
                path: path.to_string(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(SinkError::Rejected {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
