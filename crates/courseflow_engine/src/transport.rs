use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::progress::{ProgressSink, PublishEvent};

/// One stored object: its key path and content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    pub key: String,
    pub hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} returned status {status}")]
    Status { operation: &'static str, status: u16 },
    #[error("malformed {operation} response: {message}")]
    MalformedResponse {
        operation: &'static str,
        message: String,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Key-addressable blob store, as consumed by the asset pipeline.
///
/// `put` streams the file and reports transfer progress through the sink.
/// Uploads are authorized by a short-lived token issued per key.
pub trait BlobTransport {
    fn stat(&self, key: &str) -> Result<Option<String>, TransportError>;
    fn upload_token(&self, key: &str) -> Result<String, TransportError>;
    fn put(
        &self,
        token: &str,
        key: &str,
        local_path: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<String, TransportError>;
    fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, TransportError>;
    fn delete(&self, key: &str) -> Result<(), TransportError>;
}

#[derive(Deserialize)]
struct StatResponse {
    hash: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct PutResponse {
    key: String,
}

#[derive(Deserialize)]
struct ListResponse {
    items: Vec<ListItem>,
}

#[derive(Deserialize)]
struct ListItem {
    key: String,
    hash: String,
}

/// Blocking HTTP implementation of [`BlobTransport`] against a bucket-style
/// REST API. Object keys are addressed as single (percent-encoded) path
/// segments under the configured bucket.
pub struct ReqwestBlobTransport {
    client: reqwest::blocking::Client,
    api_base: Url,
    upload_base: Url,
    bucket: String,
    access_key: String,
    secret_key: String,
}

impl ReqwestBlobTransport {
    pub fn new(
        api_base: Url,
        upload_base: Url,
        bucket: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            // Large video uploads may legitimately take a long time.
            .timeout(None::<Duration>)
            .build()?;
        Ok(Self {
            client,
            api_base,
            upload_base,
            bucket: bucket.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        })
    }

    fn object_url(&self, key: &str, operation: &'static str) -> Result<Url, TransportError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::MalformedResponse {
                operation,
                message: "api base URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(["buckets", &self.bucket, "objects", key]);
        Ok(url)
    }

    fn collection_url(&self, collection: &'static str) -> Result<Url, TransportError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::MalformedResponse {
                operation: collection,
                message: "api base URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(["buckets", &self.bucket, collection]);
        Ok(url)
    }

    fn credentials(&self) -> String {
        format!("Bearer {}:{}", self.access_key, self.secret_key)
    }
}

impl BlobTransport for ReqwestBlobTransport {
    fn stat(&self, key: &str) -> Result<Option<String>, TransportError> {
        let url = self.object_url(key, "stat")?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, self.credentials())
            .send()?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(TransportError::Status {
                operation: "stat",
                status: response.status().as_u16(),
            });
        }
        let stat: StatResponse =
            response
                .json()
                .map_err(|err| TransportError::MalformedResponse {
                    operation: "stat",
                    message: err.to_string(),
                })?;
        Ok(Some(stat.hash))
    }

    fn upload_token(&self, key: &str) -> Result<String, TransportError> {
        let url = self.collection_url("upload-tokens")?;
        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, self.credentials())
            .json(&serde_json::json!({ "key": key, "ttl_secs": 3600 }))
            .send()?;
        if !response.status().is_success() {
            return Err(TransportError::Status {
                operation: "upload_token",
                status: response.status().as_u16(),
            });
        }
        let token: TokenResponse =
            response
                .json()
                .map_err(|err| TransportError::MalformedResponse {
                    operation: "upload_token",
                    message: err.to_string(),
                })?;
        Ok(token.token)
    }

    fn put(
        &self,
        token: &str,
        key: &str,
        local_path: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<String, TransportError> {
        let file = File::open(local_path)?;
        let total = file.metadata()?.len();
        progress.emit(PublishEvent::UploadStarted {
            key: key.to_string(),
            bytes: total,
        });

        let reader = ProgressReader {
            inner: file,
            key: key.to_string(),
            sent: 0,
            total,
            sink: progress,
        };
        let file_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "blob".to_string());
        let form = Form::new()
            .text("token", token.to_string())
            .text("key", key.to_string())
            .part("file", Part::reader_with_length(reader, total).file_name(file_name));

        let response = self
            .client
            .post(self.upload_base.clone())
            .multipart(form)
            .send()?;
        if !response.status().is_success() {
            return Err(TransportError::Status {
                operation: "put",
                status: response.status().as_u16(),
            });
        }
        let put: PutResponse = response
            .json()
            .map_err(|err| TransportError::MalformedResponse {
                operation: "put",
                message: err.to_string(),
            })?;
        Ok(put.key)
    }

    fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, TransportError> {
        let mut url = self.collection_url("objects")?;
        url.query_pairs_mut().append_pair("prefix", prefix);
        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, self.credentials())
            .send()?;
        if !response.status().is_success() {
            return Err(TransportError::Status {
                operation: "list",
                status: response.status().as_u16(),
            });
        }
        let listing: ListResponse =
            response
                .json()
                .map_err(|err| TransportError::MalformedResponse {
                    operation: "list",
                    message: err.to_string(),
                })?;
        Ok(listing
            .items
            .into_iter()
            .map(|item| BlobEntry {
                key: item.key,
                hash: item.hash,
            })
            .collect())
    }

    fn delete(&self, key: &str) -> Result<(), TransportError> {
        let url = self.object_url(key, "delete")?;
        let response = self
            .client
            .delete(url)
            .header(reqwest::header::AUTHORIZATION, self.credentials())
            .send()?;
        // A missing object is already deleted as far as the caller cares.
        if response.status() == reqwest::StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }
        Err(TransportError::Status {
            operation: "delete",
            status: response.status().as_u16(),
        })
    }
}

/// Wraps the upload body and reports every read through the progress sink.
struct ProgressReader {
    inner: File,
    key: String,
    sent: u64,
    total: u64,
    sink: Arc<dyn ProgressSink>,
}

impl Read for ProgressReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        if read > 0 {
            self.sent += read as u64;
            self.sink.emit(PublishEvent::UploadProgress {
                key: self.key.clone(),
                sent: self.sent,
                total: self.total,
            });
        }
        Ok(read)
    }
}
