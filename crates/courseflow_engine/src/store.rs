use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flow_logging::{flow_debug, flow_info};
use image::imageops::FilterType;
use image::GenericImageView;

use crate::hash::ContentHashCache;
use crate::progress::{ProgressSink, PublishEvent};
use crate::transport::{BlobTransport, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport or auth failure during an upload. Fatal: the store never
    /// silently drops an upload.
    #[error("upload failed for {key}: {source}")]
    UploadFailed {
        key: String,
        #[source]
        source: TransportError,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("image downscale failed for {path}: {source}")]
    Downscale {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Content-addressed upload cache in front of a [`BlobTransport`].
///
/// The dedup domain is the content hash, not the key path: a file that
/// already exists anywhere in the owning course's namespace is never
/// uploaded a second time, whatever it is called there.
pub struct AssetStore {
    transport: Box<dyn BlobTransport>,
    progress: Arc<dyn ProgressSink>,
    hashes: ContentHashCache,
    key_prefix: String,
    max_image_width: u32,
}

impl AssetStore {
    pub fn new(
        transport: Box<dyn BlobTransport>,
        progress: Arc<dyn ProgressSink>,
        key_prefix: impl Into<String>,
        max_image_width: u32,
    ) -> Self {
        Self {
            transport,
            progress,
            hashes: ContentHashCache::new(),
            key_prefix: key_prefix.into(),
            max_image_width,
        }
    }

    /// The key a root-relative local path maps to.
    pub fn key_for(&self, relative_path: &str) -> String {
        format!("{}/{}", self.key_prefix, relative_path)
    }

    fn namespace(&self, course_slug: &str) -> String {
        format!("{}/{}", self.key_prefix, course_slug)
    }

    /// Idempotent put: uploads `local_path` under its expected key unless
    /// byte-identical content already exists, and returns the key the
    /// content lives under.
    ///
    /// Wide raster images are downscaled in place first, so the memoized
    /// hash always reflects the bytes that would be uploaded.
    pub fn put(
        &mut self,
        course_slug: &str,
        local_path: &Path,
        relative_path: &str,
    ) -> Result<String, StoreError> {
        self.downscale_if_wide(local_path)?;
        let hash = self
            .hashes
            .fill(local_path)
            .map_err(|source| StoreError::Io {
                path: local_path.to_path_buf(),
                source,
            })?
            .to_string();

        let key = self.key_for(relative_path);

        let existing = self
            .exists_by_hash(course_slug, &key, &hash)
            .map_err(|source| StoreError::UploadFailed {
                key: key.clone(),
                source,
            })?;
        if let Some(existing) = existing {
            return Ok(existing);
        }

        let token = self
            .transport
            .upload_token(&key)
            .map_err(|source| StoreError::UploadFailed {
                key: key.clone(),
                source,
            })?;
        self.transport
            .put(&token, &key, local_path, Arc::clone(&self.progress))
            .map_err(|source| StoreError::UploadFailed { key, source })
    }

    /// The key content with this hash already lives under, if any: the
    /// expected key is checked first, then the whole course namespace is
    /// scanned, because identical bytes may have been uploaded for a file
    /// previously located at a different path.
    pub fn exists_by_hash(
        &self,
        course_slug: &str,
        expected_key: &str,
        hash: &str,
    ) -> Result<Option<String>, TransportError> {
        match self.transport.stat(expected_key)? {
            Some(existing) if existing == hash => {
                self.progress.emit(PublishEvent::BlobUnchanged {
                    key: expected_key.to_string(),
                    hash: hash.to_string(),
                });
                return Ok(Some(expected_key.to_string()));
            }
            Some(_) => {
                self.progress.emit(PublishEvent::BlobOverwritten {
                    key: expected_key.to_string(),
                    hash: hash.to_string(),
                });
            }
            None => {}
        }

        for entry in self.transport.list(&self.namespace(course_slug))? {
            if entry.hash == hash {
                self.progress.emit(PublishEvent::BlobReused {
                    key: entry.key.clone(),
                    hash: hash.to_string(),
                });
                return Ok(Some(entry.key));
            }
        }
        Ok(None)
    }

    /// Delete every object in the course namespace whose hash was already
    /// seen earlier in the listing. Returns the number of deleted objects.
    pub fn purge_duplicates(&self, course_slug: &str) -> Result<usize, TransportError> {
        let namespace = self.namespace(course_slug);
        let mut seen_hashes: Vec<String> = Vec::new();
        let mut deleted = 0;
        for entry in self.transport.list(&namespace)? {
            if seen_hashes.contains(&entry.hash) {
                self.transport.delete(&entry.key)?;
                deleted += 1;
            } else {
                seen_hashes.push(entry.hash);
            }
        }
        flow_info!("{deleted} duplicate objects deleted under {namespace}");
        Ok(deleted)
    }

    /// Delete every object in the course namespace whose key ends with the
    /// given extension (case-insensitive). Returns the number deleted.
    pub fn remove_with_extension(
        &self,
        course_slug: &str,
        extension: &str,
    ) -> Result<usize, TransportError> {
        let namespace = self.namespace(course_slug);
        let suffix = extension.to_ascii_lowercase();
        let mut deleted = 0;
        for entry in self.transport.list(&namespace)? {
            if entry.key.to_ascii_lowercase().ends_with(&suffix) {
                self.transport.delete(&entry.key)?;
                deleted += 1;
            }
        }
        flow_info!("{deleted} {suffix} objects deleted under {namespace}");
        Ok(deleted)
    }

    /// Downscale jpg/png/gif files wider than the configured maximum to
    /// exactly that width with proportional height, overwriting the local
    /// file. Must run before the content hash is first computed.
    fn downscale_if_wide(&self, path: &Path) -> Result<(), StoreError> {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return Ok(());
        };
        if !matches!(
            extension.to_ascii_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "gif"
        ) {
            return Ok(());
        }

        let img = image::open(path).map_err(|source| StoreError::Downscale {
            path: path.to_path_buf(),
            source,
        })?;
        if img.width() <= self.max_image_width {
            return Ok(());
        }

        let scale = self.max_image_width as f64 / img.width() as f64;
        let height = ((img.height() as f64 * scale) as u32).max(1);
        let resized = img.resize_exact(self.max_image_width, height, FilterType::Lanczos3);
        resized.save(path).map_err(|source| StoreError::Downscale {
            path: path.to_path_buf(),
            source,
        })?;
        flow_debug!(
            "downscaled {} to {}x{}",
            path.display(),
            self.max_image_width,
            height
        );
        Ok(())
    }
}
