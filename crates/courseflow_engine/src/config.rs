use std::path::PathBuf;

/// Raster images wider than this are downscaled before upload.
pub const DEFAULT_MAX_IMAGE_WIDTH: u32 = 1024;

/// Namespace prefix every blob key is placed under.
pub const DEFAULT_KEY_PREFIX: &str = "course-assets";

/// How local asset paths are turned into URLs. Fixed for the whole process,
/// never per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Strip the local root and address assets relative to the base URL.
    /// No remote traffic.
    Relative,
    /// Mirror assets into the blob store and address them by returned key.
    Publish,
}

/// Everything the pipeline needs to know, assembled once at process start
/// from the environment and handed to component constructors. There is no
/// ambient global configuration.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub mode: ResolveMode,
    /// Root the archive's saved paths are relative to.
    pub local_root: PathBuf,
    /// Absolute base URL resolved asset URLs are joined onto.
    pub asset_base_url: String,
    /// Management endpoint of the blob store (stat/list/delete/tokens).
    pub blob_api_url: String,
    /// Upload endpoint of the blob store.
    pub blob_upload_url: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub key_prefix: String,
    /// Document store upload endpoint.
    pub document_sink_url: String,
    /// Absent token turns every document publish into a silent no-op.
    pub document_sink_token: Option<String>,
    /// Where documents land in relative mode.
    pub output_dir: PathBuf,
    pub max_image_width: u32,
    /// Delete same-hash duplicates from each course namespace before
    /// generating.
    pub purge_duplicate_blobs: bool,
}
