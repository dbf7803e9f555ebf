//! Environment-driven configuration. Everything is read once at startup
//! into an explicit [`PublishConfig`]; no component reads the environment
//! afterwards.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use courseflow_engine::{PublishConfig, ResolveMode, DEFAULT_KEY_PREFIX, DEFAULT_MAX_IMAGE_WIDTH};

pub struct AppSettings {
    pub db_path: PathBuf,
    pub config: PublishConfig,
}

pub fn from_env() -> Result<AppSettings> {
    let local_root = match env::var_os("COURSEFLOW_LOCAL_ROOT") {
        Some(root) => PathBuf::from(root),
        None => env::current_dir().context("cannot determine working directory")?,
    };
    let db_path = env::var_os("COURSEFLOW_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|| local_root.join("course-archive.db"));

    let bucket = var_or_default("BLOB_BUCKET", "");
    let access_key = var_or_default("BLOB_ACCESS_KEY", "");
    let secret_key = var_or_default("BLOB_SECRET_KEY", "");
    let has_blob_credentials =
        !bucket.is_empty() && !access_key.is_empty() && !secret_key.is_empty();

    let mode = match env::var("COURSEFLOW_MODE").ok().as_deref() {
        Some("relative") => ResolveMode::Relative,
        Some("publish") => ResolveMode::Publish,
        Some(other) => bail!("COURSEFLOW_MODE must be 'relative' or 'publish', got '{other}'"),
        // Without an explicit selector, publish when blob credentials are
        // configured, otherwise fall back to local relative output.
        None if has_blob_credentials => ResolveMode::Publish,
        None => ResolveMode::Relative,
    };
    if mode == ResolveMode::Publish && !has_blob_credentials {
        bail!("publish mode requires BLOB_BUCKET, BLOB_ACCESS_KEY and BLOB_SECRET_KEY");
    }

    let asset_base_url = env::var("ASSET_BASE_URL")
        .context("ASSET_BASE_URL must be set to the public base URL for resolved assets")?;

    let max_image_width = match env::var("MAX_IMAGE_WIDTH") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("MAX_IMAGE_WIDTH is not a number: '{raw}'"))?,
        Err(_) => DEFAULT_MAX_IMAGE_WIDTH,
    };

    let output_dir = env::var_os("COURSEFLOW_OUTPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| local_root.join("published"));

    let config = PublishConfig {
        mode,
        local_root,
        asset_base_url,
        blob_api_url: var_or_default("BLOB_API_URL", ""),
        blob_upload_url: var_or_default("BLOB_UPLOAD_URL", ""),
        bucket,
        access_key,
        secret_key,
        key_prefix: var_or_default("BLOB_KEY_PREFIX", DEFAULT_KEY_PREFIX),
        document_sink_url: var_or_default("DOC_SINK_URL", ""),
        document_sink_token: env::var("DOC_SINK_TOKEN").ok().filter(|t| !t.is_empty()),
        output_dir,
        max_image_width,
        purge_duplicate_blobs: matches!(
            env::var("PURGE_DUPLICATE_BLOBS").ok().as_deref(),
            Some("1") | Some("true")
        ),
    };

    Ok(AppSettings { db_path, config })
}

fn var_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}
