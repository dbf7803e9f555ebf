use std::path::{Path, PathBuf};

use url::Url;

use crate::store::{AssetStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A file that must be uploaded does not exist locally. Fatal for the
    /// current item.
    #[error("required local file missing: {0}")]
    PathNotFound(PathBuf),
    /// Relative-mode precondition: the path must lie under the configured
    /// root. A violation indicates misconfiguration and is fatal.
    #[error("path {path} lies outside the configured root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("cannot join '{segment}' to the asset base URL: {source}")]
    UrlJoin {
        segment: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Upload(#[from] StoreError),
}

enum ResolverMode {
    Relative,
    Publish(AssetStore),
}

/// Turns a locally saved asset path into a public URL.
///
/// The mode is fixed at construction for the whole process: relative mode
/// strips the local root and never touches the network; publish mode
/// mirrors the file into the blob store and addresses it by returned key.
pub struct AssetResolver {
    mode: ResolverMode,
    local_root: PathBuf,
    base_url: Url,
}

impl AssetResolver {
    pub fn relative(local_root: PathBuf, base_url: Url) -> Self {
        Self {
            mode: ResolverMode::Relative,
            local_root,
            base_url: with_trailing_slash(base_url),
        }
    }

    pub fn publishing(local_root: PathBuf, base_url: Url, store: AssetStore) -> Self {
        Self {
            mode: ResolverMode::Publish(store),
            local_root,
            base_url: with_trailing_slash(base_url),
        }
    }

    /// Resolve a saved path to a URL. An extension override substitutes the
    /// path's extension before resolution; it is how a subtitle file
    /// sibling to a video file is addressed without re-deriving naming
    /// logic at the call site.
    pub fn resolve(
        &mut self,
        course_slug: &str,
        local_path: &Path,
        extension_override: Option<&str>,
    ) -> Result<String, ResolveError> {
        let local_path = match extension_override {
            Some(extension) => replace_extension(local_path, extension),
            None => local_path.to_path_buf(),
        };
        let absolute = if local_path.is_absolute() {
            local_path.clone()
        } else {
            self.local_root.join(&local_path)
        };

        match &mut self.mode {
            ResolverMode::Relative => {
                let relative =
                    absolute
                        .strip_prefix(&self.local_root)
                        .map_err(|_| ResolveError::OutsideRoot {
                            path: absolute.clone(),
                            root: self.local_root.clone(),
                        })?;
                let segment = forward_slashes(relative);
                join_base(&self.base_url, &segment)
            }
            ResolverMode::Publish(store) => {
                if !absolute.is_file() {
                    return Err(ResolveError::PathNotFound(absolute));
                }
                let relative = absolute
                    .strip_prefix(&self.local_root)
                    .unwrap_or(&local_path);
                let key = store.put(course_slug, &absolute, &forward_slashes(relative))?;
                join_base(&self.base_url, &key)
            }
        }
    }
}

/// Substitute a path's extension: `video.mp4` + `"en.vtt"` becomes
/// `video.en.vtt`. A leading dot on the extension is optional.
pub fn replace_extension(path: &Path, extension: &str) -> PathBuf {
    let extension = extension.strip_prefix('.').unwrap_or(extension);
    path.with_extension(extension)
}

fn forward_slashes(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn join_base(base: &Url, segment: &str) -> Result<String, ResolveError> {
    base.join(segment)
        .map(|url| url.to_string())
        .map_err(|source| ResolveError::UrlJoin {
            segment: segment.to_string(),
            source,
        })
}

fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}
