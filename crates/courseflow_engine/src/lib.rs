//! Courseflow engine: archive repository access, asset mirroring and
//! document publishing pipeline.
mod builder;
mod config;
mod hash;
mod progress;
mod render;
mod repository;
mod resolver;
mod rewrite;
mod sink;
mod store;
mod transport;
mod video;

pub use builder::{FlowGenerator, GenerateError};
pub use config::{PublishConfig, ResolveMode, DEFAULT_KEY_PREFIX, DEFAULT_MAX_IMAGE_WIDTH};
pub use hash::{hash_file, ContentHashCache};
pub use progress::{LogProgressSink, ProgressSink, PublishEvent};
pub use render::{
    indent, render_course_manifest, render_flow_document, render_resource_section,
    render_video_embed, ManifestLayout,
};
pub use repository::{AssetRecord, CourseRepository, RepositoryError, VideoAsset};
pub use resolver::{replace_extension, AssetResolver, ResolveError};
pub use rewrite::{normalize_leading_colons, unescape_entities, ContentRewriter, RewriteError};
pub use sink::{DocumentSink, HttpDocumentSink, LocalDocumentSink, SinkError};
pub use store::{AssetStore, StoreError};
pub use transport::{BlobEntry, BlobTransport, ReqwestBlobTransport, TransportError};
pub use video::{ResourceLink, SubtitleTrack, VideoPage, VideoPageAssembler};
