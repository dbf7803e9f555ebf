//! Thin entry point: builds the configuration from the environment, wires
//! the pipeline and generates every archived course.
mod settings;

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use url::Url;

use courseflow_engine::{
    AssetResolver, AssetStore, CourseRepository, DocumentSink, FlowGenerator, HttpDocumentSink,
    LocalDocumentSink, LogProgressSink, ProgressSink, PublishConfig, ReqwestBlobTransport,
    ResolveMode,
};
use flow_logging::{flow_error, flow_info, flow_warn, LogDestination};

use crate::settings::AppSettings;

fn main() -> ExitCode {
    flow_logging::initialize(LogDestination::Terminal);

    let settings = match settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            flow_error!("configuration error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            flow_error!("generation failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &AppSettings) -> Result<()> {
    let config = &settings.config;
    let progress: Arc<dyn ProgressSink> = Arc::new(LogProgressSink);

    let sink: Box<dyn DocumentSink> = match config.mode {
        ResolveMode::Relative => Box::new(LocalDocumentSink::new(config.output_dir.clone())),
        ResolveMode::Publish => {
            let endpoint = Url::parse(&config.document_sink_url)
                .context("invalid document sink URL")?;
            Box::new(HttpDocumentSink::new(
                endpoint,
                config.document_sink_token.clone(),
            )?)
        }
    };

    if !settings.db_path.is_file() {
        flow_warn!(
            "no archive database at {}; nothing to publish",
            settings.db_path.display()
        );
        return Ok(());
    }
    backup_archive(&settings.db_path, sink.as_ref())?;

    let repo = CourseRepository::open(&settings.db_path)
        .with_context(|| format!("cannot open archive {}", settings.db_path.display()))?;
    let courses = repo.courses()?;
    if courses.is_empty() {
        flow_warn!("no courses have been archived yet; nothing to publish");
        return Ok(());
    }

    if config.purge_duplicate_blobs && config.mode == ResolveMode::Publish {
        let store = build_store(config, Arc::clone(&progress))?;
        for course in &courses {
            store.purge_duplicates(&course.slug)?;
        }
    }

    for course in &courses {
        flow_info!("generating course {}", course.slug);
        let resolver = build_resolver(config, Arc::clone(&progress))?;
        let mut generator =
            FlowGenerator::new(&repo, resolver, sink.as_ref(), Arc::clone(&progress));
        generator.generate_course(course)?;
    }

    flow_info!("all courses generated");
    Ok(())
}

fn build_resolver(
    config: &PublishConfig,
    progress: Arc<dyn ProgressSink>,
) -> Result<AssetResolver> {
    let base_url = Url::parse(&config.asset_base_url).context("invalid asset base URL")?;
    match config.mode {
        ResolveMode::Relative => Ok(AssetResolver::relative(config.local_root.clone(), base_url)),
        ResolveMode::Publish => {
            let store = build_store(config, progress)?;
            Ok(AssetResolver::publishing(
                config.local_root.clone(),
                base_url,
                store,
            ))
        }
    }
}

fn build_store(config: &PublishConfig, progress: Arc<dyn ProgressSink>) -> Result<AssetStore> {
    let api = Url::parse(&config.blob_api_url).context("invalid blob API URL")?;
    let upload = Url::parse(&config.blob_upload_url).context("invalid blob upload URL")?;
    let transport = ReqwestBlobTransport::new(
        api,
        upload,
        &config.bucket,
        &config.access_key,
        &config.secret_key,
    )?;
    Ok(AssetStore::new(
        Box::new(transport),
        progress,
        config.key_prefix.clone(),
        config.max_image_width,
    ))
}

/// Push a timestamped copy of the archive database to the document store
/// before touching anything, so a bad run can be diagnosed later.
fn backup_archive(db_path: &Path, sink: &dyn DocumentSink) -> Result<()> {
    let bytes = fs::read(db_path)
        .with_context(|| format!("cannot read archive {}", db_path.display()))?;
    let stamp = chrono::Local::now().format("%Y-%m-%d-%H-%M");
    sink.write(&format!("course_{stamp}.db"), &bytes, true)?;
    Ok(())
}
