use std::sync::Arc;

use courseflow_core::{flow_identifier, Course, CourseItem, FlowRef, Module, Page};
use flow_logging::flow_info;

use crate::progress::{ProgressSink, PublishEvent};
use crate::render::{render_course_manifest, render_flow_document, ManifestLayout};
use crate::repository::{CourseRepository, RepositoryError};
use crate::resolver::{AssetResolver, ResolveError};
use crate::rewrite::{ContentRewriter, RewriteError};
use crate::sink::{DocumentSink, SinkError};
use crate::video::VideoPageAssembler;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Walks course -> module -> item and assembles the publishable documents:
/// one flow per module, an optional synthetic "Resources" flow, and the two
/// course manifests. Documents are regenerated in full on every run; only
/// binary asset uploads are deduplicated.
///
/// Any resolver, store or sink failure aborts the whole run. The manifests
/// reference flow identifiers that must correspond to flows that were
/// actually published, so partial publication is never committed.
pub struct FlowGenerator<'a> {
    repo: &'a CourseRepository,
    resolver: AssetResolver,
    sink: &'a dyn DocumentSink,
    progress: Arc<dyn ProgressSink>,
}

impl<'a> FlowGenerator<'a> {
    pub fn new(
        repo: &'a CourseRepository,
        resolver: AssetResolver,
        sink: &'a dyn DocumentSink,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            repo,
            resolver,
            sink,
            progress,
        }
    }

    pub fn generate_course(&mut self, course: &Course) -> Result<(), GenerateError> {
        let modules = self.repo.modules(&course.slug)?;

        let mut flows = Vec::with_capacity(modules.len() + 1);
        let mut last_ordinal = 0u32;
        for (index, module) in modules.iter().enumerate() {
            let ordinal = index as u32 + 1;
            let flow_id = self.generate_module_flow(course, module, ordinal)?;
            flows.push(FlowRef {
                name: module.name.clone(),
                flow_id,
                description: module.description.clone(),
            });
            last_ordinal = ordinal;
        }

        let references = self.repo.references(&course.slug)?;
        if !references.is_empty() {
            let flow_id = self.generate_reference_flow(course, &references, last_ordinal + 1)?;
            flows.push(FlowRef {
                name: "Resources".to_string(),
                flow_id,
                description: None,
            });
        }

        let embedded = render_course_manifest(course, &flows, ManifestLayout::Embedded);
        let embedded_path = format!(
            "{}/{}_course_chunks.yml",
            course.slug,
            course.slug.replace('_', "-")
        );
        self.publish(&embedded_path, embedded.as_bytes())?;

        let standalone = render_course_manifest(course, &flows, ManifestLayout::Standalone);
        self.publish(&format!("{}/course.yml", course.slug), standalone.as_bytes())?;

        flow_info!("course {} generated ({} flows)", course.slug, flows.len());
        Ok(())
    }

    fn generate_module_flow(
        &mut self,
        course: &Course,
        module: &Module,
        ordinal: u32,
    ) -> Result<String, GenerateError> {
        let items = self.repo.module_items(&module.slug)?;
        let pages = self.build_pages(&course.slug, &items)?;

        let flow_id = flow_identifier(&course.slug, ordinal, &module.slug);
        let document = render_flow_document(&module.name, module.description.as_deref(), &pages);
        self.publish(
            &format!("{}/flows/{}.yml", course.slug, flow_id),
            document.as_bytes(),
        )?;
        Ok(flow_id)
    }

    fn generate_reference_flow(
        &mut self,
        course: &Course,
        references: &[CourseItem],
        ordinal: u32,
    ) -> Result<String, GenerateError> {
        let pages = self.build_pages(&course.slug, references)?;

        let flow_id = flow_identifier(&course.slug, ordinal, "resource");
        let document = render_flow_document("Resources", None, &pages);
        self.publish(
            &format!("{}/flows/{}.yml", course.slug, flow_id),
            document.as_bytes(),
        )?;
        Ok(flow_id)
    }

    fn build_pages(
        &mut self,
        course_slug: &str,
        items: &[CourseItem],
    ) -> Result<Vec<Page>, GenerateError> {
        let mut pages = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let content = match item {
                CourseItem::Lecture { slug, .. } => {
                    let mut assembler = VideoPageAssembler::new(self.repo, &mut self.resolver);
                    assembler.assemble(course_slug, slug)?
                }
                CourseItem::Text { content, .. } | CourseItem::Reference { content, .. } => {
                    match content.as_deref().filter(|raw| !raw.is_empty()) {
                        Some(raw) => {
                            let mut rewriter = ContentRewriter::new(self.repo, &mut self.resolver);
                            Some(rewriter.rewrite(raw, course_slug, item.name())?)
                        }
                        None => None,
                    }
                }
            };

            // The position suffix derives from the enumeration index, not
            // the emitted-page index: identifiers must stay stable across
            // reruns even when earlier items produce no page.
            if let Some(content) = content {
                pages.push(Page::new(item.slug(), index + 1, item.name(), content));
            }
        }
        Ok(pages)
    }

    fn publish(&self, path: &str, bytes: &[u8]) -> Result<(), SinkError> {
        self.sink.write(path, bytes, true)?;
        self.progress.emit(PublishEvent::DocumentPublished {
            path: path.to_string(),
        });
        Ok(())
    }
}
