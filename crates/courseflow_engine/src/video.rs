use std::path::Path;

use courseflow_core::{language_display_name, plan_subtitle_languages};

use crate::render::{render_resource_section, render_video_embed};
use crate::repository::{AssetRecord, CourseRepository};
use crate::resolver::AssetResolver;
use crate::rewrite::RewriteError;

/// One `<track>` entry of a video page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub url: String,
    pub lang: String,
    pub label: &'static str,
    pub is_default: bool,
}

/// A playable video with its ordered subtitle tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPage {
    pub url: String,
    pub subtitles: Vec<SubtitleTrack>,
}

/// A download link derived from an item asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLink {
    pub url: String,
    pub asset_type: String,
    pub name: String,
    pub file_name: String,
}

impl ResourceLink {
    pub fn is_pdf(&self) -> bool {
        self.url.to_ascii_lowercase().ends_with(".pdf")
    }
}

/// Builds the rendered content of a lecture page: the video embed followed
/// by a resource list when the item carries downloadable assets.
pub struct VideoPageAssembler<'a> {
    repo: &'a CourseRepository,
    resolver: &'a mut AssetResolver,
}

impl<'a> VideoPageAssembler<'a> {
    pub fn new(repo: &'a CourseRepository, resolver: &'a mut AssetResolver) -> Self {
        Self { repo, resolver }
    }

    /// Returns `None` when the item has no video asset: a lecture without
    /// an archived video yields no page, which is not an error.
    pub fn assemble(
        &mut self,
        course_slug: &str,
        item_slug: &str,
    ) -> Result<Option<String>, RewriteError> {
        let Some(asset) = self.repo.video_asset(item_slug)? else {
            return Ok(None);
        };

        let video_path = Path::new(&asset.saved_path);
        // The video URL is always resolved, subtitles or not.
        let url = self.resolver.resolve(course_slug, video_path, None)?;

        let plan = plan_subtitle_languages(&asset.subtitle_languages);
        // Only fixed-priority languages have their sibling files mirrored;
        // leftover tracks keep derived URLs.
        for lang in &plan.languages[..plan.priority_count] {
            self.resolver
                .resolve(course_slug, video_path, Some(&format!("{lang}.vtt")))?;
        }

        let subtitles = plan
            .languages
            .iter()
            .enumerate()
            .map(|(index, lang)| SubtitleTrack {
                url: sibling_subtitle_url(&url, lang),
                lang: lang.clone(),
                label: language_display_name(lang),
                is_default: plan.is_default(index),
            })
            .collect();
        let video = VideoPage { url, subtitles };

        let mut sections = vec![render_video_embed(&video)];
        let assets = self.repo.item_assets(item_slug)?;
        if !assets.is_empty() {
            let mut links = Vec::with_capacity(assets.len());
            for asset in &assets {
                links.push(self.resource_link(course_slug, asset)?);
            }
            sections.push(render_resource_section(&links));
        }

        Ok(Some(sections.join("\n")))
    }

    fn resource_link(
        &mut self,
        course_slug: &str,
        asset: &AssetRecord,
    ) -> Result<ResourceLink, RewriteError> {
        let url = self
            .resolver
            .resolve(course_slug, Path::new(&asset.saved_path), None)?;
        let file_name = Path::new(&asset.saved_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| asset.saved_path.clone());
        Ok(ResourceLink {
            url,
            asset_type: asset.asset_type.clone(),
            name: asset.name.clone(),
            file_name,
        })
    }
}

/// Address a subtitle file sibling to the video by swapping the extension
/// on the already resolved video URL.
fn sibling_subtitle_url(video_url: &str, lang: &str) -> String {
    let last_slash = video_url.rfind('/').map(|pos| pos + 1).unwrap_or(0);
    match video_url[last_slash..].rfind('.') {
        Some(dot) => format!("{}.{lang}.vtt", &video_url[..last_slash + dot]),
        None => format!("{video_url}.{lang}.vtt"),
    }
}
