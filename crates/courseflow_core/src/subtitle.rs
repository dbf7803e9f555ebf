/// Filename suffix a raw subtitle token must carry to be a candidate.
pub const SUBTITLE_SUFFIX: &str = ".vtt";

/// Languages emitted ahead of everything else, in this exact order.
pub const PRIORITY_LANGUAGES: [&str; 3] = ["zh-CN", "zh-TW", "en"];

/// Outcome of planning one video's subtitle tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitlePlan {
    /// Ordered language codes: priority languages first, leftovers after,
    /// in their original listing order.
    pub languages: Vec<String>,
    /// How many of `languages` came from the fixed-priority pass. Only
    /// these have their sibling subtitle files mirrored to remote storage.
    pub priority_count: usize,
}

impl SubtitlePlan {
    /// The default flag belongs to the first emitted track, if any.
    pub fn is_default(&self, index: usize) -> bool {
        index == 0 && !self.languages.is_empty()
    }
}

/// Derive the ordered subtitle language list from a raw comma-separated
/// listing of filename-like tokens such as `"en.vtt, zh-CN.vtt"`.
///
/// Tokens not ending in [`SUBTITLE_SUFFIX`] are ignored. Each language from
/// [`PRIORITY_LANGUAGES`] that is present is emitted first, in priority
/// order; remaining candidates follow in listing order.
pub fn plan_subtitle_languages(raw_listing: &str) -> SubtitlePlan {
    let candidates: Vec<&str> = raw_listing
        .split(',')
        .map(str::trim)
        .filter(|token| token.ends_with(SUBTITLE_SUFFIX))
        .collect();

    let mut languages = Vec::new();
    for lang in PRIORITY_LANGUAGES {
        if candidates.iter().any(|c| *c == format!("{lang}{SUBTITLE_SUFFIX}")) {
            languages.push(lang.to_string());
        }
    }
    let priority_count = languages.len();

    for candidate in candidates {
        let lang = candidate
            .strip_suffix(SUBTITLE_SUFFIX)
            .unwrap_or(candidate);
        if !languages.iter().any(|l| l == lang) {
            languages.push(lang.to_string());
        }
    }

    SubtitlePlan {
        languages,
        priority_count,
    }
}
