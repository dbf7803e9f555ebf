/// One published unit of content, derived from a single item. Never
/// persisted; lives only for the duration of a generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl Page {
    /// Page identifiers use underscores throughout; slugs from the archive
    /// use hyphens. `position` is the 1-based enumeration index of the item
    /// within its module, counting items that produced no page.
    pub fn new(item_slug: &str, position: usize, title: &str, content: String) -> Self {
        let id = format!("{item_slug}_{position}").replace('-', "_");
        Self {
            id,
            title: title.to_string(),
            content,
        }
    }
}

/// Reference to a generated flow, used to assemble the course manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRef {
    pub name: String,
    pub flow_id: String,
    pub description: Option<String>,
}

/// Flow identifiers are hyphenated: `{course}_{ordinal}_{suffix}` with every
/// underscore replaced. The suffix is the module slug, or `resource` for the
/// synthetic references flow.
pub fn flow_identifier(course_slug: &str, ordinal: u32, suffix: &str) -> String {
    format!("{course_slug}_{ordinal}_{suffix}").replace('_', "-")
}
