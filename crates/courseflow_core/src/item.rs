/// One publishable unit from the archive.
///
/// Lectures draw their content from an attached video asset; text items and
/// references carry raw markup (possibly absent, in which case no page is
/// produced for them). References belong directly to a course rather than
/// to a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseItem {
    Lecture {
        slug: String,
        name: String,
    },
    Text {
        slug: String,
        name: String,
        content: Option<String>,
    },
    Reference {
        slug: String,
        name: String,
        content: Option<String>,
    },
}

impl CourseItem {
    pub fn slug(&self) -> &str {
        match self {
            CourseItem::Lecture { slug, .. }
            | CourseItem::Text { slug, .. }
            | CourseItem::Reference { slug, .. } => slug,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CourseItem::Lecture { name, .. }
            | CourseItem::Text { name, .. }
            | CourseItem::Reference { name, .. } => name,
        }
    }
}
