/// A course as stored in the archive: a stable slug plus a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub slug: String,
    pub name: String,
}

/// A module of a course. `position` is the 1-based ordinal within the course
/// and drives both flow ordering and flow identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub position: u32,
}
