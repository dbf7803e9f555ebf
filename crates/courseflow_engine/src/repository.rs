use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension};

use courseflow_core::{Course, CourseItem, Module};

/// A lecture's locally saved video file plus its raw subtitle listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    pub saved_path: String,
    pub subtitle_languages: String,
}

/// A named, typed binary resource addressable from item markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub asset_id: String,
    pub asset_type: String,
    pub name: String,
    pub saved_path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A lecture item may own at most one video asset.
    #[error("item {item} has more than one video asset")]
    MultipleVideoAssets { item: String },
}

/// Read-only queries over the archived course database. The archive is
/// owned and mutated by the separate acquisition process; this side never
/// writes.
pub struct CourseRepository {
    conn: Connection,
}

impl CourseRepository {
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    /// Wrap an existing connection. Used by tests to run against an
    /// in-memory database.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// All archived courses. An archive without the course table yet is the
    /// legitimate "nothing to do" state and reads as empty.
    pub fn courses(&self) -> Result<Vec<Course>, RepositoryError> {
        let mut stmt = match self
            .conn
            .prepare("SELECT course_slug, course_name FROM course ORDER BY rowid")
        {
            Ok(stmt) => stmt,
            Err(err) if is_missing_table(&err) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let rows = stmt.query_map([], |row| {
            Ok(Course {
                slug: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Modules of a course in ascending ordinal position.
    pub fn modules(&self, course_slug: &str) -> Result<Vec<Module>, RepositoryError> {
        let mut stmt = self.conn.prepare(
            "SELECT slug, name, description, position FROM module \
             WHERE course_slug = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map([course_slug], |row| {
            Ok(Module {
                slug: row.get(0)?,
                name: row.get(1)?,
                description: row
                    .get::<_, Option<String>>(2)?
                    .filter(|text| !text.is_empty()),
                position: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Items of a module in stored order.
    pub fn module_items(&self, module_slug: &str) -> Result<Vec<CourseItem>, RepositoryError> {
        let mut stmt = self.conn.prepare(
            "SELECT slug, name, type_name, content FROM item \
             WHERE module_slug = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map([module_slug], |row| {
            let slug: String = row.get(0)?;
            let name: String = row.get(1)?;
            let type_name: String = row.get(2)?;
            let content: Option<String> = row.get(3)?;
            Ok(if type_name == "lecture" {
                CourseItem::Lecture { slug, name }
            } else {
                CourseItem::Text {
                    slug,
                    name,
                    content,
                }
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// The at-most-one video asset of an item.
    pub fn video_asset(&self, item_slug: &str) -> Result<Option<VideoAsset>, RepositoryError> {
        let mut stmt = self.conn.prepare(
            "SELECT saved_path, subtitle_languages FROM item_video_asset \
             WHERE item_slug = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map([item_slug], |row| {
            Ok(VideoAsset {
                saved_path: row.get(0)?,
                subtitle_languages: row.get(1)?,
            })
        })?;
        let mut assets = rows.collect::<Result<Vec<_>, _>>()?;
        if assets.len() > 1 {
            return Err(RepositoryError::MultipleVideoAssets {
                item: item_slug.to_string(),
            });
        }
        Ok(assets.pop())
    }

    /// Downloaded assets attached to an item. Rows without a saved path are
    /// skipped; archival and publishing are decoupled and partial archives
    /// are expected.
    pub fn item_assets(&self, item_slug: &str) -> Result<Vec<AssetRecord>, RepositoryError> {
        let mut stmt = self.conn.prepare(
            "SELECT asset_id, asset_type, name, saved_path FROM item_asset \
             WHERE item_slug = ?1 AND saved_path IS NOT NULL AND saved_path != '' \
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map([item_slug], |row| {
            Ok(AssetRecord {
                asset_id: row.get(0)?,
                asset_type: row.get(1)?,
                name: row.get(2)?,
                saved_path: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Look up a course-level asset by the identifier embedded in markup.
    /// Unknown identifiers are an expected absence, not an error.
    pub fn course_asset(&self, asset_id: &str) -> Result<Option<AssetRecord>, RepositoryError> {
        let mut stmt = self.conn.prepare(
            "SELECT asset_id, asset_type, name, saved_path FROM course_asset \
             WHERE asset_id = ?1",
        )?;
        stmt.query_row([asset_id], |row| {
            Ok(AssetRecord {
                asset_id: row.get(0)?,
                asset_type: row.get(1)?,
                name: row.get(2)?,
                saved_path: row.get(3)?,
            })
        })
        .optional()
        .map_err(Into::into)
    }

    /// Reference items owned directly by a course.
    pub fn references(&self, course_slug: &str) -> Result<Vec<CourseItem>, RepositoryError> {
        let mut stmt = match self.conn.prepare(
            "SELECT slug, name, content FROM reference \
             WHERE course_slug = ?1 ORDER BY rowid",
        ) {
            Ok(stmt) => stmt,
            Err(err) if is_missing_table(&err) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let rows = stmt.query_map([course_slug], |row| {
            Ok(CourseItem::Reference {
                slug: row.get(0)?,
                name: row.get(1)?,
                content: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn is_missing_table(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(_, Some(message)) if message.contains("no such table")
    )
}
