//! Shared fixtures: an in-memory archive database, an in-memory blob
//! transport and collecting sinks for documents and progress events.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use rusqlite::Connection;

use courseflow_engine::{
    hash_file, BlobEntry, BlobTransport, CourseRepository, DocumentSink, ProgressSink,
    PublishEvent, SinkError, TransportError,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(flow_logging::initialize_for_tests);
}

/// Create the archive schema in a fresh in-memory database.
pub fn empty_archive() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE course (
             course_slug TEXT NOT NULL,
             course_name TEXT NOT NULL
         );
         CREATE TABLE module (
             slug TEXT NOT NULL,
             name TEXT NOT NULL,
             description TEXT,
             position INTEGER NOT NULL,
             course_slug TEXT NOT NULL
         );
         CREATE TABLE item (
             slug TEXT NOT NULL,
             name TEXT NOT NULL,
             type_name TEXT NOT NULL,
             content TEXT,
             module_slug TEXT NOT NULL
         );
         CREATE TABLE item_video_asset (
             item_slug TEXT NOT NULL,
             saved_path TEXT NOT NULL,
             subtitle_languages TEXT NOT NULL
         );
         CREATE TABLE item_asset (
             item_slug TEXT NOT NULL,
             asset_id TEXT NOT NULL,
             asset_type TEXT NOT NULL,
             name TEXT NOT NULL,
             saved_path TEXT
         );
         CREATE TABLE course_asset (
             asset_id TEXT PRIMARY KEY,
             asset_type TEXT NOT NULL,
             name TEXT NOT NULL,
             saved_path TEXT NOT NULL
         );
         CREATE TABLE reference (
             slug TEXT NOT NULL,
             name TEXT NOT NULL,
             content TEXT,
             course_slug TEXT NOT NULL
         );",
    )
    .unwrap();
    conn
}

pub fn insert_course(conn: &Connection, slug: &str, name: &str) {
    conn.execute(
        "INSERT INTO course (course_slug, course_name) VALUES (?1, ?2)",
        (slug, name),
    )
    .unwrap();
}

pub fn insert_module(
    conn: &Connection,
    slug: &str,
    name: &str,
    description: Option<&str>,
    position: u32,
    course_slug: &str,
) {
    conn.execute(
        "INSERT INTO module (slug, name, description, position, course_slug) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (slug, name, description, position, course_slug),
    )
    .unwrap();
}

pub fn insert_item(
    conn: &Connection,
    slug: &str,
    name: &str,
    type_name: &str,
    content: Option<&str>,
    module_slug: &str,
) {
    conn.execute(
        "INSERT INTO item (slug, name, type_name, content, module_slug) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (slug, name, type_name, content, module_slug),
    )
    .unwrap();
}

pub fn insert_video_asset(conn: &Connection, item_slug: &str, saved_path: &str, subtitles: &str) {
    conn.execute(
        "INSERT INTO item_video_asset (item_slug, saved_path, subtitle_languages) \
         VALUES (?1, ?2, ?3)",
        (item_slug, saved_path, subtitles),
    )
    .unwrap();
}

pub fn insert_course_asset(
    conn: &Connection,
    asset_id: &str,
    asset_type: &str,
    name: &str,
    saved_path: &str,
) {
    conn.execute(
        "INSERT INTO course_asset (asset_id, asset_type, name, saved_path) \
         VALUES (?1, ?2, ?3, ?4)",
        (asset_id, asset_type, name, saved_path),
    )
    .unwrap();
}

pub fn insert_item_asset(
    conn: &Connection,
    item_slug: &str,
    asset_id: &str,
    asset_type: &str,
    name: &str,
    saved_path: &str,
) {
    conn.execute(
        "INSERT INTO item_asset (item_slug, asset_id, asset_type, name, saved_path) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (item_slug, asset_id, asset_type, name, saved_path),
    )
    .unwrap();
}

pub fn insert_reference(conn: &Connection, slug: &str, name: &str, content: &str, course_slug: &str) {
    conn.execute(
        "INSERT INTO reference (slug, name, content, course_slug) VALUES (?1, ?2, ?3, ?4)",
        (slug, name, content, course_slug),
    )
    .unwrap();
}

pub fn repository(conn: Connection) -> CourseRepository {
    CourseRepository::from_connection(conn)
}

/// In-memory [`BlobTransport`]: a key-to-hash map plus a record of every
/// actual upload, so tests can assert dedup behavior.
#[derive(Default, Clone)]
pub struct MemoryBlobTransport {
    pub objects: Arc<Mutex<BTreeMap<String, String>>>,
    pub uploads: Arc<Mutex<Vec<String>>>,
}

impl MemoryBlobTransport {
    pub fn with_object(self, key: &str, hash: &str) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), hash.to_string());
        self
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

impl BlobTransport for MemoryBlobTransport {
    fn stat(&self, key: &str) -> Result<Option<String>, TransportError> {
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    fn upload_token(&self, key: &str) -> Result<String, TransportError> {
        Ok(format!("token-{key}"))
    }

    fn put(
        &self,
        _token: &str,
        key: &str,
        local_path: &Path,
        _progress: Arc<dyn ProgressSink>,
    ) -> Result<String, TransportError> {
        let hash = hash_file(local_path)?;
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), hash);
        self.uploads.lock().unwrap().push(key.to_string());
        Ok(key.to_string())
    }

    fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, TransportError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, hash)| BlobEntry {
                key: key.clone(),
                hash: hash.clone(),
            })
            .collect())
    }

    fn delete(&self, key: &str) -> Result<(), TransportError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Collects published documents instead of shipping them anywhere.
#[derive(Default)]
pub struct CollectingSink {
    pub documents: Mutex<Vec<(String, String)>>,
}

impl CollectingSink {
    pub fn paths(&self) -> Vec<String> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn document(&self, path: &str) -> Option<String> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|(candidate, _)| candidate == path)
            .map(|(_, body)| body.clone())
    }
}

impl DocumentSink for CollectingSink {
    fn write(&self, path: &str, bytes: &[u8], _overwrite: bool) -> Result<(), SinkError> {
        self.documents
            .lock()
            .unwrap()
            .push((path.to_string(), String::from_utf8_lossy(bytes).into_owned()));
        Ok(())
    }
}

/// Collects progress events for assertions.
#[derive(Default)]
pub struct CollectingProgress {
    pub events: Mutex<Vec<PublishEvent>>,
}

impl CollectingProgress {
    pub fn snapshot(&self) -> Vec<PublishEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for CollectingProgress {
    fn emit(&self, event: PublishEvent) {
        self.events.lock().unwrap().push(event);
    }
}
