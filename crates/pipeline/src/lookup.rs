//! Course lookup by deterministic point id.
//!
//! The ingestion scripts stored each course under the MD5 digest of its
//! normalized code, so a course is fetched directly instead of searched for.

use campanion_core::{CourseCode, CourseRecord, StoreError, VectorStore};
use md5::{Digest, Md5};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// The point id a course was ingested under: MD5 of the code, as a UUID.
pub fn course_point_id(code: &CourseCode) -> String {
    let digest = Md5::digest(code.as_str().as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    Uuid::from_bytes(bytes).hyphenated().to_string()
}

/// Result of looking up one course.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Found(CourseRecord),
    /// No such point, or the point has an empty payload.
    NotFound,
    /// The store could not be asked.
    Unavailable(StoreError),
}

impl LookupOutcome {
    /// Collapse to a record, treating an unavailable store as "not found".
    pub fn into_record(self) -> Option<CourseRecord> {
        match self {
            LookupOutcome::Found(record) => Some(record),
            LookupOutcome::NotFound | LookupOutcome::Unavailable(_) => None,
        }
    }
}

pub struct CourseLookup {
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl CourseLookup {
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn lookup(&self, code: &CourseCode) -> LookupOutcome {
        let id = course_point_id(code);

        let points = match self.store.retrieve(&self.collection, &[id.clone()]).await {
            Ok(points) => points,
            Err(e) => {
                warn!(course = %code, error = %e, "Course lookup failed");
                return LookupOutcome::Unavailable(e);
            }
        };

        let record = points
            .into_iter()
            .find(|p| p.id == id)
            .and_then(|p| CourseRecord::from_payload(&p.payload, Some(code)));

        match record {
            Some(record) => {
                debug!(course = %code, "Course found");
                LookupOutcome::Found(record)
            }
            None => {
                debug!(course = %code, "Course not found");
                LookupOutcome::NotFound
            }
        }
    }
}
