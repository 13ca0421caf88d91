//! Per-conversation state.

use campanion_core::{CourseCode, CourseRecord, History};
use std::collections::HashMap;
use uuid::Uuid;

/// A cached course lookup. Store failures are never cached so the next
/// turn retries them.
#[derive(Debug, Clone)]
pub enum CachedLookup {
    Found(CourseRecord),
    NotFound,
}

/// One chat session: its history and the courses already looked up.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub history: History,
    course_cache: HashMap<CourseCode, CachedLookup>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history: History::new(),
            course_cache: HashMap::new(),
        }
    }

    pub fn cached_course(&self, code: &CourseCode) -> Option<&CachedLookup> {
        self.course_cache.get(code)
    }

    pub fn cache_course(&mut self, code: CourseCode, lookup: CachedLookup) {
        self.course_cache.insert(code, lookup);
    }

    pub fn cached_courses(&self) -> usize {
        self.course_cache.len()
    }

    /// Forget history and cached courses, keeping the id.
    pub fn reset(&mut self) {
        self.history = History::new();
        self.course_cache.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
