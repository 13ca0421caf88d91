//! Retrieval payloads resolved into a closed set of shapes.
//!
//! Each collection was ingested by a different script, so a hit's payload
//! may describe a course, an interview experience, a chunk of prose, or
//! something else entirely. [`Payload::from_map`] decides which.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::course::CourseRecord;
use crate::store::PayloadMap;

/// One interview-experience chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewChunk {
    pub interviewee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub content: String,
}

/// A chunk of prose (culture write-ups, society pages, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A resolved retrieval payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Course(CourseRecord),
    Interview(InterviewChunk),
    Text(TextChunk),
    /// Unrecognized payload, kept verbatim.
    Other(PayloadMap),
}

impl Payload {
    /// Classify a raw payload.
    ///
    /// Precedence: a valid course code makes it a course, an `interviewee`
    /// field makes it an interview, a `text` or `data` field makes it prose.
    pub fn from_map(map: &PayloadMap) -> Self {
        if let Some(record) = CourseRecord::from_payload(map, None) {
            return Payload::Course(record);
        }

        if let Some(interviewee) = string_field(map, &["interviewee"]) {
            return Payload::Interview(InterviewChunk {
                interviewee,
                company: string_field(map, &["company"]),
                role: string_field(map, &["role", "position"]),
                content: string_field(map, &["data", "text"]).unwrap_or_default(),
            });
        }

        if let Some(text) = string_field(map, &["text", "data"]) {
            return Payload::Text(TextChunk {
                text,
                source: string_field(map, &["source", "title", "url"]),
            });
        }

        Payload::Other(map.clone())
    }
}

fn string_field(map: &PayloadMap, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    })
}
