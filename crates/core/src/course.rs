//! Course codes and course records.
//!
//! Records are produced offline by the catalogue scrapers and stored as
//! loosely-typed payloads. Several generations of those scripts wrote the
//! same attribute under different keys (`prereqs` vs `prerequisites`,
//! `lec_time` vs `lecture_time`, ...), so a record is read from a payload
//! through an alias table instead of a strict schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::store::PayloadMap;

/// A normalized course code: uppercase letters followed by digits, with
/// whitespace and hyphens removed (e.g. "col-100" → "COL100").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseCode(String);

impl CourseCode {
    /// Normalize and validate. Returns `None` unless the result is 2–3 ASCII
    /// letters followed by exactly 3 ASCII digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = Self::normalize(raw);
        let letters = normalized.chars().take_while(|c| c.is_ascii_alphabetic()).count();
        let rest = &normalized[letters..];
        let valid = (2..=3).contains(&letters)
            && rest.len() == 3
            && rest.chars().all(|c| c.is_ascii_digit());
        valid.then_some(Self(normalized))
    }

    /// Strip whitespace and hyphens and uppercase. Idempotent.
    pub fn normalize(raw: &str) -> String {
        raw.chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CourseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A course as stored in the `courses` collection.
///
/// Every attribute except the code is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub code: CourseCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_structure: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overlaps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lecture_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutorial_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practical_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub study_materials: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacancy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_strength: Option<String>,
}

impl CourseRecord {
    /// An otherwise empty record for `code`.
    pub fn new(code: CourseCode) -> Self {
        Self {
            code,
            name: None,
            instructor: None,
            instructor_email: None,
            credits: None,
            credit_structure: None,
            prerequisites: Vec::new(),
            overlaps: Vec::new(),
            slot: None,
            lecture_time: None,
            tutorial_time: None,
            practical_time: None,
            description: None,
            study_materials: Vec::new(),
            vacancy: None,
            current_strength: None,
        }
    }

    /// Read a record from a store payload.
    ///
    /// The code is taken from the payload when present and valid, otherwise
    /// from `fallback` (the code the point was looked up by). Returns `None`
    /// for an empty payload or when no code can be determined.
    pub fn from_payload(payload: &PayloadMap, fallback: Option<&CourseCode>) -> Option<Self> {
        if payload.is_empty() {
            return None;
        }

        let code = scalar(payload, &["course_code", "code"])
            .and_then(|raw| CourseCode::parse(&raw))
            .or_else(|| fallback.cloned())?;

        Some(Self {
            code,
            name: scalar(payload, &["course_name", "name"]),
            instructor: scalar(payload, &["instructor"]),
            instructor_email: scalar(payload, &["instructor_email", "instructor_mail", "email"]),
            credits: scalar(payload, &["credits"]),
            credit_structure: scalar(payload, &["credit_structure", "units"]),
            prerequisites: list(payload, &["prerequisites", "prereqs"]),
            overlaps: list(payload, &["overlaps"]),
            slot: scalar(payload, &["slot"]),
            lecture_time: scalar(payload, &["lecture_time", "lec_time"]),
            tutorial_time: scalar(payload, &["tutorial_time", "tut_time"]),
            practical_time: scalar(payload, &["practical_time", "lab_time"]),
            description: scalar(payload, &["description", "data"]),
            study_materials: list(payload, &["study_material", "study_materials"]),
            vacancy: scalar(payload, &["vacancy"]),
            current_strength: scalar(payload, &["current_strength"]),
        })
    }
}

/// First non-empty string or number under any of `keys`.
fn scalar(payload: &PayloadMap, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match payload.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First non-empty list under any of `keys`. A plain string is split on commas.
fn list(payload: &PayloadMap, keys: &[&str]) -> Vec<String> {
    for key in keys {
        let items: Vec<String> = match payload.get(*key) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) => s.split(',').map(|p| p.trim().to_string()).collect(),
            _ => continue,
        };
        let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
        if !items.is_empty() {
            return items;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> PayloadMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn parse_normalizes_separators_and_case() {
        assert_eq!(CourseCode::parse("col-100").unwrap().as_str(), "COL100");
        assert_eq!(CourseCode::parse("ee 201").unwrap().as_str(), "EE201");
        assert_eq!(CourseCode::parse("MTL106").unwrap().as_str(), "MTL106");
    }

    #[test]
    fn parse_rejects_wrong_shapes() {
        assert!(CourseCode::parse("C100").is_none());
        assert!(CourseCode::parse("COLL100").is_none());
        assert!(CourseCode::parse("COL10").is_none());
        assert!(CourseCode::parse("COL1000").is_none());
        assert!(CourseCode::parse("").is_none());
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["col 106", "Ell-205", "HUL101", "  mtl - 100 "] {
            let once = CourseCode::normalize(raw);
            assert_eq!(CourseCode::normalize(&once), once);
        }
    }

    #[test]
    fn record_reads_historical_aliases() {
        let p = payload(json!({
            "course_code": "COL106",
            "course_name": "Data Structures and Algorithms",
            "instructor_mail": "prof@cse.iitd.ac.in",
            "credits": 5,
            "units": "3-0-4",
            "prereqs": ["COL100"],
            "lec_time": "M Th 9:30-11:00",
            "study_material": ["https://example.org/dsa"],
            "vacancy": "120"
        }));
        let record = CourseRecord::from_payload(&p, None).unwrap();
        assert_eq!(record.code.as_str(), "COL106");
        assert_eq!(record.name.as_deref(), Some("Data Structures and Algorithms"));
        assert_eq!(record.instructor_email.as_deref(), Some("prof@cse.iitd.ac.in"));
        assert_eq!(record.credits.as_deref(), Some("5"));
        assert_eq!(record.credit_structure.as_deref(), Some("3-0-4"));
        assert_eq!(record.prerequisites, vec!["COL100"]);
        assert_eq!(record.lecture_time.as_deref(), Some("M Th 9:30-11:00"));
        assert_eq!(record.study_materials.len(), 1);
        assert_eq!(record.vacancy.as_deref(), Some("120"));
    }

    #[test]
    fn empty_list_alias_falls_through_to_populated_one() {
        // The catalogue scraper wrote both keys for the last course it saw.
        let p = payload(json!({
            "code": "ELL205",
            "prereqs": [],
            "prerequisites": ["ELL101", " "]
        }));
        let record = CourseRecord::from_payload(&p, None).unwrap();
        assert_eq!(record.prerequisites, vec!["ELL101"]);
    }

    #[test]
    fn comma_separated_string_becomes_list() {
        let p = payload(json!({"code": "MTL100", "overlaps": "MTL101, MTL102"}));
        let record = CourseRecord::from_payload(&p, None).unwrap();
        assert_eq!(record.overlaps, vec!["MTL101", "MTL102"]);
    }

    #[test]
    fn fallback_code_used_when_payload_has_none() {
        let code = CourseCode::parse("HUL261").unwrap();
        let p = payload(json!({"name": "Introduction to Psychology"}));
        let record = CourseRecord::from_payload(&p, Some(&code)).unwrap();
        assert_eq!(record.code, code);
    }

    #[test]
    fn empty_payload_is_not_a_record() {
        let code = CourseCode::parse("HUL261").unwrap();
        assert!(CourseRecord::from_payload(&PayloadMap::new(), Some(&code)).is_none());
        let p = payload(json!({"name": "No code anywhere"}));
        assert!(CourseRecord::from_payload(&p, None).is_none());
    }
}
