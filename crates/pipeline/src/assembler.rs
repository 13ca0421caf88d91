//! Turning lookups and search hits into one structured context.

use campanion_config::AbbreviationMode;
use campanion_core::store::PayloadMap;
use campanion_core::{CourseCode, CourseRecord, InterviewChunk, Payload, TextChunk};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;
use crate::lookup::{CourseLookup, LookupOutcome};
use crate::retrieval::CollectionHits;
use crate::schedule::expand_days;
use crate::session::{CachedLookup, Session};

/// One labeled attribute of a course, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseField {
    pub label: &'static str,
    pub value: String,
}

/// A course reduced to the attributes worth showing, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    pub code: CourseCode,
    pub fields: Vec<CourseField>,
}

impl CourseSummary {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
    }
}

/// Keep the displayable attributes of a record, relabeled, with day
/// abbreviations in its timings spelled out.
pub fn process_course(record: &CourseRecord, mode: AbbreviationMode) -> CourseSummary {
    let timing = |t: &Option<String>| t.as_deref().map(|s| expand_days(s, mode));
    let joined = |items: &[String]| (!items.is_empty()).then(|| items.join(", "));

    let candidates = [
        ("Course Code", Some(record.code.to_string())),
        ("Course Name", record.name.clone()),
        ("Instructor", record.instructor.clone()),
        ("Instructor Email", record.instructor_email.clone()),
        ("Credits", record.credits.clone()),
        ("Credit Structure", record.credit_structure.clone()),
        ("Prerequisites", joined(&record.prerequisites)),
        ("Overlaps", joined(&record.overlaps)),
        ("Slot", record.slot.clone()),
        ("Lecture Timings", timing(&record.lecture_time)),
        ("Tutorial Timings", timing(&record.tutorial_time)),
        ("Practical Timings", timing(&record.practical_time)),
        ("Description", record.description.clone()),
        ("Vacancy", record.vacancy.clone()),
        ("Current Strength", record.current_strength.clone()),
    ];

    CourseSummary {
        code: record.code.clone(),
        fields: candidates
            .into_iter()
            .filter_map(|(label, value)| {
                value
                    .filter(|v| !v.trim().is_empty())
                    .map(|value| CourseField { label, value })
            })
            .collect(),
    }
}

/// A study resource attached to a course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyMaterial {
    pub course_code: CourseCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    pub link: String,
}

/// A retrieved item in display form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextItem {
    Course(CourseSummary),
    Interview(InterviewChunk),
    Text(TextChunk),
    Other(PayloadMap),
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextHit {
    pub id: String,
    pub score: f32,
    pub item: ContextItem,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionResults {
    pub collection: String,
    pub hits: Vec<ContextHit>,
}

/// Everything known about one query, before it is rendered into a prompt.
#[derive(Debug, Clone, Serialize)]
pub struct QueryContext {
    pub query: String,
    pub course_info: Vec<CourseSummary>,
    /// Well-formed codes the catalogue does not contain
    pub invalid_courses: Vec<CourseCode>,
    /// Codes that could not be checked because the store failed
    pub unavailable_courses: Vec<CourseCode>,
    pub results: Vec<CollectionResults>,
    pub relevant_collections: Vec<String>,
    pub failed_collections: Vec<String>,
    pub study_materials: Vec<StudyMaterial>,
}

impl QueryContext {
    /// Nothing the model could ground an answer on.
    pub fn is_empty(&self) -> bool {
        self.course_info.is_empty()
            && self.invalid_courses.is_empty()
            && self.unavailable_courses.is_empty()
            && self.results.iter().all(|r| r.hits.is_empty())
    }

    pub fn hit_count(&self) -> usize {
        self.results.iter().map(|r| r.hits.len()).sum()
    }
}

/// Outcome of resolving the codes mentioned in one query.
#[derive(Debug, Clone, Default)]
pub struct ResolvedCourses {
    pub found: Vec<CourseRecord>,
    pub invalid: Vec<CourseCode>,
    pub unavailable: Vec<CourseCode>,
}

impl ResolvedCourses {
    pub fn found_codes(&self) -> Vec<CourseCode> {
        self.found.iter().map(|r| r.code.clone()).collect()
    }
}

pub struct ContextAssembler {
    lookup: CourseLookup,
    mode: AbbreviationMode,
}

impl ContextAssembler {
    pub fn new(lookup: CourseLookup, mode: AbbreviationMode) -> Self {
        Self { lookup, mode }
    }

    /// Look up each code, consulting the session cache first.
    pub async fn resolve_courses(
        &self,
        codes: &[CourseCode],
        session: &mut Session,
    ) -> ResolvedCourses {
        let mut resolved = ResolvedCourses::default();

        for code in codes {
            let outcome = match session.cached_course(code) {
                Some(CachedLookup::Found(record)) => LookupOutcome::Found(record.clone()),
                Some(CachedLookup::NotFound) => LookupOutcome::NotFound,
                None => {
                    let outcome = self.lookup.lookup(code).await;
                    match &outcome {
                        LookupOutcome::Found(record) => session
                            .cache_course(code.clone(), CachedLookup::Found(record.clone())),
                        LookupOutcome::NotFound => {
                            session.cache_course(code.clone(), CachedLookup::NotFound)
                        }
                        LookupOutcome::Unavailable(_) => {}
                    }
                    outcome
                }
            };

            match outcome {
                LookupOutcome::Found(record) => resolved.found.push(record),
                LookupOutcome::NotFound => resolved.invalid.push(code.clone()),
                LookupOutcome::Unavailable(_) => resolved.unavailable.push(code.clone()),
            }
        }

        resolved
    }

    /// Combine resolved courses and search hits into a [`QueryContext`].
    ///
    /// A point appearing in several collections is kept only the first
    /// time; course hits for courses already resolved by code are dropped.
    pub fn assemble(
        &self,
        query: &str,
        courses: &ResolvedCourses,
        searched: Vec<CollectionHits>,
        relevant_collections: Vec<String>,
    ) -> QueryContext {
        let mut known: HashSet<CourseCode> = courses.found_codes().into_iter().collect();
        let mut seen_ids = HashSet::new();
        let mut study_materials = Vec::new();
        let mut failed_collections = Vec::new();

        for record in &courses.found {
            push_materials(&mut study_materials, record);
        }

        let mut results: Vec<CollectionResults> = Vec::new();
        for collection in searched {
            if collection.error.is_some() && !failed_collections.contains(&collection.collection) {
                failed_collections.push(collection.collection.clone());
            }

            let mut hits = Vec::new();
            for point in collection.hits {
                if !seen_ids.insert(point.id.clone()) {
                    continue;
                }
                let item = match Payload::from_map(&point.payload) {
                    Payload::Course(record) => {
                        if !known.insert(record.code.clone()) {
                            continue;
                        }
                        push_materials(&mut study_materials, &record);
                        ContextItem::Course(process_course(&record, self.mode))
                    }
                    Payload::Interview(chunk) => ContextItem::Interview(chunk),
                    Payload::Text(chunk) => ContextItem::Text(chunk),
                    Payload::Other(map) => ContextItem::Other(map),
                };
                hits.push(ContextHit {
                    id: point.id,
                    score: point.score,
                    item,
                });
            }

            // Linked interviews arrive as a second batch for the same collection.
            match results.iter_mut().find(|r| r.collection == collection.collection) {
                Some(existing) => existing.hits.extend(hits),
                None => results.push(CollectionResults {
                    collection: collection.collection,
                    hits,
                }),
            }
        }

        let context = QueryContext {
            query: query.to_string(),
            course_info: courses
                .found
                .iter()
                .map(|r| process_course(r, self.mode))
                .collect(),
            invalid_courses: courses.invalid.clone(),
            unavailable_courses: courses.unavailable.clone(),
            results,
            relevant_collections,
            failed_collections,
            study_materials,
        };

        debug!(
            courses = context.course_info.len(),
            hits = context.hit_count(),
            materials = context.study_materials.len(),
            "Context assembled"
        );
        context
    }
}

fn push_materials(materials: &mut Vec<StudyMaterial>, record: &CourseRecord) {
    for link in &record.study_materials {
        let duplicate = materials
            .iter()
            .any(|m| m.course_code == record.code && &m.link == link);
        if !duplicate {
            materials.push(StudyMaterial {
                course_code: record.code.clone(),
                course_name: record.name.clone(),
                link: link.clone(),
            });
        }
    }
}
