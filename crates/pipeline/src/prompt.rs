//! Rendering a [`QueryContext`] into chat messages.

use campanion_core::{History, Message};
use std::fmt::Write;
use crate::assembler::{ContextItem, CourseSummary, QueryContext};

/// Persona and style instructions used unless configuration overrides them.
pub const DEFAULT_PERSONA: &str = "You are Campanion, a friendly campus companion for students. \
Answer questions about courses, interview experiences, campus culture and social life using \
the context you are given. Be clear and concise, and say so when the context does not cover \
the question instead of guessing. Keep course information separate from study materials, and \
when study materials are provided, list them explicitly as learning resources with their links.";

const MATERIALS_NOTE: &str =
    "Note: If study materials are available, make sure to list them explicitly in your response as learning resources.";

pub struct PromptRenderer {
    persona: String,
    history_turns: usize,
}

impl PromptRenderer {
    pub fn new(persona: Option<String>, history_turns: usize) -> Self {
        Self {
            persona: persona.unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
            history_turns,
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// System persona, then the recent history, then the user turn carrying
    /// the context and the question.
    pub fn render(&self, context: &QueryContext, history: &History) -> Vec<Message> {
        let mut messages = vec![Message::system(&self.persona)];
        messages.extend(history.recent(self.history_turns).iter().cloned());
        messages.push(Message::user(render_context(context)));
        messages
    }
}

/// The user turn: labeled context sections followed by the question.
pub fn render_context(context: &QueryContext) -> String {
    let mut out = String::new();

    if !context.course_info.is_empty() {
        out.push_str("## Course Information\n");
        for course in &context.course_info {
            write_course(&mut out, course);
        }
        out.push('\n');
    }

    if !context.invalid_courses.is_empty() {
        let codes: Vec<&str> = context.invalid_courses.iter().map(|c| c.as_str()).collect();
        let _ = writeln!(
            out,
            "## Unknown Course Codes\nThese codes are not in the course catalogue: {}\n",
            codes.join(", ")
        );
    }

    if !context.unavailable_courses.is_empty() {
        let codes: Vec<&str> = context.unavailable_courses.iter().map(|c| c.as_str()).collect();
        let _ = writeln!(
            out,
            "## Unchecked Course Codes\nThe catalogue could not be reached for: {}\n",
            codes.join(", ")
        );
    }

    for collection in context.results.iter().filter(|r| !r.hits.is_empty()) {
        let _ = writeln!(out, "## Retrieved from {}", collection.collection);
        for hit in &collection.hits {
            match &hit.item {
                ContextItem::Course(course) => write_course(&mut out, course),
                ContextItem::Interview(chunk) => {
                    let mut header = chunk.interviewee.clone();
                    if let Some(company) = &chunk.company {
                        let _ = write!(header, " at {company}");
                    }
                    if let Some(role) = &chunk.role {
                        let _ = write!(header, " ({role})");
                    }
                    let _ = writeln!(out, "- Interview experience, {header}: {}", chunk.content);
                }
                ContextItem::Text(chunk) => match &chunk.source {
                    Some(source) => {
                        let _ = writeln!(out, "- [{source}] {}", chunk.text);
                    }
                    None => {
                        let _ = writeln!(out, "- {}", chunk.text);
                    }
                },
                ContextItem::Other(map) => {
                    let raw = serde_json::to_string(map).unwrap_or_default();
                    let _ = writeln!(out, "- {raw}");
                }
            }
        }
        out.push('\n');
    }

    if !context.study_materials.is_empty() {
        out.push_str("## Study Materials\n");
        for material in &context.study_materials {
            match &material.course_name {
                Some(name) => {
                    let _ = writeln!(out, "- {} ({name}): {}", material.course_code, material.link);
                }
                None => {
                    let _ = writeln!(out, "- {}: {}", material.course_code, material.link);
                }
            }
        }
        out.push('\n');
    }

    if out.is_empty() {
        out.push_str("No additional context was found for this question.\n\n");
    }

    let _ = write!(out, "Query: {}\n\n{MATERIALS_NOTE}", context.query);
    out
}

fn write_course(out: &mut String, course: &CourseSummary) {
    let _ = writeln!(out, "### {}", course.code);
    for field in &course.fields {
        let _ = writeln!(out, "- {}: {}", field.label, field.value);
    }
}
