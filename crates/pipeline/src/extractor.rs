//! Course code recognition in free text.

use campanion_core::CourseCode;
use regex_lite::Regex;

/// 2–3 letters, an optional space or hyphen, 3 digits.
const COURSE_CODE_PATTERN: &str = r"(?i)([a-z]{2,3})[ -]?([0-9]{3})";

/// Pulls course codes like "COL100", "col 106" or "ELL-205" out of a query.
pub struct CourseCodeExtractor {
    pattern: Regex,
}

impl CourseCodeExtractor {
    pub fn new() -> Result<Self, regex_lite::Error> {
        Ok(Self {
            pattern: Regex::new(COURSE_CODE_PATTERN)?,
        })
    }

    /// Distinct normalized codes in order of first appearance.
    ///
    /// A match may be followed by letters ("COL100s") but not by a fourth
    /// digit, and may not start in the middle of a word.
    pub fn extract(&self, text: &str) -> Vec<CourseCode> {
        let mut codes: Vec<CourseCode> = Vec::new();
        for caps in self.pattern.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let before = text[..whole.start()].chars().next_back();
            let after = text[whole.end()..].chars().next();
            if before.is_some_and(|c| c.is_ascii_alphabetic())
                || after.is_some_and(|c| c.is_ascii_digit())
            {
                continue;
            }
            let raw = format!("{}{}", &caps[1], &caps[2]);
            if let Some(code) = CourseCode::parse(&raw) {
                if !codes.contains(&code) {
                    codes.push(code);
                }
            }
        }
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<String> {
        CourseCodeExtractor::new()
            .unwrap()
            .extract(text)
            .into_iter()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn extracts_codes_in_order() {
        assert_eq!(
            extract("What are the prereqs for COL100 and COL106?"),
            vec!["COL100", "COL106"]
        );
    }

    #[test]
    fn normalizes_separators_and_case() {
        assert_eq!(extract("is col 106 harder than ell-205?"), vec!["COL106", "ELL205"]);
        assert_eq!(extract("EE201 vs ee 201"), vec!["EE201"]);
    }

    #[test]
    fn ignores_codes_inside_longer_runs() {
        assert!(extract("ABCD1234 and COL1000 and xCOL100").is_empty());
        assert!(extract("order #COL1006").is_empty());
    }

    #[test]
    fn trailing_letters_and_punctuation_allowed() {
        assert_eq!(extract("Is COL100s workload heavy?"), vec!["COL100"]);
        assert_eq!(extract("COL106's prereqs"), vec!["COL106"]);
        assert_eq!(extract("_col100 and (MTL100)"), vec!["COL100", "MTL100"]);
        assert_eq!(extract("COL100COL106"), vec!["COL100", "COL106"]);
    }

    #[test]
    fn words_ending_near_numbers_are_not_codes() {
        assert!(extract("within 100 students").is_empty());
    }

    #[test]
    fn empty_and_codeless_input() {
        assert!(extract("").is_empty());
        assert!(extract("how do I make friends in the hostel?").is_empty());
    }

    #[test]
    fn extraction_is_stable_under_renormalization() {
        let first = extract("mtl-100, Col 106 and hul101");
        let again = extract(&first.join(" "));
        assert_eq!(first, again);
    }
}
