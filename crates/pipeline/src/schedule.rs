//! Day-abbreviation expansion for course timings.
//!
//! The catalogue writes schedules like `"M Th 8:00-9:30"`. Before they go
//! into a prompt, the abbreviations are spelled out so the model does not
//! have to guess whether "T" means Tuesday or Thursday.

use campanion_config::AbbreviationMode;

/// Longest abbreviations first so "Th" wins over "T".
const DAYS: &[(&str, &str)] = &[
    ("Th", "Thursday"),
    ("Tu", "Tuesday"),
    ("Sa", "Saturday"),
    ("Su", "Sunday"),
    ("M", "Monday"),
    ("T", "Tuesday"),
    ("W", "Wednesday"),
    ("F", "Friday"),
    ("S", "Saturday"),
];

/// Spell out day abbreviations in a schedule string.
///
/// Matching is case-sensitive and happens in a single left-to-right pass,
/// so replacements are never themselves expanded again.
///
/// In [`AbbreviationMode::Token`] only whole alphanumeric tokens are
/// replaced (`"Th"` → `"Thursday"`, `"Thermo"` untouched). In
/// [`AbbreviationMode::Substring`] any occurrence is replaced, which turns
/// `"Thermo"` into `"Thursdayermo"`.
pub fn expand_days(schedule: &str, mode: AbbreviationMode) -> String {
    match mode {
        AbbreviationMode::Token => expand_tokens(schedule),
        AbbreviationMode::Substring => expand_substrings(schedule),
    }
}

fn lookup(token: &str) -> Option<&'static str> {
    DAYS.iter().find(|(abbr, _)| *abbr == token).map(|(_, day)| *day)
}

fn expand_tokens(schedule: &str) -> String {
    let mut out = String::with_capacity(schedule.len() * 2);
    let mut token = String::new();

    for c in schedule.chars() {
        if c.is_alphanumeric() {
            token.push(c);
            continue;
        }
        out.push_str(lookup(&token).unwrap_or(&token));
        token.clear();
        out.push(c);
    }
    out.push_str(lookup(&token).unwrap_or(&token));
    out
}

fn expand_substrings(schedule: &str) -> String {
    let mut out = String::with_capacity(schedule.len() * 2);
    let mut rest = schedule;

    'outer: while let Some(c) = rest.chars().next() {
        for (abbr, day) in DAYS {
            if let Some(tail) = rest.strip_prefix(abbr) {
                out.push_str(day);
                rest = tail;
                continue 'outer;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_common_schedules() {
        assert_eq!(
            expand_days("M Th 8:00-9:30", AbbreviationMode::Token),
            "Monday Thursday 8:00-9:30"
        );
        assert_eq!(
            expand_days("Tu,F 9:30-11:00", AbbreviationMode::Token),
            "Tuesday,Friday 9:30-11:00"
        );
        assert_eq!(expand_days("W", AbbreviationMode::Substring), "Wednesday");
    }

    #[test]
    fn longest_abbreviation_wins() {
        for mode in [AbbreviationMode::Token, AbbreviationMode::Substring] {
            assert_eq!(expand_days("Th", mode), "Thursday");
            assert_eq!(expand_days("Su Sa S", mode), "Sunday Saturday Saturday");
        }
    }

    #[test]
    fn token_mode_leaves_words_alone() {
        assert_eq!(
            expand_days("Thermo lab, Th", AbbreviationMode::Token),
            "Thermo lab, Thursday"
        );
        assert_eq!(expand_days("MTW", AbbreviationMode::Token), "MTW");
    }

    #[test]
    fn substring_mode_rewrites_inside_words() {
        assert_eq!(
            expand_days("Thermo", AbbreviationMode::Substring),
            "Thursdayermo"
        );
        assert_eq!(
            expand_days("MTW", AbbreviationMode::Substring),
            "MondayTuesdayWednesday"
        );
    }

    #[test]
    fn replacements_are_not_re_expanded() {
        // "Saturday" contains "S", "Sa", "T"; a second pass would mangle it.
        assert_eq!(expand_days("S", AbbreviationMode::Substring), "Saturday");
        assert_eq!(
            expand_days("Thursday", AbbreviationMode::Token),
            "Thursday"
        );
    }

    #[test]
    fn case_sensitive() {
        assert_eq!(expand_days("th m", AbbreviationMode::Token), "th m");
        assert_eq!(expand_days("th m", AbbreviationMode::Substring), "th m");
    }

    #[test]
    fn empty_and_non_ascii() {
        assert_eq!(expand_days("", AbbreviationMode::Token), "");
        assert_eq!(expand_days("M – ज़ F", AbbreviationMode::Substring), "Monday – ज़ Friday");
        assert_eq!(expand_days("M – F", AbbreviationMode::Token), "Monday – Friday");
    }
}
