//! `campanion route`: Show how a query would be routed.

use campanion_pipeline::{Chatbot, RouteReport, ScoreSource};
use std::path::Path;

pub async fn run(
    explicit: Option<&Path>,
    query: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(explicit)?;
    let chatbot = Chatbot::from_config(&config)?;
    let report = chatbot.route(query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report));
    }

    Ok(())
}

fn render(report: &RouteReport) -> String {
    let routing = &report.routing;
    let codes: Vec<&str> = report.codes.iter().map(|c| c.as_str()).collect();

    let mut out = String::new();
    out.push_str(&format!("  Course codes:     {}\n", or_none(&codes.join(", "))));
    out.push_str(&format!(
        "  Keyword matches:  {}\n",
        or_none(&routing.keyword_matches.join(", "))
    ));

    let source = match &routing.source {
        ScoreSource::Model => "model".to_string(),
        ScoreSource::Disabled => "disabled".to_string(),
        ScoreSource::Default { reason } => format!("default ({reason})"),
    };
    out.push_str(&format!("  Scores ({source}):\n"));
    for score in &routing.scores {
        out.push_str(&format!("    {:<12} {:.2}\n", score.collection, score.score));
    }

    out.push_str(&format!("  Collections:      {}", routing.collections.join(", ")));
    if routing.fell_back {
        out.push_str("  (nothing matched, searching all)");
    }
    out.push('\n');
    out
}

fn or_none(s: &str) -> &str {
    if s.is_empty() { "(none)" } else { s }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campanion_core::CourseCode;
    use campanion_pipeline::Routing;
    use campanion_pipeline::classifier::CollectionScore;

    #[test]
    fn renders_routing_decision() {
        let report = RouteReport {
            codes: vec![CourseCode::parse("COL106").unwrap()],
            routing: Routing {
                collections: vec!["courses".into()],
                keyword_matches: vec!["courses".into()],
                scores: vec![
                    CollectionScore {
                        collection: "courses".into(),
                        score: 0.25,
                    },
                    CollectionScore {
                        collection: "social".into(),
                        score: 0.25,
                    },
                ],
                source: ScoreSource::Default {
                    reason: "Network error: refused".into(),
                },
                fell_back: false,
            },
        };

        let text = render(&report);
        assert!(text.contains("Course codes:     COL106"));
        assert!(text.contains("Scores (default (Network error: refused))"));
        assert!(text.contains("    courses      0.25"));
        assert!(text.ends_with("Collections:      courses\n"));
    }

    #[test]
    fn fallback_is_called_out() {
        let report = RouteReport {
            codes: vec![],
            routing: Routing {
                collections: vec!["courses".into(), "social".into()],
                keyword_matches: vec![],
                scores: vec![],
                source: ScoreSource::Disabled,
                fell_back: true,
            },
        };
        let text = render(&report);
        assert!(text.contains("Course codes:     (none)"));
        assert!(text.contains("searching all"));
    }
}
