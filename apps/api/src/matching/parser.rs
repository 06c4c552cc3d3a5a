//! Tolerant parsing of raw judge output into a `MatchResult`.
//!
//! Attempts, in order: direct decode of the (fence-stripped) text, then a
//! decode of the first balanced top-level JSON object found in it. Anything
//! else is `Unparseable`, never an error, so the orchestrator can branch to
//! the fallback scorer explicitly.

use serde::Deserialize;

use crate::models::report::{LearningResource, MatchResult};

/// Tagged result of a parse attempt. The orchestrator branches on this instead
/// of relying on error control flow.
#[derive(Debug)]
pub enum ParsedResponse {
    Parsed(MatchResult),
    Unparseable,
}

/// Wire shape the judge is instructed to produce. Missing arrays default to
/// empty so a sparse-but-scored response still parses.
#[derive(Debug, Deserialize)]
struct MatchResultWire {
    match_score: f64,
    #[serde(default)]
    matching_skills: Vec<String>,
    #[serde(default)]
    missing_skills: Vec<String>,
    #[serde(default)]
    ats_suggestions: Vec<String>,
    #[serde(default)]
    learning_resources: Vec<serde_json::Value>,
}

pub fn parse_match_response(raw: &str) -> ParsedResponse {
    let text = strip_json_fences(raw);

    if let Ok(wire) = serde_json::from_str::<MatchResultWire>(text) {
        return ParsedResponse::Parsed(normalize(wire));
    }

    if let Some(candidate) = first_balanced_object(text) {
        if let Ok(wire) = serde_json::from_str::<MatchResultWire>(candidate) {
            return ParsedResponse::Parsed(normalize(wire));
        }
    }

    ParsedResponse::Unparseable
}

/// Enforces the result invariants regardless of what the judge produced:
/// integer score clamped to 0–100, deduplicated skill lists, and
/// `missing_skills` disjoint from `matching_skills`.
fn normalize(wire: MatchResultWire) -> MatchResult {
    let match_score = if wire.match_score.is_finite() {
        wire.match_score.round().clamp(0.0, 100.0) as u32
    } else {
        0
    };

    let matching_skills = dedup_preserving_order(wire.matching_skills);
    let missing_skills: Vec<String> = dedup_preserving_order(wire.missing_skills)
        .into_iter()
        .filter(|s| !matching_skills.contains(s))
        .collect();

    let learning_resources = wire
        .learning_resources
        .into_iter()
        .filter_map(|entry| {
            let skill = entry.get("skill")?.as_str()?.to_string();
            let resource = ["resource", "url", "link"]
                .iter()
                .find_map(|k| entry.get(k).and_then(|v| v.as_str()))
                .unwrap_or_default()
                .to_string();
            Some(LearningResource { skill, resource })
        })
        .collect();

    MatchResult {
        match_score,
        matching_skills,
        missing_skills,
        ats_suggestions: wire.ats_suggestions,
        learning_resources,
    }
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

/// Strips ```json ... ``` or ``` ... ``` code fences from judge output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let stripped = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match stripped {
        Some(inner) => inner
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or_else(|| inner.trim_start()),
        None => text,
    }
}

/// Finds the first balanced top-level `{...}` substring, tracking string
/// literals and escapes so braces inside values do not confuse the depth count.
fn first_balanced_object(text: &str) -> Option<&str> {
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start?..i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{
        "match_score": 72,
        "matching_skills": ["Python", "Docker"],
        "missing_skills": ["Kubernetes"],
        "ats_suggestions": ["Add quantifiable achievements"],
        "learning_resources": [{"skill": "Kubernetes", "resource": "https://kubernetes.io/docs/tutorials/"}]
    }"#;

    fn expect_parsed(raw: &str) -> MatchResult {
        match parse_match_response(raw) {
            ParsedResponse::Parsed(result) => result,
            ParsedResponse::Unparseable => panic!("expected Parsed for: {raw}"),
        }
    }

    #[test]
    fn test_well_formed_json_round_trips_exactly() {
        let result = expect_parsed(WELL_FORMED);
        assert_eq!(result.match_score, 72);
        assert_eq!(result.matching_skills, vec!["Python", "Docker"]);
        assert_eq!(result.missing_skills, vec!["Kubernetes"]);
        assert_eq!(result.ats_suggestions, vec!["Add quantifiable achievements"]);
        assert_eq!(result.learning_resources.len(), 1);
        assert_eq!(result.learning_resources[0].skill, "Kubernetes");
    }

    #[test]
    fn test_markdown_fenced_json_parses() {
        let raw = format!("```json\n{WELL_FORMED}\n```");
        assert_eq!(expect_parsed(&raw).match_score, 72);
    }

    #[test]
    fn test_json_wrapped_in_prose_parses_via_balanced_scan() {
        let raw = format!("Sure! Here is the evaluation you asked for:\n{WELL_FORMED}\nLet me know if you need anything else.");
        assert_eq!(expect_parsed(&raw).match_score, 72);
    }

    #[test]
    fn test_braces_inside_string_values_do_not_break_the_scan() {
        let raw = r#"Result: {"match_score": 50, "matching_skills": ["C++ {templates}"], "missing_skills": [], "ats_suggestions": [], "learning_resources": []} done"#;
        let result = expect_parsed(raw);
        assert_eq!(result.match_score, 50);
        assert_eq!(result.matching_skills, vec!["C++ {templates}"]);
    }

    #[test]
    fn test_garbage_is_unparseable() {
        assert!(matches!(
            parse_match_response("I cannot evaluate this resume, sorry."),
            ParsedResponse::Unparseable
        ));
        assert!(matches!(parse_match_response(""), ParsedResponse::Unparseable));
        assert!(matches!(
            parse_match_response("{ broken json"),
            ParsedResponse::Unparseable
        ));
    }

    #[test]
    fn test_fractional_score_rounds_to_integer() {
        let raw = r#"{"match_score": 66.7, "matching_skills": [], "missing_skills": [], "ats_suggestions": [], "learning_resources": []}"#;
        assert_eq!(expect_parsed(raw).match_score, 67);
    }

    #[test]
    fn test_out_of_range_scores_clamp() {
        let high = r#"{"match_score": 250, "matching_skills": [], "missing_skills": [], "ats_suggestions": [], "learning_resources": []}"#;
        assert_eq!(expect_parsed(high).match_score, 100);

        let low = r#"{"match_score": -3, "matching_skills": [], "missing_skills": [], "ats_suggestions": [], "learning_resources": []}"#;
        assert_eq!(expect_parsed(low).match_score, 0);
    }

    #[test]
    fn test_skill_appearing_in_both_lists_stays_matching_only() {
        let raw = r#"{"match_score": 60, "matching_skills": ["Python"], "missing_skills": ["Python", "Docker"], "ats_suggestions": [], "learning_resources": []}"#;
        let result = expect_parsed(raw);
        assert_eq!(result.matching_skills, vec!["Python"]);
        assert_eq!(result.missing_skills, vec!["Docker"]);
    }

    #[test]
    fn test_missing_array_keys_default_to_empty() {
        let raw = r#"{"match_score": 40}"#;
        let result = expect_parsed(raw);
        assert!(result.matching_skills.is_empty());
        assert!(result.learning_resources.is_empty());
    }

    #[test]
    fn test_learning_resource_url_field_variants_are_accepted() {
        let raw = r#"{"match_score": 55, "learning_resources": [
            {"skill": "Docker", "url": "https://docs.docker.com/get-started/"},
            {"skill": "AWS", "resource": "https://aws.amazon.com/training/"},
            {"no_skill": true}
        ]}"#;
        let result = expect_parsed(raw);
        assert_eq!(result.learning_resources.len(), 2);
        assert_eq!(
            result.learning_resources[0].resource,
            "https://docs.docker.com/get-started/"
        );
    }

    #[test]
    fn test_score_as_string_is_unparseable_not_panicking() {
        let raw = r#"{"match_score": "high"}"#;
        assert!(matches!(parse_match_response(raw), ParsedResponse::Unparseable));
    }
}
