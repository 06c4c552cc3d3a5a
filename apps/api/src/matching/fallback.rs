//! Deterministic keyword-based scorer used whenever the judge path fails
//! end-to-end. No external dependencies; must never fail for well-formed
//! string inputs, and always honors the same contract as the LLM prompt
//! (score in 0–100, below 50 when more than half the required skills are
//! absent, disjoint skill lists).

use crate::models::report::{LearningResource, MatchResult};

/// Canonical skill name → lowercase synonym substrings. Declaration order is
/// the canonical order: detection results and the "first 4 missing skills"
/// selection both follow it, which keeps the fallback fully reproducible.
const SKILL_DICTIONARY: &[(&str, &[&str])] = &[
    // Languages
    ("Python", &["python"]),
    ("JavaScript", &["javascript"]),
    ("TypeScript", &["typescript"]),
    ("Java", &["java"]), // also fires on "javascript"; known substring quirk
    ("C++", &["c++"]),
    ("Go", &["golang"]),
    ("Rust", &["rust"]),
    ("SQL", &["sql"]),
    // Frameworks
    ("React", &["react"]),
    ("Angular", &["angular"]),
    ("Vue.js", &["vue"]),
    ("Node.js", &["node.js", "nodejs", "node js"]),
    ("Django", &["django"]),
    ("Flask", &["flask"]),
    ("FastAPI", &["fastapi"]),
    ("Spring", &["spring"]),
    // Infrastructure
    ("Docker", &["docker"]),
    ("Kubernetes", &["kubernetes", "k8s"]),
    ("AWS", &["aws", "amazon web services"]),
    ("Azure", &["azure"]),
    ("GCP", &["gcp", "google cloud"]),
    ("Terraform", &["terraform"]),
    ("CI/CD", &["ci/cd", "jenkins", "github actions"]),
    ("Linux", &["linux"]),
    // Data stores
    ("PostgreSQL", &["postgres"]),
    ("MongoDB", &["mongodb", "mongo"]),
    ("Redis", &["redis"]),
    // Generic categories
    (
        "Machine Learning",
        &["machine learning", "deep learning", "tensorflow", "pytorch"],
    ),
    (
        "API Development",
        &["api development", "rest api", "restful api", "graphql"],
    ),
];

const MAX_LEARNING_RESOURCES: usize = 4;

/// Scores a resume against a job description by skill-keyword overlap.
/// Pure and deterministic: same inputs always yield the same result.
pub fn score_fallback(resume_text: &str, job_text: &str) -> MatchResult {
    let resume = resume_text.to_lowercase();
    let job = job_text.to_lowercase();

    let resume_skills = detect_skills(&resume);
    let job_skills = detect_skills(&job);

    let matching_skills: Vec<String> = job_skills
        .iter()
        .filter(|s| resume_skills.contains(s))
        .cloned()
        .collect();
    let missing_skills: Vec<String> = job_skills
        .iter()
        .filter(|s| !resume_skills.contains(s))
        .cloned()
        .collect();

    let raw_percentage = if job_skills.is_empty() {
        0.0
    } else {
        100.0 * matching_skills.len() as f64 / job_skills.len() as f64
    };

    // More than half the required skills missing caps the score below 50,
    // deterministically mirroring rule 4 of the LLM prompt.
    let capped = if missing_skills.len() * 2 > job_skills.len() {
        raw_percentage.min(49.0)
    } else {
        raw_percentage
    };
    let match_score = capped.round() as u32;

    let ats_suggestions = build_suggestions(&missing_skills);
    let learning_resources = missing_skills
        .iter()
        .take(MAX_LEARNING_RESOURCES)
        .map(|skill| LearningResource {
            skill: skill.clone(),
            resource: tutorial_search_url(skill),
        })
        .collect();

    MatchResult {
        match_score,
        matching_skills,
        missing_skills,
        ats_suggestions,
        learning_resources,
    }
}

/// Returns canonical names of all dictionary skills whose synonyms appear in
/// the lowercased text, in dictionary order.
fn detect_skills(text_lower: &str) -> Vec<String> {
    SKILL_DICTIONARY
        .iter()
        .filter(|(_, synonyms)| synonyms.iter().any(|s| text_lower.contains(s)))
        .map(|(name, _)| name.to_string())
        .collect()
}

fn build_suggestions(missing: &[String]) -> Vec<String> {
    let mut suggestions = Vec::new();

    if missing.len() > 3 {
        suggestions.push(format!(
            "Prioritize gaining experience with the most critical missing skills: {}.",
            missing[..3].join(", ")
        ));
    } else if !missing.is_empty() {
        suggestions.push(format!(
            "Incorporate the missing skills into your resume where you have real experience: {}.",
            missing.join(", ")
        ));
    } else {
        suggestions.push(
            "Your resume already covers every skill detected in the job description.".to_string(),
        );
    }

    if !missing.is_empty() {
        suggestions.push(
            "Mirror the job description's exact terminology for skills and tools so automated screens can match them."
                .to_string(),
        );
        suggestions.push(
            "Quantify achievements with concrete numbers to strengthen ATS ranking.".to_string(),
        );
    }

    suggestions
}

/// Deterministically constructed tutorial-search URL. The fallback cannot
/// verify real course links, so it only ever emits this search form.
fn tutorial_search_url(skill: &str) -> String {
    let mut encoded = String::new();
    for ch in skill.to_lowercase().chars() {
        match ch {
            ' ' => encoded.push('+'),
            '+' => encoded.push_str("%2B"),
            '#' => encoded.push_str("%23"),
            '/' => encoded.push_str("%2F"),
            _ => encoded.push(ch),
        }
    }
    format!("https://www.youtube.com/results?search_query={encoded}+tutorial")
}
