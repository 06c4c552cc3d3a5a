use serde::{Deserialize, Serialize};

/// A learning recommendation for one missing skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningResource {
    pub skill: String,
    pub resource: String,
}

/// The match report returned to callers. Produced once per (resume_id, job_id)
/// pair and memoized; the LLM path and the fallback scorer both emit this shape.
///
/// Invariants: `match_score` is in 0–100 and
/// `matching_skills ∩ missing_skills = ∅`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_score: u32,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub ats_suggestions: Vec<String>,
    pub learning_resources: Vec<LearningResource>,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub resume_id: String,
    pub job_id: String,
}

/// Upload acknowledgement. The id field is named `job_id` for both document
/// kinds; the original API shipped that way and clients depend on it.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub job_id: String,
    pub message: String,
}
