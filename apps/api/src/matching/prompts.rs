// LLM prompt constants for the matching module.
//
// The evaluation rules below are a contract shared with the response parser
// and the fallback scorer: both paths must stay interchangeable to callers,
// so the rubric weights and the below-50 cap are fixed here verbatim.

/// Match evaluation prompt template. Replace `{job_text}` and
/// `{resume_context}` before sending.
pub const MATCH_PROMPT_TEMPLATE: &str = r#"You are an applicant tracking system evaluating a resume against a job description.

JOB DESCRIPTION:
{job_text}

RELEVANT RESUME EXCERPTS:
{resume_context}

EVALUATION RULES:
1. Use ONLY the literal text above. Do NOT use outside knowledge and do NOT infer skills that are not stated.
2. A skill counts as present only if its exact term, or an unambiguous synonym, appears in the resume excerpts.
3. Score with these fixed weights: skill overlap 50%, experience and level alignment 25%, tool specificity 15%, ATS structural clarity 10%.
4. If more than half of the skills the job requires are absent from the resume, match_score MUST be below 50.
5. Do NOT fabricate URLs. Recommend only real, well-known learning resources (e.g. https://www.youtube.com/...).

Output ONLY a valid JSON object with EXACTLY these keys and no others, and no surrounding prose:
{
  "match_score": 0,
  "matching_skills": [],
  "missing_skills": [],
  "ats_suggestions": [],
  "learning_resources": [{"skill": "...", "resource": "https://..."}]
}"#;

/// Builds the match prompt from job text and retrieved resume context.
/// Pure and deterministic: same inputs, same prompt.
pub fn build_match_prompt(job_text: &str, resume_context: &str) -> String {
    MATCH_PROMPT_TEMPLATE
        .replace("{job_text}", job_text)
        .replace("{resume_context}", resume_context)
}
