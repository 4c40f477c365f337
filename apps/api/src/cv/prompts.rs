use crate::cv::scoring::ScoreResult;
use crate::models::cv::CvDocument;

pub const REVIEW_ROLE: &str = "You are an experienced careers coach reviewing a CV for a \
    job seeker. Give specific, encouraging feedback the candidate can act on today. \
    Focus on the summary, the wording of experience bullets and how skills are presented. \
    Keep the whole reply under 250 words.";

/// Builds the user message for an AI review: the CV as JSON plus the
/// deterministic score and fixes, so the model does not contradict them.
pub fn build_review_prompt(cv: &CvDocument, score: &ScoreResult) -> String {
    let cv_json = serde_json::to_string_pretty(cv).unwrap_or_else(|_| "{}".to_string());

    let fixes = if score.fixes.is_empty() {
        "- none".to_string()
    } else {
        score
            .fixes
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Here is the candidate's CV:\n\n{cv_json}\n\n\
         Automated score: {score}/100 ({level:?}).\n\
         Automated suggestions already shown to the candidate:\n{fixes}\n\n\
         Add feedback that goes beyond these suggestions.",
        score = score.score,
        level = score.level,
    )
}
