//! AI review: optional free-text feedback layered on top of the deterministic score.
//!
//! `AppState` holds an `Option<Arc<dyn CvReviewer>>`; it is `None` when no
//! API key is configured, in which case reviews return the score alone.

use async_trait::async_trait;

use crate::cv::prompts::{build_review_prompt, REVIEW_ROLE};
use crate::cv::scoring::ScoreResult;
use crate::errors::AppError;
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::LlmClient;
use crate::models::cv::CvDocument;

#[async_trait]
pub trait CvReviewer: Send + Sync {
    async fn review(&self, cv: &CvDocument, score: &ScoreResult) -> Result<String, AppError>;

    /// Backend name reported to callers.
    fn backend(&self) -> &'static str;
}

pub struct LlmCvReviewer {
    llm: LlmClient,
}

impl LlmCvReviewer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl CvReviewer for LlmCvReviewer {
    async fn review(&self, cv: &CvDocument, score: &ScoreResult) -> Result<String, AppError> {
        let system = system_prompt(REVIEW_ROLE);
        let prompt = build_review_prompt(cv, score);
        self.llm
            .complete(&system, &prompt)
            .await
            .map_err(|e| AppError::Llm(format!("CV review call failed: {e}")))
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}
