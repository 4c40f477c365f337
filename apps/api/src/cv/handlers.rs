use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cv::normalize::normalize_cv;
use crate::cv::scoring::{compute_score, ScoreLevel, ScoreResult};
use crate::cv::store::StoredCv;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// Compact score view shown on the dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub score: u32,
    pub level: ScoreLevel,
    pub top_fixes: Vec<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl ScoreSummary {
    fn new(result: ScoreResult, last_updated: Option<DateTime<Utc>>) -> Self {
        Self {
            score: result.score,
            level: result.level,
            top_fixes: result.fixes,
            last_updated,
        }
    }

    fn of(stored: &StoredCv) -> Self {
        Self::new(compute_score(&stored.cv), Some(stored.updated_at))
    }
}

#[derive(Serialize)]
pub struct CvResponse {
    pub cv: StoredCv,
    pub score: ScoreSummary,
}

#[derive(Deserialize)]
pub struct SaveCvRequest {
    pub user_id: Uuid,
    pub cv: Value,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub cv: Value,
    #[serde(default)]
    pub include_ai_feedback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiFeedbackStatus {
    NotRequested,
    Unavailable,
    Failed,
    Ok,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    #[serde(flatten)]
    pub result: ScoreResult,
    pub ai_feedback_status: AiFeedbackStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_feedback: Option<String>,
}

fn require_object(cv: &Value) -> Result<(), AppError> {
    if cv.is_object() {
        Ok(())
    } else {
        Err(AppError::Validation("'cv' must be a JSON object".to_string()))
    }
}

/// GET /api/v1/cv
pub async fn handle_get_cv(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CvResponse>, AppError> {
    let stored = state
        .store
        .latest(params.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No CV saved for user {}", params.user_id)))?;
    let score = ScoreSummary::of(&stored);
    Ok(Json(CvResponse { cv: stored, score }))
}

/// PUT /api/v1/cv
pub async fn handle_save_cv(
    State(state): State<AppState>,
    Json(req): Json<SaveCvRequest>,
) -> Result<Json<CvResponse>, AppError> {
    require_object(&req.cv)?;
    let cv = normalize_cv(&req.cv);
    let stored = state.store.save(req.user_id, &cv).await?;
    let score = ScoreSummary::of(&stored);
    info!(
        "CV for user {} scored {} ({:?})",
        req.user_id, score.score, score.level
    );
    Ok(Json(CvResponse { cv: stored, score }))
}

/// GET /api/v1/cv/score
pub async fn handle_get_score(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ScoreSummary>, AppError> {
    let stored = state
        .store
        .latest(params.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No CV saved for user {}", params.user_id)))?;
    Ok(Json(ScoreSummary::of(&stored)))
}

/// POST /api/v1/cv/review
/// Scores an unsaved CV. AI feedback is best effort and never changes the score.
pub async fn handle_review(
    State(state): State<AppState>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    require_object(&req.cv)?;
    let cv = normalize_cv(&req.cv);
    let result = compute_score(&cv);

    let (ai_feedback_status, ai_feedback) = match (&state.reviewer, req.include_ai_feedback) {
        (_, false) => (AiFeedbackStatus::NotRequested, None),
        (None, true) => (AiFeedbackStatus::Unavailable, None),
        (Some(reviewer), true) => match reviewer.review(&cv, &result).await {
            Ok(text) => (AiFeedbackStatus::Ok, Some(text)),
            Err(e) => {
                warn!("AI review via {} failed: {e}", reviewer.backend());
                (AiFeedbackStatus::Failed, None)
            }
        },
    };

    Ok(Json(ReviewResponse {
        result,
        ai_feedback_status,
        ai_feedback,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::cv::review::CvReviewer;
    use crate::cv::store::{CvStore, MemoryCvStore};
    use crate::models::cv::CvDocument;
    use crate::routes::build_router;

    struct CannedReviewer(Result<&'static str, &'static str>);

    #[async_trait]
    impl CvReviewer for CannedReviewer {
        async fn review(&self, _cv: &CvDocument, _score: &ScoreResult) -> Result<String, AppError> {
            self.0
                .map(str::to_string)
                .map_err(|e| AppError::Llm(e.to_string()))
        }

        fn backend(&self) -> &'static str {
            "canned"
        }
    }

    fn strong_cv() -> Value {
        json!({
            "personalInfo": { "fullName": "Amara Okafor", "email": "amara@example.com", "phone": "+44 7700 900123" },
            "summary": "Operations manager with eight years running regional distribution for a national grocer. \
                I led teams of forty pickers and drivers, rebuilt shift planning around real demand data, \
                and cut late deliveries by a third while keeping overtime flat. I enjoy coaching new \
                supervisors, fixing broken processes and working closely with suppliers to keep shelves full \
                through every peak season of the year.",
            "experience": [{
                "jobTitle": "Operations Manager",
                "company": "FreshWay Foods",
                "startDate": "2019-03",
                "isCurrent": true,
                "bullets": [
                    "Led a team of 40 warehouse staff across two shifts",
                    "Reduced late deliveries by 33% through demand-based rota planning",
                    "Negotiated new haulage contracts saving 120k per year"
                ]
            }],
            "education": [{ "degree": "BSc Logistics", "school": "Aston University", "year": "2015" }],
            "skills": ["Rota planning", "Forklift licence", "Supplier management", "Excel"],
            "languages": ["English", "Yoruba"],
            "certifications": [{ "name": "IOSH Managing Safely" }]
        })
    }

    fn app_with(store: Arc<MemoryCvStore>, reviewer: Option<Arc<dyn CvReviewer>>) -> axum::Router {
        build_router(AppState::for_tests(store).with_reviewer(reviewer))
    }

    async fn call(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_score_for_unknown_user_is_404() {
        let app = app_with(Arc::new(MemoryCvStore::new()), None);
        let uri = format!("/api/v1/cv/score?user_id={}", Uuid::new_v4());
        let (status, body) = call(app, get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_save_then_fetch_score() {
        let store = Arc::new(MemoryCvStore::new());
        let user = Uuid::new_v4();

        let (status, saved) = call(
            app_with(store.clone(), None),
            json_request("PUT", "/api/v1/cv", json!({ "user_id": user, "cv": strong_cv() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{saved}");
        assert_eq!(saved["cv"]["cv"]["personalInfo"]["fullName"], "Amara Okafor");

        let uri = format!("/api/v1/cv/score?user_id={user}");
        let (status, summary) = call(app_with(store, None), get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["score"], saved["score"]["score"]);
        assert_eq!(summary["level"], "Strong");
        assert!(summary["topFixes"].is_array());
        assert!(summary["lastUpdated"].is_string());
    }

    #[tokio::test]
    async fn test_get_cv_returns_document_and_summary() {
        let store = Arc::new(MemoryCvStore::new());
        let user = Uuid::new_v4();
        store
            .save(user, &normalize_cv(&json!({ "summary": "Just started" })))
            .await
            .unwrap();

        let (status, body) = call(
            app_with(store, None),
            get(&format!("/api/v1/cv?user_id={user}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cv"]["userId"], user.to_string());
        assert_eq!(body["score"]["level"], "Needs Improvement");
    }

    #[tokio::test]
    async fn test_save_rejects_non_object_cv() {
        let app = app_with(Arc::new(MemoryCvStore::new()), None);
        let (status, body) = call(
            app,
            json_request("PUT", "/api/v1/cv", json!({ "user_id": Uuid::new_v4(), "cv": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_review_of_gated_cv() {
        let app = app_with(Arc::new(MemoryCvStore::new()), None);
        let (status, body) = call(
            app,
            json_request(
                "POST",
                "/api/v1/cv/review",
                json!({ "cv": { "summary": "Hard worker", "skills": "Excel" } }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isGated"], true);
        assert!(body["score"].as_u64().unwrap() <= 15);
        assert!(body["gateMessage"].is_string());
        assert_eq!(body["aiFeedbackStatus"], "not_requested");
        assert!(body.get("aiFeedback").is_none());
    }

    #[tokio::test]
    async fn test_review_ai_feedback_unavailable_without_reviewer() {
        let app = app_with(Arc::new(MemoryCvStore::new()), None);
        let (_, body) = call(
            app,
            json_request(
                "POST",
                "/api/v1/cv/review",
                json!({ "cv": strong_cv(), "include_ai_feedback": true }),
            ),
        )
        .await;
        assert_eq!(body["aiFeedbackStatus"], "unavailable");
    }

    #[tokio::test]
    async fn test_review_includes_ai_feedback() {
        let reviewer: Arc<dyn CvReviewer> = Arc::new(CannedReviewer(Ok("Quantify the rota work.")));
        let app = app_with(Arc::new(MemoryCvStore::new()), Some(reviewer));
        let (status, body) = call(
            app,
            json_request(
                "POST",
                "/api/v1/cv/review",
                json!({ "cv": strong_cv(), "include_ai_feedback": true }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["aiFeedbackStatus"], "ok");
        assert_eq!(body["aiFeedback"], "Quantify the rota work.");
        assert_eq!(body["level"], "Strong");
    }

    #[tokio::test]
    async fn test_review_survives_ai_failure() {
        let reviewer: Arc<dyn CvReviewer> = Arc::new(CannedReviewer(Err("upstream 529")));
        let app = app_with(Arc::new(MemoryCvStore::new()), Some(reviewer));
        let (status, body) = call(
            app,
            json_request(
                "POST",
                "/api/v1/cv/review",
                json!({ "cv": strong_cv(), "include_ai_feedback": true }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["aiFeedbackStatus"], "failed");
        assert!(body["score"].is_u64());
    }
}
