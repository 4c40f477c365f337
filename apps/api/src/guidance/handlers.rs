use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, Utc};

use crate::cv::handlers::UserIdQuery;
use crate::cv::scoring::compute_score;
use crate::errors::AppError;
use crate::guidance::career_path::{career_paths, CareerInput, CareerPathReport};
use crate::guidance::next_action::{next_best_action, GuidanceInput, NextAction};
use crate::state::AppState;

/// GET /api/v1/guidance/next-action
pub async fn handle_next_action(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<NextAction>, AppError> {
    let stored = state.store.latest(params.user_id).await?;
    let applications = state.store.application_counts(params.user_id).await?;
    let score = stored.map(|s| compute_score(&s.cv));

    Ok(Json(next_best_action(&GuidanceInput {
        score: score.as_ref(),
        applications,
    })))
}

/// GET /api/v1/guidance/career-paths
pub async fn handle_career_paths(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CareerPathReport>, AppError> {
    let stored = state
        .store
        .latest(params.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No CV saved for user {}", params.user_id)))?;
    let score = compute_score(&stored.cv);

    Ok(Json(career_paths(&CareerInput {
        cv: &stored.cv,
        score: &score,
        as_of_year: Utc::now().year(),
    })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::cv::store::{CvStore, MemoryCvStore};
    use crate::models::cv::{CvDocument, ExperienceItem};
    use crate::models::rows::ApplicationCounts;
    use crate::routes::build_router;
    use crate::state::AppState;

    async fn next_action(store: Arc<MemoryCvStore>, user: Uuid) -> Value {
        let app = build_router(AppState::for_tests(store));
        let req = Request::builder()
            .uri(format!("/api/v1/guidance/next-action?user_id={user}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_new_user_is_told_to_create_a_cv() {
        let body = next_action(Arc::new(MemoryCvStore::new()), Uuid::new_v4()).await;
        assert_eq!(body["kind"], "CREATE_CV");
    }

    #[tokio::test]
    async fn test_offer_is_reported_without_cv() {
        let store = Arc::new(MemoryCvStore::new());
        let user = Uuid::new_v4();
        store.set_application_counts(
            user,
            ApplicationCounts {
                applied: 3,
                offer: 1,
                ..Default::default()
            },
        );
        let body = next_action(store, user).await;
        assert_eq!(body["kind"], "REVIEW_OFFERS");
        assert_eq!(body["stage"], "offer");
    }

    #[tokio::test]
    async fn test_career_paths_require_a_saved_cv() {
        let app = build_router(AppState::for_tests(Arc::new(MemoryCvStore::new())));
        let req = Request::builder()
            .uri(format!("/api/v1/guidance/career-paths?user_id={}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_career_paths_follow_saved_titles() {
        let store = Arc::new(MemoryCvStore::new());
        let user = Uuid::new_v4();
        let cv = CvDocument {
            experience: vec![ExperienceItem {
                job_title: "Backend Developer".to_string(),
                company: "Acme".to_string(),
                start_date: "2022".to_string(),
                is_current: true,
                ..Default::default()
            }],
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            ..Default::default()
        };
        store.save(user, &cv).await.unwrap();

        let app = build_router(AppState::for_tests(store));
        let req = Request::builder()
            .uri(format!("/api/v1/guidance/career-paths?user_id={user}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["paths"][0]["track"], "Software Engineering");
        assert_eq!(body["paths"][0]["fit"], 50);
        assert!(body["nextStep"]
            .as_str()
            .unwrap()
            .starts_with("Complete your CV essentials"));
    }
}
