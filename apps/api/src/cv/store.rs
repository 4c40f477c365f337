//! CV persistence: one row per user, last write wins.
//!
//! `AppState` holds an `Arc<dyn CvStore>`; production uses `PgCvStore`,
//! tests use `MemoryCvStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cv::normalize::normalize_cv;
use crate::errors::AppError;
use crate::models::cv::CvDocument;
use crate::models::rows::{ApplicationCounts, CvRow, StatusCountRow};

/// A user's saved CV plus its timestamps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCv {
    pub user_id: Uuid,
    pub cv: CvDocument,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CvRow> for StoredCv {
    fn from(row: CvRow) -> Self {
        // Rows written by older clients are re-normalized on the way out.
        Self {
            user_id: row.user_id,
            cv: normalize_cv(&row.data),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
pub trait CvStore: Send + Sync {
    async fn latest(&self, user_id: Uuid) -> Result<Option<StoredCv>, AppError>;

    async fn save(&self, user_id: Uuid, cv: &CvDocument) -> Result<StoredCv, AppError>;

    async fn application_counts(&self, user_id: Uuid) -> Result<ApplicationCounts, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// PgCvStore
// ────────────────────────────────────────────────────────────────────────────

pub struct PgCvStore {
    pool: PgPool,
}

impl PgCvStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CvStore for PgCvStore {
    async fn latest(&self, user_id: Uuid) -> Result<Option<StoredCv>, AppError> {
        let row: Option<CvRow> = sqlx::query_as("SELECT * FROM cvs WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(StoredCv::from))
    }

    async fn save(&self, user_id: Uuid, cv: &CvDocument) -> Result<StoredCv, AppError> {
        let data = serde_json::to_value(cv).map_err(|e| AppError::Internal(e.into()))?;

        let row: CvRow = sqlx::query_as(
            r#"
            INSERT INTO cvs (user_id, data)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&data)
        .fetch_one(&self.pool)
        .await?;

        info!("Saved CV for user {user_id}");
        Ok(StoredCv::from(row))
    }

    async fn application_counts(&self, user_id: Uuid) -> Result<ApplicationCounts, AppError> {
        let rows: Vec<StatusCountRow> = sqlx::query_as(
            "SELECT status, COUNT(*) AS count FROM job_applications WHERE user_id = $1 GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tally_statuses(&rows))
    }
}

/// Folds per-status counts into `ApplicationCounts`, saturating on overflow.
fn tally_statuses(rows: &[StatusCountRow]) -> ApplicationCounts {
    let mut counts = ApplicationCounts::default();
    for row in rows {
        let n = u32::try_from(row.count).unwrap_or(u32::MAX);
        let slot = match row.status.as_str() {
            "applied" => &mut counts.applied,
            "interviewing" => &mut counts.interviewing,
            "offer" => &mut counts.offer,
            "rejected" => &mut counts.rejected,
            // saved / draft applications have not been sent yet
            "saved" | "draft" => continue,
            other => {
                warn!("Ignoring unknown application status '{other}'");
                continue;
            }
        };
        *slot = slot.saturating_add(n);
    }
    counts
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryCvStore (tests)
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub use memory::MemoryCvStore;


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_last_write_wins() {
        let store = MemoryCvStore::new();
        let user = Uuid::new_v4();
        assert!(store.latest(user).await.unwrap().is_none());

        let first = CvDocument {
            summary: "First draft".to_string(),
            ..Default::default()
        };
        let second = CvDocument {
            summary: "Second draft".to_string(),
            ..Default::default()
        };
        let saved_first = store.save(user, &first).await.unwrap();
        store.save(user, &second).await.unwrap();

        let latest = store.latest(user).await.unwrap().unwrap();
        assert_eq!(latest.cv.summary, "Second draft");
        assert_eq!(latest.created_at, saved_first.created_at);
    }

    #[tokio::test]
    async fn test_memory_store_application_counts_default_to_zero() {
        let store = MemoryCvStore::new();
        let user = Uuid::new_v4();
        assert_eq!(
            store.application_counts(user).await.unwrap(),
            ApplicationCounts::default()
        );

        let counts = ApplicationCounts {
            applied: 4,
            interviewing: 1,
            ..Default::default()
        };
        store.set_application_counts(user, counts);
        assert_eq!(store.application_counts(user).await.unwrap().total_sent(), 5);
    }

    #[test]
    fn test_status_tally_ignores_drafts_and_saturates() {
        let row = |status: &str, count: i64| StatusCountRow {
            status: status.to_string(),
            count,
        };
        let counts = tally_statuses(&[
            row("applied", i64::MAX),
            row("applied", 5),
            row("interviewing", 2),
            row("draft", 9),
            row("archived", 4),
        ]);
        assert_eq!(counts.applied, u32::MAX);
        assert_eq!(counts.interviewing, 2);
        assert_eq!(counts.offer, 0);
        assert_eq!(counts.total_sent(), u32::MAX);
    }

    #[test]
    fn test_row_is_renormalized() {
        let row = CvRow {
            user_id: Uuid::new_v4(),
            data: serde_json::json!({ "personal_info": { "full_name": "Lin" }, "skills": "Go, SQL" }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let stored = StoredCv::from(row);
        assert_eq!(stored.cv.personal_info.full_name, "Lin");
        assert_eq!(stored.cv.skills.len(), 2);
    }
}
