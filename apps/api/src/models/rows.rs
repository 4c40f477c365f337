use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One row per user in `cvs`. `data` holds the normalized `CvDocument`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvRow {
    pub user_id: Uuid,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tracked job applications grouped by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCounts {
    pub applied: u32,
    pub interviewing: u32,
    pub offer: u32,
    pub rejected: u32,
}

impl ApplicationCounts {
    /// Every application that has left the draft state.
    pub fn total_sent(&self) -> u32 {
        self.applied
            .saturating_add(self.interviewing)
            .saturating_add(self.offer)
            .saturating_add(self.rejected)
    }
}

#[derive(Debug, FromRow)]
pub struct StatusCountRow {
    pub status: String,
    pub count: i64,
}
