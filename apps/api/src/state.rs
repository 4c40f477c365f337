use std::sync::Arc;

use crate::config::Config;
use crate::cv::review::CvReviewer;
use crate::cv::store::CvStore;
use crate::import::UploadArchive;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// CV persistence. Postgres in production, in-memory in tests.
    pub store: Arc<dyn CvStore>,
    /// Optional AI review backend; `None` without an API key.
    pub reviewer: Option<Arc<dyn CvReviewer>>,
    pub archive: Option<UploadArchive>,
    pub config: Config,
}

#[cfg(test)]
impl AppState {
    pub fn for_tests(store: Arc<crate::cv::store::MemoryCvStore>) -> Self {
        AppState {
            store,
            reviewer: None,
            archive: None,
            config: Config::for_tests(),
        }
    }

    pub fn with_reviewer(mut self, reviewer: Option<Arc<dyn CvReviewer>>) -> Self {
        self.reviewer = reviewer;
        self
    }
}
