mod config;
mod cv;
mod db;
mod errors;
mod guidance;
mod import;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, S3Config};
use crate::cv::review::{CvReviewer, LlmCvReviewer};
use crate::cv::store::PgCvStore;
use crate::db::create_pool;
use crate::import::UploadArchive;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hirewise API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgCvStore::new(db));

    let reviewer: Option<Arc<dyn CvReviewer>> = match &config.anthropic_api_key {
        Some(key) => {
            info!("AI review enabled (model: {})", llm_client::MODEL);
            Some(Arc::new(LlmCvReviewer::new(LlmClient::new(key.clone()))))
        }
        None => {
            info!("ANTHROPIC_API_KEY not set, AI review disabled");
            None
        }
    };

    let archive = match &config.s3 {
        Some(s3) => {
            info!("Upload archiving enabled (bucket: {})", s3.bucket);
            Some(UploadArchive::new(build_s3_client(s3).await, s3.bucket.clone()))
        }
        None => {
            info!("S3 not configured, upload archiving disabled");
            None
        }
    };

    let state = AppState {
        store,
        reviewer,
        archive,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client for MinIO (local) or AWS (production).
async fn build_s3_client(s3: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &s3.access_key_id,
        &s3.secret_access_key,
        None,
        None,
        "hirewise-static",
    );

    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&s3.endpoint)
        .load()
        .await;

    // MinIO only serves path-style URLs.
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
