use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// Keeps a copy of every uploaded document in S3 (or MinIO).
/// Only present in `AppState` when the S3 configuration group is complete.
#[derive(Clone)]
pub struct UploadArchive {
    client: S3Client,
    bucket: String,
}

impl UploadArchive {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Uploads `body` and returns the object key.
    pub async fn store(
        &self,
        user_id: Option<Uuid>,
        extension: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<String, AppError> {
        let key = archive_key(user_id, Uuid::new_v4(), extension);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Archived upload to s3://{}/{}", self.bucket, key);
        Ok(key)
    }
}

/// `imports/<user>/<upload>.<ext>`; anonymous uploads go under `anonymous`.
fn archive_key(user_id: Option<Uuid>, upload_id: Uuid, extension: &str) -> String {
    let owner = user_id.map_or_else(|| "anonymous".to_string(), |id| id.to_string());
    format!("imports/{owner}/{upload_id}.{extension}")
}
