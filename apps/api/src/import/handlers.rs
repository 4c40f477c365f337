use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::import::extract::{ensure_enough_text, extract_document, DocumentKind};
use crate::import::segmenter::{split_into_pages, Page};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub pages: Vec<Page>,
}

struct Upload {
    file_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

/// POST /api/v1/import
/// Multipart body: `file` (required), `user_id` (optional, used for archiving).
pub async fn handle_import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    let mut upload: Option<Upload> = None;
    let mut user_id: Option<Uuid> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                upload = Some(Upload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "user_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid user_id field: {e}")))?;
                let id = Uuid::parse_str(raw.trim())
                    .map_err(|_| AppError::Validation(format!("Invalid user_id '{raw}'")))?;
                user_id = Some(id);
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    if upload.bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    let kind = DocumentKind::detect(&upload.file_name, upload.content_type.as_deref())
        .ok_or_else(|| AppError::UnsupportedDocument(upload.file_name.clone()))?;

    let bytes = upload.bytes.clone();
    let pages = tokio::task::spawn_blocking(move || -> Result<Vec<Page>, AppError> {
        let doc = extract_document(kind, &bytes).map_err(|e| {
            warn!("Extraction failed for {kind:?} upload: {e:#}");
            AppError::UnprocessableEntity(format!("Could not read the uploaded file: {e}"))
        })?;
        ensure_enough_text(&doc)?;
        Ok(split_into_pages(&doc.text, doc.html.as_deref()))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Import task failed: {e}")))??;

    // Archiving is best effort; the caller still gets their pages.
    if let Some(archive) = &state.archive {
        if let Err(e) = archive
            .store(user_id, kind.extension(), kind.mime_type(), upload.bytes)
            .await
        {
            warn!("Failed to archive upload '{}': {e}", upload.file_name);
        }
    }

    info!(
        "Imported '{}' ({:?}) into {} page(s)",
        upload.file_name,
        kind,
        pages.len()
    );
    Ok(Json(ImportResponse { pages }))
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

    use crate::cv::store::MemoryCvStore;
    use crate::routes::build_router;
    use crate::state::AppState;

    const BOUNDARY: &str = "hirewise-test-boundary";

    fn multipart_request(file_name: &str, content_type: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/import")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(req: Request<Body>) -> (StatusCode, Value) {
        let app = build_router(AppState::for_tests(Arc::new(MemoryCvStore::new())));
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_import_text_file_splits_on_form_feed() {
        let text = "First page of the imported curriculum vitae.\u{000C}Second page with education and skills.";
        let (status, body) = send(multipart_request("cv.txt", "text/plain", text.as_bytes())).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let pages = body["pages"].as_array().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0]["content"], "First page of the imported curriculum vitae.");
        assert!(pages[0].get("title").is_none());
    }

    #[tokio::test]
    async fn test_import_html_uses_heading_titles() {
        let html = format!(
            "<h1>Experience</h1><p>{}</p><h1>Education</h1><p>{}</p>",
            "Ran the night shift at a busy warehouse. ".repeat(3),
            "Diploma in logistics management. ".repeat(3)
        );
        let (status, body) = send(multipart_request("cv.html", "text/html", html.as_bytes())).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let pages = body["pages"].as_array().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0]["title"], "Experience");
        assert_eq!(pages[1]["title"], "Education");
    }

    #[tokio::test]
    async fn test_import_rejects_short_text() {
        let (status, body) = send(multipart_request("cv.txt", "text/plain", b"Too short")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "IMPORT_TEXT_TOO_SHORT");
    }

    #[tokio::test]
    async fn test_import_rejects_unsupported_format() {
        let (status, body) =
            send(multipart_request("cv.xlsx", "application/octet-stream", b"binary")).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_DOCUMENT");
    }

    #[tokio::test]
    async fn test_import_rejects_corrupt_docx() {
        let (status, body) = send(multipart_request(
            "cv.docx",
            "application/octet-stream",
            b"this is not a zip archive at all",
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    }
}
