use std::sync::Arc;

use anyhow::Result;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregator::Aggregator;
use crate::types::{AnalysisInput, AnalysisResponse, ImageAttachment};

/// Request bodies carry user images; allow well above the axum default.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub struct AppState {
    aggregator: Aggregator,
}

pub fn router(aggregator: Aggregator) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/analyze/", post(analyze))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(AppState { aggregator }))
}

pub async fn serve(aggregator: Aggregator, host: &str, port: u16) -> Result<()> {
    let app = router(aggregator);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Aggregator service listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok", "message": "API is running"}))
}

/// Always answers HTTP 200; failures are signaled through the `success`
/// field of the envelope.
async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Json<AnalysisResponse> {
    let request_id = Uuid::new_v4();

    let input = match read_analysis_input(multipart).await {
        Ok(input) => input,
        Err(message) => {
            warn!(%request_id, "rejected analyze request: {}", message);
            return Json(AnalysisResponse::error(message));
        }
    };

    info!(
        %request_id,
        images = input.images.len(),
        "analyzing user input ({} chars)",
        input.user_text.len()
    );
    let data = state.aggregator.analyze(&input).await;
    Json(AnalysisResponse::ok(data))
}

/// Decode the multipart form into a validated input. An unreadable image
/// part is logged and omitted from the set; a missing or blank
/// `user_input` rejects the whole request.
async fn read_analysis_input(mut multipart: Multipart) -> Result<AnalysisInput, String> {
    let mut user_text: Option<String> = None;
    let mut images: Vec<ImageAttachment> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(format!("Malformed multipart request: {}", e)),
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("user_input") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read user_input: {}", e))?;
                user_text = Some(text);
            }
            Some("files") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) if !bytes.is_empty() => images.push(ImageAttachment {
                        filename,
                        media_type,
                        bytes: bytes.to_vec(),
                    }),
                    Ok(_) => warn!("skipping empty upload {}", filename),
                    Err(e) => warn!("skipping unreadable upload {}: {}", filename, e),
                }
            }
            _ => {}
        }
    }

    let user_text = user_text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "user_input must be a non-empty string".to_string())?;

    Ok(AnalysisInput { user_text, images })
}
