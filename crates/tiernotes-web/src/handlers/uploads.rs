use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::{ErrorResponse, UploadResponse};
use crate::state::AppState;
use crate::upload::parse_multipart;

fn error_response(status: StatusCode, error: &str, details: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}

pub async fn upload(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let file = match parse_multipart(multipart).await {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(status = %e.status, error = %e.message, "rejected upload");
            return error_response(e.status, "Invalid upload", e.message);
        }
    };

    tracing::info!(filename = %file.filename, bytes = file.data.len(), "upload received");

    match state.pipeline.run(file.data).await {
        Ok(notes) => {
            if notes.output_dir.is_none() {
                tracing::warn!(filename = %file.filename, "notes returned without a saved copy");
            }
            Json(UploadResponse::from(notes)).into_response()
        }
        Err(e) => {
            tracing::error!(filename = %file.filename, error = %e, "processing failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing PDF",
                e.to_string(),
            )
        }
    }
}
