//! Dataset read/write endpoints. The payload is opaque JSON owned by the
//! editor UI; the only check on save is that the body parses as JSON at
//! all, so a broken client cannot replace the dataset with garbage bytes.

use axum::{
    body::Bytes,
    extract::Extension,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::storage::DatasetStore;
use crate::utils::error::ApiError;

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub ok: bool,
}

/// GET /: the editor document is the real front door.
pub async fn index() -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [(header::LOCATION, "/ads_editor.html")],
    )
}

/// GET /ads_data.json: current dataset bytes.
pub async fn get_dataset(
    Extension(store): Extension<Arc<DatasetStore>>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = store.load().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        bytes,
    ))
}

/// POST /save: replace the dataset.
///
/// A storage failure surfaces as an explicit error response, never a
/// silent no-op, so the editing client can warn the user and keep their
/// changes for retry.
pub async fn save_dataset(
    Extension(store): Extension<Arc<DatasetStore>>,
    body: Bytes,
) -> Result<Json<SaveResponse>, ApiError> {
    serde_json::from_slice::<serde_json::Value>(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON payload: {}", e)))?;

    let report = store.save(&body).await?;
    info!(
        "Saved dataset ({} bytes, {} backup(s) pruned)",
        report.bytes_written, report.pruned
    );

    Ok(Json(SaveResponse { ok: true }))
}
