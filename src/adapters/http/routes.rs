use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::adapters::http::state::HttpState;
use crate::application::dto::{
    ClearFilteredResponse, DeletedResponse, DetectionOut, HistoryPage, OkResponse, UploadResponse,
};
use crate::domain::errors::DomainError;
use crate::domain::history::HistoryFilter;
use crate::domain::verdict::ImageSize;

pub enum ApiError {
    BadRequest(String),
    NotFound,
    Internal(String),
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(_) => ApiError::NotFound,
            DomainError::InvalidInput(msg) => ApiError::BadRequest(msg),
            DomainError::Storage(msg) | DomainError::OperationFailed(msg) => {
                ApiError::Internal(msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

/// Query parameters shared by every history endpoint.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub source: Option<String>,
    pub cls: Option<i64>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

fn default_limit() -> i64 {
    50
}

impl HistoryQuery {
    fn filter(&self) -> HistoryFilter {
        HistoryFilter::from_params(
            self.source.as_deref(),
            self.cls,
            self.date_from.as_deref(),
            self.date_to.as_deref(),
        )
    }
}

/// POST /api/detect -- one-shot detection over an uploaded image.
pub async fn detect_upload(
    State(st): State<HttpState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        data = Some(
            field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        );
        break;
    }
    let data = data.ok_or_else(|| ApiError::BadRequest("missing file field".to_string()))?;

    let img = image::load_from_memory(&data)
        .map_err(|_| ApiError::BadRequest("Invalid image".to_string()))?
        .to_rgb8();
    let (width, height) = img.dimensions();

    let review = st.inspection.process_upload(&img).await?;

    Ok(Json(UploadResponse {
        detections: review
            .kept
            .iter()
            .map(|d| DetectionOut {
                cls: d.cls,
                conf: d.confidence,
                bbox: d.bbox,
            })
            .collect(),
        counts: review.counts,
        final_verdict: review.final_verdict,
        image_size: ImageSize { width, height },
    }))
}

/// GET /api/history
pub async fn list_history(
    State(st): State<HttpState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryPage>, ApiError> {
    let (total, items) = st
        .history
        .list(&query.filter(), query.limit, query.offset)
        .await?;
    Ok(Json(HistoryPage { total, items }))
}

/// GET /api/history/stats
pub async fn history_stats(
    State(st): State<HttpState>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = st.history.stats(&query.filter()).await?;
    Ok(Json(stats))
}

/// GET /api/history/:id
pub async fn get_history_item(
    State(st): State<HttpState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let record = st.history.get(id).await?;
    Ok(Json(record))
}

/// DELETE /api/history/:id -- idempotent.
pub async fn delete_history_item(
    State(st): State<HttpState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let deleted = st.history.delete(id).await?;
    Ok(Json(DeletedResponse { deleted }))
}

/// POST /api/history/clear -- the only unconditional wipe.
pub async fn clear_history(State(st): State<HttpState>) -> Result<Json<OkResponse>, ApiError> {
    st.history.clear_all().await?;
    Ok(Json(OkResponse { ok: true }))
}

/// POST /api/history/clear-filtered -- rejects an empty filter.
pub async fn clear_history_filtered(
    State(st): State<HttpState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ClearFilteredResponse>, ApiError> {
    let deleted = st.history.clear_filtered(&query.filter()).await?;
    Ok(Json(ClearFilteredResponse { ok: true, deleted }))
}

/// GET /api/export/csv -- streamed attachment, filename embeds today's
/// date.
pub async fn export_csv(
    State(st): State<HttpState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    let body = st.history.export_csv(&query.filter()).await?;
    let filename = format!(
        "qc-history-{}.csv",
        chrono::Local::now().format("%Y-%m-%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}
