use std::sync::Arc;

use image::RgbImage;

use crate::application::aggregator::{review_frame, FrameReview};
use crate::application::ports::{DetectorPort, VerdictStorePort};
use crate::domain::{
    errors::{DomainError, DomainResult},
    history::{HistoryFilter, HistoryStats},
    model::DetectParams,
    verdict::{status_label, ImageSize, NewVerdict, Source, VerdictRecord},
};

/// Runs the detection-to-decision pipeline for one image or frame.
/// Detector and store are injected so the pipeline can be exercised
/// against fakes.
#[derive(Clone)]
pub struct InspectionService {
    detector: Arc<dyn DetectorPort>,
    store: Arc<dyn VerdictStorePort>,
}

impl InspectionService {
    pub fn new(detector: Arc<dyn DetectorPort>, store: Arc<dyn VerdictStorePort>) -> Self {
        Self { detector, store }
    }

    /// One live frame. Only the final verdict is persisted, tagged with
    /// the session id, so a stream does not flood storage with
    /// near-duplicate frames.
    pub async fn process_frame(
        &self,
        img: &RgbImage,
        session_id: &str,
    ) -> DomainResult<FrameReview> {
        let detections = self.detector.detect(img, &DetectParams::realtime()).await?;
        let review = review_frame(img, &detections, Source::Realtime);

        if let Some(fv) = &review.final_verdict {
            self.store
                .insert(NewVerdict {
                    source: Source::Realtime,
                    session_id: Some(session_id.to_string()),
                    cls: fv.cls,
                    reason: fv.reason.clone(),
                    confidence: fv.confidence,
                    bbox: Some(fv.bbox),
                    image_size: image_size_of(img),
                    model_name: self.detector.model_name().to_string(),
                })
                .await?;
        }

        Ok(review)
    }

    /// One uploaded image. Every surviving detection is persisted as
    /// its own record, leaving a complete audit trail for the upload.
    pub async fn process_upload(&self, img: &RgbImage) -> DomainResult<FrameReview> {
        let detections = self.detector.detect(img, &DetectParams::upload()).await?;
        let review = review_frame(img, &detections, Source::Upload);

        for det in &review.kept {
            self.store
                .insert(NewVerdict {
                    source: Source::Upload,
                    session_id: None,
                    cls: det.cls,
                    reason: det.reason.to_string(),
                    confidence: det.confidence,
                    bbox: Some(det.bbox),
                    image_size: image_size_of(img),
                    model_name: self.detector.model_name().to_string(),
                })
                .await?;
        }

        Ok(review)
    }
}

fn image_size_of(img: &RgbImage) -> ImageSize {
    ImageSize {
        width: img.width(),
        height: img.height(),
    }
}

/// Query operations over the verdict history.
#[derive(Clone)]
pub struct HistoryService {
    store: Arc<dyn VerdictStorePort>,
}

impl HistoryService {
    pub fn new(store: Arc<dyn VerdictStorePort>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        filter: &HistoryFilter,
        limit: i64,
        offset: i64,
    ) -> DomainResult<(i64, Vec<VerdictRecord>)> {
        self.store.list(filter, limit, offset).await
    }

    pub async fn stats(&self, filter: &HistoryFilter) -> DomainResult<HistoryStats> {
        self.store.stats(filter).await
    }

    pub async fn get(&self, id: i64) -> DomainResult<VerdictRecord> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("history record {id}")))
    }

    /// Idempotent: deleting a missing id reports zero deletions.
    pub async fn delete(&self, id: i64) -> DomainResult<u64> {
        self.store.delete(id).await
    }

    pub async fn clear_all(&self) -> DomainResult<()> {
        self.store.clear_all().await
    }

    /// At least one filter dimension is required; the unconditional
    /// wipe goes through `clear_all` only.
    pub async fn clear_filtered(&self, filter: &HistoryFilter) -> DomainResult<u64> {
        if filter.is_empty() {
            return Err(DomainError::InvalidInput(
                "at least one filter is required".to_string(),
            ));
        }
        self.store.clear_filtered(filter).await
    }

    /// Renders matching records as CSV, newest first.
    pub async fn export_csv(&self, filter: &HistoryFilter) -> DomainResult<String> {
        let rows = self.store.export(filter).await?;
        let mut out = String::from("id,timestamp,source,cls,status,confidence,reason\n");
        for r in rows {
            out.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                r.id,
                csv_field(&r.timestamp),
                r.source.as_str(),
                r.cls,
                status_label(r.cls),
                r.confidence,
                csv_field(&r.reason),
            ));
        }
        Ok(out)
    }
}

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
