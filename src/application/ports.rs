use async_trait::async_trait;
use image::RgbImage;

use crate::domain::{
    detection::Detection,
    errors::DomainResult,
    history::{HistoryFilter, HistoryStats},
    model::DetectParams,
    verdict::{NewVerdict, VerdictRecord},
};

/// The external object detector, stateless per call.
#[async_trait]
pub trait DetectorPort: Send + Sync {
    async fn detect(&self, image: &RgbImage, params: &DetectParams) -> DomainResult<Vec<Detection>>;

    /// Opaque identifier of the detector configuration, stamped onto
    /// every persisted verdict.
    fn model_name(&self) -> &str;
}

/// The verdict record store. Each operation is atomic on its own; no
/// transaction spans multiple operations.
#[async_trait]
pub trait VerdictStorePort: Send + Sync {
    async fn insert(&self, verdict: NewVerdict) -> DomainResult<i64>;
    async fn count(&self, filter: &HistoryFilter) -> DomainResult<i64>;
    async fn list(
        &self,
        filter: &HistoryFilter,
        limit: i64,
        offset: i64,
    ) -> DomainResult<(i64, Vec<VerdictRecord>)>;
    async fn stats(&self, filter: &HistoryFilter) -> DomainResult<HistoryStats>;
    async fn get(&self, id: i64) -> DomainResult<Option<VerdictRecord>>;
    async fn delete(&self, id: i64) -> DomainResult<u64>;
    async fn clear_all(&self) -> DomainResult<()>;
    async fn clear_filtered(&self, filter: &HistoryFilter) -> DomainResult<u64>;
    /// All matching records, newest first, for export.
    async fn export(&self, filter: &HistoryFilter) -> DomainResult<Vec<VerdictRecord>>;
}
