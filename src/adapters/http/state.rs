use std::sync::Arc;

use crate::application::services::{HistoryService, InspectionService};

/// Shared state for the axum handlers: the two application services.
#[derive(Clone)]
pub struct HttpState {
    pub inspection: Arc<InspectionService>,
    pub history: Arc<HistoryService>,
}
