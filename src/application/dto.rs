use serde::{Deserialize, Serialize};

use crate::domain::{
    detection::ClassCounts,
    verdict::{FinalVerdict, ImageSize, VerdictRecord},
};

/// Per-frame reply on the live channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameMessage {
    pub boxes: Vec<[f32; 4]>,
    pub classes: Vec<u32>,
    pub confidences: Vec<f32>,
    pub counts: ClassCounts,
    #[serde(rename = "final")]
    pub final_verdict: Option<FinalVerdict>,
    /// Inference plus review time in milliseconds.
    pub inference_time: f32,
    pub image_size: ImageSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameMessage {
    /// Inline error reply for an undecodable payload; the session
    /// itself continues.
    pub fn decode_error() -> Self {
        Self {
            boxes: Vec::new(),
            classes: Vec::new(),
            confidences: Vec::new(),
            counts: ClassCounts::default(),
            final_verdict: None,
            inference_time: 0.0,
            image_size: ImageSize { width: 0, height: 0 },
            error: Some("Frame invalid".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionOut {
    pub cls: u32,
    pub conf: f32,
    pub bbox: [f32; 4],
}

/// One-shot upload reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub detections: Vec<DetectionOut>,
    pub counts: ClassCounts,
    #[serde(rename = "final")]
    pub final_verdict: Option<FinalVerdict>,
    pub image_size: ImageSize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub total: i64,
    pub items: Vec<VerdictRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearFilteredResponse {
    pub ok: bool,
    pub deleted: u64,
}
