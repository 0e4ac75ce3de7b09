/// Per-call detector parameters. The model itself is shared and
/// stateless across calls.
#[derive(Debug, Clone, Copy)]
pub struct DetectParams {
    pub input_size: u32,
    pub conf_threshold: f32,
    pub iou_threshold: Option<f32>,
    pub max_detections: Option<usize>,
}

impl DetectParams {
    /// Live-frame profile: lower confidence bar, no suppression, so the
    /// overlay stays responsive.
    pub fn realtime() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.60,
            iou_threshold: None,
            max_detections: None,
        }
    }

    /// Upload profile: stricter confidence, IoU suppression, capped
    /// detection count for a clean audit trail.
    pub fn upload() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.65,
            iou_threshold: Some(0.5),
            max_detections: Some(30),
        }
    }
}
