use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayViewD, Axis, IxDyn};
use ort::session::Session;
use ort::value::Value;

use crate::application::ports::DetectorPort;
use crate::domain::detection::Detection;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::DetectParams;

/// ONNX-backed object detector. One session shared across all sessions
/// and uploads; per-call behavior is fully determined by `DetectParams`.
pub struct OnnxDetector {
    session: Mutex<Session>,
    model_name: String,
}

impl OnnxDetector {
    pub fn load(path: &Path) -> Result<Self> {
        let builder = Session::builder()?.with_intra_threads(4)?;
        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        let model_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Ok(Self {
            session: Mutex::new(session),
            model_name,
        })
    }

    fn infer(&self, rgb: &RgbImage, params: &DetectParams) -> Result<Vec<Detection>> {
        let imgsz = params.input_size as usize;
        let resized = image::imageops::resize(rgb, imgsz as u32, imgsz as u32, FilterType::Nearest);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let input_tensor = Value::from_array((input_shape, input.into_raw_vec()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("detector session lock poisoned"))?;
        let outputs = session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.into_iter().map(|&x| x as usize).collect();
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view.index_axis(Axis(0), 0);

        let num_candidates = view.shape()[1];
        let sx = rgb.width() as f32 / imgsz as f32;
        let sy = rgb.height() as f32 / imgsz as f32;

        let mut detections = Vec::new();

        for i in 0..num_candidates {
            let scores = view.slice(s![4.., i]);
            let Some((class_id, &max_score)) = scores
                .indexed_iter()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
            else {
                continue;
            };

            if max_score > params.conf_threshold {
                let cx = view[[0, i]];
                let cy = view[[1, i]];
                let w = view[[2, i]];
                let h = view[[3, i]];

                detections.push(Detection {
                    x1: (cx - w / 2.0) * sx,
                    y1: (cy - h / 2.0) * sy,
                    x2: (cx + w / 2.0) * sx,
                    y2: (cy + h / 2.0) * sy,
                    score: max_score,
                    class_id: class_id as u32,
                });
            }
        }

        if let Some(iou) = params.iou_threshold {
            detections = nms(detections, iou);
        }
        detections.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));
        if let Some(max) = params.max_detections {
            detections.truncate(max);
        }
        Ok(detections)
    }
}

/// Per-class non-maximum suppression.
fn nms(detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    if detections.is_empty() {
        return detections;
    }

    let mut class_groups: HashMap<u32, Vec<Detection>> = HashMap::new();
    for detection in detections {
        class_groups
            .entry(detection.class_id)
            .or_default()
            .push(detection);
    }

    let mut kept = Vec::new();
    for (_, mut group) in class_groups {
        group.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));

        let mut suppressed = vec![false; group.len()];
        for i in 0..group.len() {
            if suppressed[i] {
                continue;
            }
            for j in (i + 1)..group.len() {
                if !suppressed[j] && group[i].iou(&group[j]) > iou_threshold {
                    suppressed[j] = true;
                }
            }
            kept.push(group[i].clone());
        }
    }
    kept
}

#[async_trait]
impl DetectorPort for OnnxDetector {
    async fn detect(&self, image: &RgbImage, params: &DetectParams) -> DomainResult<Vec<Detection>> {
        self.infer(image, params)
            .map_err(|e| DomainError::OperationFailed(e.to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(class_id: u32, score: f32, bbox: [f32; 4]) -> Detection {
        Detection {
            x1: bbox[0],
            y1: bbox[1],
            x2: bbox[2],
            y2: bbox[3],
            score,
            class_id,
        }
    }

    #[test]
    fn nms_suppresses_overlapping_same_class_boxes() {
        let dets = vec![
            det(1, 0.9, [0.0, 0.0, 100.0, 100.0]),
            det(1, 0.8, [5.0, 5.0, 105.0, 105.0]),
            det(1, 0.7, [200.0, 200.0, 300.0, 300.0]),
        ];
        let mut kept = nms(dets, 0.5);
        kept.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].score, 0.7);
    }

    #[test]
    fn nms_never_suppresses_across_classes() {
        let dets = vec![
            det(0, 0.9, [0.0, 0.0, 100.0, 100.0]),
            det(1, 0.8, [0.0, 0.0, 100.0, 100.0]),
        ];
        assert_eq!(nms(dets, 0.5).len(), 2);
    }
}
