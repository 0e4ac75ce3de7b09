//! Detection Aggregator: a single pass over one frame's raw detections
//! producing the kept set, the pass/fail tallies, and the final verdict.

use image::{imageops, RgbImage};

use crate::application::analyzer::analyze_region;
use crate::domain::defect::Defect;
use crate::domain::detection::{pixel_rect, ClassCounts, Detection};
use crate::domain::reason::compose;
use crate::domain::verdict::{status_label, FinalVerdict, Source};

/// Uploads drop boxes covering strictly more than this share of the
/// image, treated as false positives; live frames keep them for display
/// consistency.
const UPLOAD_MAX_AREA_FRACTION: f64 = 0.4;

/// One detection that survived filtering, with its composed reason.
#[derive(Debug, Clone)]
pub struct ReviewedDetection {
    pub cls: u32,
    pub confidence: f32,
    pub bbox: [f32; 4],
    pub reason: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct FrameReview {
    pub kept: Vec<ReviewedDetection>,
    pub counts: ClassCounts,
    pub final_verdict: Option<FinalVerdict>,
}

/// Reviews one frame's detections in detector order. The final verdict
/// is the strictly highest-confidence survivor; on equal confidence the
/// first seen wins.
pub fn review_frame(img: &RgbImage, detections: &[Detection], source: Source) -> FrameReview {
    let (width, height) = img.dimensions();
    let area_cutoff = UPLOAD_MAX_AREA_FRACTION * (width as f64) * (height as f64);

    let mut review = FrameReview::default();
    let mut best_conf = f32::NEG_INFINITY;

    for det in detections {
        let bbox = det.clamped_bbox(width, height);
        let (x1, y1, x2, y2) = pixel_rect(&bbox);

        if source == Source::Upload {
            let box_area = (x2.saturating_sub(x1) as f64) * (y2.saturating_sub(y1) as f64);
            if box_area > area_cutoff {
                continue;
            }
        }

        let defect = region_defect(img, x1, y1, x2, y2);
        let reason = compose(det.class_id, defect);

        review.counts.tally(det.class_id);
        review.kept.push(ReviewedDetection {
            cls: det.class_id,
            confidence: det.score,
            bbox,
            reason,
        });

        if det.score > best_conf {
            best_conf = det.score;
            review.final_verdict = Some(FinalVerdict {
                cls: det.class_id,
                status: status_label(det.class_id).to_string(),
                reason: reason.to_string(),
                confidence: det.score,
                bbox,
            });
        }
    }

    review
}

/// Analyzes the cropped region; a degenerate box falls back to the
/// whole frame, the behavior history records were built on.
fn region_defect(img: &RgbImage, x1: u32, y1: u32, x2: u32, y2: u32) -> Defect {
    if x2 > x1 && y2 > y1 {
        let roi = imageops::crop_imm(img, x1, y1, x2 - x1, y2 - y1).to_image();
        analyze_region(&roi)
    } else {
        analyze_region(img)
    }
}
