use serde::{Deserialize, Serialize};

/// One raw detection from the object detector, in source-image pixel
/// coordinates. Class 0 is the passing class; every other class is a
/// fail variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: u32,
}

impl Detection {
    /// Clamps the box into [0, width] x [0, height].
    pub fn clamped_bbox(&self, width: u32, height: u32) -> [f32; 4] {
        let w = width as f32;
        let h = height as f32;
        [
            self.x1.clamp(0.0, w),
            self.y1.clamp(0.0, h),
            self.x2.clamp(0.0, w),
            self.y2.clamp(0.0, h),
        ]
    }

    /// Intersection-over-union against another box, for suppression.
    pub fn iou(&self, other: &Detection) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let a = (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0);
        let b = (other.x2 - other.x1).max(0.0) * (other.y2 - other.y1).max(0.0);
        let union = a + b - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// Whole-pixel corners of a clamped box, truncated the way the crop
/// step truncates.
pub fn pixel_rect(bbox: &[f32; 4]) -> (u32, u32, u32, u32) {
    (bbox[0] as u32, bbox[1] as u32, bbox[2] as u32, bbox[3] as u32)
}

/// Per-frame tallies of passing and failing detections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub pass: u32,
    pub fail: u32,
}

impl ClassCounts {
    pub fn tally(&mut self, class_id: u32) {
        if class_id == 0 {
            self.pass += 1;
        } else {
            self.fail += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection {
            x1,
            y1,
            x2,
            y2,
            score: 0.9,
            class_id: 0,
        }
    }

    #[test]
    fn clamps_into_image_bounds() {
        let d = det(-10.0, 5.0, 250.0, 130.0);
        assert_eq!(d.clamped_bbox(200, 100), [0.0, 5.0, 200.0, 100.0]);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        assert_eq!(det(0.0, 0.0, 10.0, 10.0).iou(&det(20.0, 20.0, 30.0, 30.0)), 0.0);
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = det(0.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn counts_split_on_class_zero() {
        let mut counts = ClassCounts::default();
        counts.tally(0);
        counts.tally(1);
        counts.tally(3);
        assert_eq!(counts, ClassCounts { pass: 1, fail: 2 });
    }
}
