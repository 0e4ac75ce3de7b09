//! Region Visual Analyzer: pixel statistics plus shape metrics for one
//! cropped region of interest. Total and deterministic; an empty region
//! short-circuits to `Defect::Unknown`.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::geometry::{arc_length, contour_area, convex_hull};

use crate::domain::defect::{classify, Defect, RegionStats};

/// Brown color band on the HSV cylinder, OpenCV-style 0-255 S/V scale.
const BROWN_HUE_MIN: f32 = 5.0;
const BROWN_HUE_MAX: f32 = 25.0;
const BROWN_SAT_MIN: f32 = 60.0;
const BROWN_VAL_MIN: f32 = 40.0;
const BROWN_VAL_MAX: f32 = 220.0;
const DARK_VAL_MAX: f32 = 60.0;

pub fn analyze_region(roi: &RgbImage) -> Defect {
    match region_stats(roi) {
        Some(stats) => classify(&stats),
        None => Defect::Unknown,
    }
}

/// Computes the five statistics the defect table runs on, or `None`
/// for a zero-area region.
pub fn region_stats(roi: &RgbImage) -> Option<RegionStats> {
    let (w, h) = roi.dimensions();
    let total = (w as u64 * h as u64) as f32;
    if total == 0.0 {
        return None;
    }

    let mut brown = 0u64;
    let mut dark = 0u64;
    let mut value_sum = 0f64;

    for pixel in roi.pixels() {
        let [r, g, b] = pixel.0;
        let (hue, sat, val) = rgb_to_hsv(r, g, b);
        if (BROWN_HUE_MIN..=BROWN_HUE_MAX).contains(&hue)
            && sat >= BROWN_SAT_MIN
            && (BROWN_VAL_MIN..=BROWN_VAL_MAX).contains(&val)
        {
            brown += 1;
        }
        if val <= DARK_VAL_MAX {
            dark += 1;
        }
        value_sum += val as f64;
    }

    let (circularity, solidity) = shape_metrics(roi);

    Some(RegionStats {
        brown_ratio: brown as f32 / total,
        dark_ratio: dark as f32 / total,
        mean_value: (value_sum / total as f64) as f32,
        circularity,
        solidity,
    })
}

/// Circularity and solidity of the largest outer contour after Otsu
/// binarization. No contour means a regular shape: both default to 1.0.
fn shape_metrics(roi: &RgbImage) -> (f32, f32) {
    let gray = GrayImage::from_fn(roi.width(), roi.height(), |x, y| {
        let [r, g, b] = roi.get_pixel(x, y).0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round() as u8])
    });

    let level = otsu_level(&gray);
    let binary = threshold(&gray, level, ThresholdType::Binary);
    let contours: Vec<Contour<i32>> = find_contours(&binary);

    let largest = contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .max_by(|a, b| contour_area(&a.points).total_cmp(&contour_area(&b.points)));

    let Some(contour) = largest else {
        return (1.0, 1.0);
    };

    let area = contour_area(&contour.points);
    let perimeter = arc_length(&contour.points, true);

    let mut circularity = 1.0f32;
    if perimeter > 0.0 {
        circularity = (4.0 * std::f64::consts::PI * area / (perimeter * perimeter)) as f32;
    }

    let mut solidity = 1.0f32;
    let hull = convex_hull(contour.points.as_slice());
    let hull_area = contour_area(&hull);
    if hull_area > 0.0 {
        solidity = (area / hull_area) as f32;
    }

    (circularity, solidity)
}

/// RGB to HSV with hue in degrees [0, 360) and S/V on the 0-255 scale.
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32;
    let g = g as f32;
    let b = b as f32;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let value = max;
    let saturation = if max > 0.0 { 255.0 * delta / max } else { 0.0 };
    let mut hue = if delta <= f32::EPSILON {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        60.0 * (b - r) / delta + 120.0
    } else {
        60.0 * (r - g) / delta + 240.0
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    (hue, saturation, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(w, h, image::Rgb(rgb))
    }

    #[test]
    fn empty_region_is_unknown() {
        assert_eq!(analyze_region(&RgbImage::new(0, 0)), Defect::Unknown);
    }

    #[test]
    fn all_dark_region_is_overcooked() {
        let stats = region_stats(&solid(32, 32, [0, 0, 0])).unwrap();
        assert_eq!(stats.dark_ratio, 1.0);
        assert_eq!(analyze_region(&solid(32, 32, [0, 0, 0])), Defect::Overcooked);
    }

    #[test]
    fn brown_mid_brightness_region_is_burnt() {
        // hue 15 deg, saturation 170/255, value 150/255
        let roi = solid(32, 32, [150, 75, 50]);
        let stats = region_stats(&roi).unwrap();
        assert_eq!(stats.brown_ratio, 1.0);
        assert_eq!(stats.dark_ratio, 0.0);
        assert!(stats.mean_value < 185.0);
        assert_eq!(analyze_region(&roi), Defect::Burnt);
    }

    #[test]
    fn bright_uniform_region_is_ok() {
        assert_eq!(analyze_region(&solid(64, 64, [255, 255, 255])), Defect::Ok);
    }

    #[test]
    fn dark_ratio_counts_value_sixty_as_dark() {
        // Pure gray: value equals the channel value.
        let stats = region_stats(&solid(8, 8, [60, 60, 60])).unwrap();
        assert_eq!(stats.dark_ratio, 1.0);
        let stats = region_stats(&solid(8, 8, [61, 61, 61])).unwrap();
        assert_eq!(stats.dark_ratio, 0.0);
    }

    #[test]
    fn hsv_matches_known_colors() {
        let (h, s, v) = rgb_to_hsv(255, 0, 0);
        assert_eq!((h, s, v), (0.0, 255.0, 255.0));
        let (h, _, _) = rgb_to_hsv(0, 255, 0);
        assert_eq!(h, 120.0);
        let (h, s, v) = rgb_to_hsv(128, 128, 128);
        assert_eq!((h, s, v), (0.0, 0.0, 128.0));
    }
}
