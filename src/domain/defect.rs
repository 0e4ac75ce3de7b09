use serde::{Deserialize, Serialize};

pub const DARK_RATIO_THRESH: f32 = 0.30;
pub const BROWN_RATIO_THRESH: f32 = 0.33;
pub const BRIGHT_V_THRESH: f32 = 185.0;
pub const CIRCULARITY_THRESH: f32 = 0.65;
pub const SOLIDITY_THRESH: f32 = 0.85;

/// Visual statistics computed over one cropped region. Ratios are
/// pixel-count fractions in [0, 1]; `mean_value` is on the 0-255 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionStats {
    pub brown_ratio: f32,
    pub dark_ratio: f32,
    pub mean_value: f32,
    pub circularity: f32,
    pub solidity: f32,
}

/// Closed defect taxonomy. `Unknown` only ever comes from an empty
/// region, not from `classify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Defect {
    Ok,
    Deformed,
    Broken,
    Overcooked,
    Burnt,
    Unknown,
}

/// Maps region statistics to a defect category. First match wins;
/// darkness outranks color, color outranks shape.
pub fn classify(stats: &RegionStats) -> Defect {
    if stats.dark_ratio >= DARK_RATIO_THRESH {
        return Defect::Overcooked;
    }
    if stats.brown_ratio >= BROWN_RATIO_THRESH && stats.mean_value < BRIGHT_V_THRESH {
        return Defect::Burnt;
    }
    if stats.circularity < CIRCULARITY_THRESH {
        return Defect::Deformed;
    }
    if stats.solidity < SOLIDITY_THRESH {
        return Defect::Broken;
    }
    Defect::Ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean() -> RegionStats {
        RegionStats {
            brown_ratio: 0.0,
            dark_ratio: 0.0,
            mean_value: 255.0,
            circularity: 1.0,
            solidity: 1.0,
        }
    }

    #[test]
    fn clean_region_is_ok() {
        assert_eq!(classify(&clean()), Defect::Ok);
    }

    #[test]
    fn dark_ratio_wins_over_everything() {
        // A region that would otherwise be Burnt, Deformed and Broken.
        let stats = RegionStats {
            brown_ratio: 1.0,
            dark_ratio: 0.30,
            mean_value: 10.0,
            circularity: 0.1,
            solidity: 0.1,
        };
        assert_eq!(classify(&stats), Defect::Overcooked);
    }

    #[test]
    fn dark_threshold_is_inclusive() {
        let mut stats = clean();
        stats.dark_ratio = 0.30;
        assert_eq!(classify(&stats), Defect::Overcooked);
        stats.dark_ratio = 0.299;
        assert_eq!(classify(&stats), Defect::Ok);
    }

    #[test]
    fn burnt_requires_brown_and_low_brightness() {
        let mut stats = clean();
        stats.brown_ratio = 0.33;
        stats.mean_value = 184.9;
        assert_eq!(classify(&stats), Defect::Burnt);

        // Bright enough regions are not burnt no matter how brown.
        stats.mean_value = 185.0;
        assert_eq!(classify(&stats), Defect::Ok);

        stats.brown_ratio = 0.32;
        stats.mean_value = 100.0;
        assert_eq!(classify(&stats), Defect::Ok);
    }

    #[test]
    fn burnt_outranks_shape_checks() {
        let stats = RegionStats {
            brown_ratio: 0.5,
            dark_ratio: 0.0,
            mean_value: 120.0,
            circularity: 0.1,
            solidity: 0.1,
        };
        assert_eq!(classify(&stats), Defect::Burnt);
    }

    #[test]
    fn irregular_outline_is_deformed_before_broken() {
        let mut stats = clean();
        stats.circularity = 0.64;
        stats.solidity = 0.5;
        assert_eq!(classify(&stats), Defect::Deformed);
        // Circularity exactly at the threshold is regular.
        stats.circularity = 0.65;
        assert_eq!(classify(&stats), Defect::Broken);
    }

    #[test]
    fn concave_outline_is_broken() {
        let mut stats = clean();
        stats.solidity = 0.84;
        assert_eq!(classify(&stats), Defect::Broken);
        stats.solidity = 0.85;
        assert_eq!(classify(&stats), Defect::Ok);
    }
}
