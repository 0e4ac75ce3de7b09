//! Deterministic reason sentences attached to every verdict. One fixed
//! string per condition, no numerics, so history stays stable for
//! deduplication and analytics.

use crate::domain::defect::Defect;

pub const REASON_PASS: &str = "Bentuk dan warna sesuai standar produksi.";
pub const REASON_DEFORMED: &str = "Bentuk tidak proporsional.";
pub const REASON_BROKEN: &str = "Permukaan retak atau tidak utuh.";
pub const REASON_OVERCOOKED: &str = "Terlalu gelap / indikasi gosong.";
pub const REASON_BURNT: &str = "Warna permukaan terlalu gelap.";
pub const REASON_GENERIC_FAIL: &str = "Tidak memenuhi standar kualitas.";

/// Composes the reason for one detection. A passing model class is
/// never second-guessed by the heuristic layer.
pub fn compose(class_id: u32, defect: Defect) -> &'static str {
    if class_id == 0 {
        return REASON_PASS;
    }
    match defect {
        Defect::Deformed => REASON_DEFORMED,
        Defect::Broken => REASON_BROKEN,
        Defect::Overcooked => REASON_OVERCOOKED,
        Defect::Burnt => REASON_BURNT,
        Defect::Ok | Defect::Unknown => REASON_GENERIC_FAIL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_DEFECTS: [Defect; 6] = [
        Defect::Ok,
        Defect::Deformed,
        Defect::Broken,
        Defect::Overcooked,
        Defect::Burnt,
        Defect::Unknown,
    ];

    #[test]
    fn pass_class_ignores_region_analysis() {
        for defect in ALL_DEFECTS {
            assert_eq!(compose(0, defect), REASON_PASS);
        }
    }

    #[test]
    fn fail_classes_map_each_defect_to_its_sentence() {
        assert_eq!(compose(1, Defect::Deformed), REASON_DEFORMED);
        assert_eq!(compose(1, Defect::Broken), REASON_BROKEN);
        assert_eq!(compose(1, Defect::Overcooked), REASON_OVERCOOKED);
        assert_eq!(compose(1, Defect::Burnt), REASON_BURNT);
    }

    #[test]
    fn ok_and_unknown_fall_back_to_generic_shortfall() {
        assert_eq!(compose(2, Defect::Ok), REASON_GENERIC_FAIL);
        assert_eq!(compose(2, Defect::Unknown), REASON_GENERIC_FAIL);
    }

    #[test]
    fn reasons_are_never_empty() {
        for cls in [0, 1, 2] {
            for defect in ALL_DEFECTS {
                assert!(!compose(cls, defect).is_empty());
            }
        }
    }
}
