use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::verdict::Source;

/// Optional conjunction of history constraints. Fields left `None`
/// simply do not constrain the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub source: Option<Source>,
    pub cls: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl HistoryFilter {
    /// Builds a filter from raw query values. Unknown sources and
    /// malformed dates are dropped rather than rejected, matching the
    /// query contract.
    pub fn from_params(
        source: Option<&str>,
        cls: Option<i64>,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Self {
        Self {
            source: source.and_then(Source::parse),
            cls,
            date_from: date_from.and_then(parse_date),
            date_to: date_to.and_then(parse_date),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_none()
            && self.cls.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Pass/fail breakdown over one filter. `pass_count` counts class 0,
/// `fail_count` everything else, so the two always sum to `total` when
/// the filter does not constrain `cls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub total: i64,
    pub pass_count: i64,
    pub fail_count: i64,
}
