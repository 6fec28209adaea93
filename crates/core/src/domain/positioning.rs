//! Speculative positioning from the CFTC Commitments of Traders report.
//!
//! Informational per-currency signal; never added to a currency's score total.

use crate::domain::currency::Currency;
use serde::{Deserialize, Serialize};

/// One weekly report row for a currency future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CotWeek {
    /// `YYYY-MM-DD`.
    pub report_date: String,
    pub noncomm_long: i64,
    pub noncomm_short: i64,
    #[serde(default)]
    pub open_interest: Option<i64>,
}

impl CotWeek {
    /// Non-commercial long minus short.
    pub fn net(&self) -> i64 {
        self.noncomm_long - self.noncomm_short
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CotStatus {
    Ok,
    InsufficientData,
}

/// Where the COT index sits: above 70, 30 to 70, below 30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CotIntensity {
    High,
    Medium,
    Low,
}

impl CotIntensity {
    pub fn from_index(index: f64) -> Self {
        if index > 70.0 {
            CotIntensity::High
        } else if index >= 30.0 {
            CotIntensity::Medium
        } else {
            CotIntensity::Low
        }
    }
}

/// This week's change in net position against the 52-week quartiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    Positive,
    Stable,
    Negative,
}

/// Weekly change in net position measured against its recent history. Values are truncated
/// to whole contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CotMomentum {
    pub status: CotStatus,
    pub delta_current: i64,
    /// Mean of the four weekly changes before this one.
    pub ma4_delta: i64,
    pub deviation: i64,
    pub percentile_25: i64,
    pub percentile_75: i64,
}

impl CotMomentum {
    pub fn insufficient() -> Self {
        Self {
            status: CotStatus::InsufficientData,
            delta_current: 0,
            ma4_delta: 0,
            deviation: 0,
            percentile_25: 0,
            percentile_75: 0,
        }
    }

    pub fn direction(&self) -> FlowDirection {
        if self.status != CotStatus::Ok {
            FlowDirection::Stable
        } else if self.delta_current > self.percentile_75 {
            FlowDirection::Positive
        } else if self.delta_current < self.percentile_25 {
            FlowDirection::Negative
        } else {
            FlowDirection::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CotPositioning {
    pub currency: Currency,
    pub status: CotStatus,
    pub weeks_available: usize,
    #[serde(default)]
    pub report_date: Option<String>,
    pub net_position: i64,
    #[serde(default)]
    pub net_position_prev: Option<i64>,
    /// 0..=100 position of the latest net inside its 52-week range.
    pub cot_index: f64,
    #[serde(default)]
    pub min_52w: Option<i64>,
    #[serde(default)]
    pub max_52w: Option<i64>,
    pub momentum: CotMomentum,
    pub intensity: CotIntensity,
    pub direction: FlowDirection,
    /// -2..=+2.
    pub score: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensity_bands() {
        assert_eq!(CotIntensity::from_index(70.1), CotIntensity::High);
        assert_eq!(CotIntensity::from_index(70.0), CotIntensity::Medium);
        assert_eq!(CotIntensity::from_index(30.0), CotIntensity::Medium);
        assert_eq!(CotIntensity::from_index(29.9), CotIntensity::Low);
    }

    #[test]
    fn direction_is_stable_without_momentum() {
        let mut m = CotMomentum::insufficient();
        m.delta_current = 5_000;
        assert_eq!(m.direction(), FlowDirection::Stable);

        m.status = CotStatus::Ok;
        m.percentile_75 = 1_000;
        assert_eq!(m.direction(), FlowDirection::Positive);
        m.delta_current = -2_000;
        m.percentile_25 = -1_000;
        assert_eq!(m.direction(), FlowDirection::Negative);
    }
}
