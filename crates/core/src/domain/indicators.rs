use crate::domain::currency::Currency;
use serde::{Deserialize, Serialize};

/// Minimum move (in the indicator's own unit) before a series counts as rising or falling.
pub const TREND_THRESHOLD: f64 = 0.1;

/// How many prior readings the trend compares the latest value against.
pub const TREND_LOOKBACK: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Stable,
    Falling,
}

impl Trend {
    pub fn from_delta(delta: f64) -> Trend {
        if delta > TREND_THRESHOLD {
            Trend::Rising
        } else if delta < -TREND_THRESHOLD {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }
}

/// Latest value minus the mean of up to [`TREND_LOOKBACK`] prior readings.
pub fn delta_vs_history(latest: f64, previous: &[f64]) -> Option<f64> {
    let window: Vec<f64> = previous
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .take(TREND_LOOKBACK)
        .collect();
    if window.is_empty() {
        return None;
    }
    let mean = window.iter().sum::<f64>() / window.len() as f64;
    Some(latest - mean)
}

/// One fetched reading. An absent `Observation` is the missing-data marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub value: f64,
    #[serde(default)]
    pub delta: Option<f64>,
    #[serde(default)]
    pub trend: Option<Trend>,
    #[serde(default)]
    pub date: Option<String>,
    pub source: String,
}

impl Observation {
    pub fn new(value: f64, source: impl Into<String>) -> Self {
        Self {
            value,
            delta: None,
            trend: None,
            date: None,
            source: source.into(),
        }
    }

    /// `previous` is ordered newest first.
    pub fn with_history(mut self, previous: &[f64]) -> Self {
        self.delta = delta_vs_history(self.value, previous);
        self.trend = self.delta.map(Trend::from_delta);
        self
    }

    pub fn with_trend(mut self, trend: Trend) -> Self {
        self.trend = Some(trend);
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Trend tag, with "unknown" read as stable.
    pub fn trend_or_stable(&self) -> Trend {
        self.trend.unwrap_or(Trend::Stable)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmiReading {
    pub value: f64,
    /// Change versus the previous release.
    #[serde(default)]
    pub delta: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateStance {
    Hawkish,
    NeutralHawkish,
    Neutral,
    NeutralDovish,
    Dovish,
}

/// Market view on the next policy moves. Either part may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateOutlook {
    #[serde(default)]
    pub stance: Option<RateStance>,
    /// Probability (percent, 0..=100) that the next move is a cut.
    #[serde(default)]
    pub cut_probability: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiscalStance {
    Surplus,
    Balanced,
    Deficit,
}

/// A source that did not deliver for this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingSource {
    pub indicator: String,
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyIndicators {
    pub currency: Currency,
    #[serde(default)]
    pub interest_rate: Option<Observation>,
    #[serde(default)]
    pub inflation: Option<Observation>,
    /// Core CPI YoY. Never fetched for currencies without a core series (CHF).
    #[serde(default)]
    pub core_inflation: Option<Observation>,
    #[serde(default)]
    pub gdp_growth: Option<Observation>,
    #[serde(default)]
    pub unemployment: Option<Observation>,
    #[serde(default)]
    pub pmi_manufacturing: Option<PmiReading>,
    #[serde(default)]
    pub pmi_services: Option<PmiReading>,
    /// Current account balance, percent of GDP.
    #[serde(default)]
    pub current_account_gdp: Option<Observation>,
    #[serde(default)]
    pub fiscal_stance: Option<FiscalStance>,
    #[serde(default)]
    pub rate_outlook: RateOutlook,
    #[serde(default)]
    pub missing: Vec<MissingSource>,
}

impl CurrencyIndicators {
    pub fn empty(currency: Currency) -> Self {
        Self {
            currency,
            interest_rate: None,
            inflation: None,
            core_inflation: None,
            gdp_growth: None,
            unemployment: None,
            pmi_manufacturing: None,
            pmi_services: None,
            current_account_gdp: None,
            fiscal_stance: None,
            rate_outlook: RateOutlook::default(),
            missing: Vec::new(),
        }
    }

    pub fn mark_missing(
        &mut self,
        indicator: impl Into<String>,
        source: impl Into<String>,
        reason: impl Into<String>,
    ) {
        self.missing.push(MissingSource {
            indicator: indicator.into(),
            source: source.into(),
            reason: reason.into(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskRegime {
    RiskOn,
    Neutral,
    RiskOff,
}

/// Inputs for the global risk regime: volatility level and equity direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketInputs {
    #[serde(default)]
    pub vix: Option<Observation>,
    #[serde(default)]
    pub equity_trend: Option<Trend>,
    #[serde(default)]
    pub missing: Vec<MissingSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_uses_symmetric_threshold() {
        assert_eq!(Trend::from_delta(0.11), Trend::Rising);
        assert_eq!(Trend::from_delta(0.1), Trend::Stable);
        assert_eq!(Trend::from_delta(-0.1), Trend::Stable);
        assert_eq!(Trend::from_delta(-0.5), Trend::Falling);
    }

    #[test]
    fn delta_uses_at_most_three_prior_readings() {
        // Newest first: only 2.0, 2.2, 2.4 count.
        let d = delta_vs_history(3.0, &[2.0, 2.2, 2.4, 10.0]).unwrap();
        assert!((d - 0.8).abs() < 1e-9);
        assert_eq!(delta_vs_history(3.0, &[]), None);
    }

    #[test]
    fn observation_with_history_sets_trend() {
        let obs = Observation::new(2.9, "FRED").with_history(&[2.5, 2.6, 2.7]);
        assert_eq!(obs.trend, Some(Trend::Rising));
        let flat = Observation::new(2.6, "FRED").with_history(&[2.6]);
        assert_eq!(flat.trend, Some(Trend::Stable));
        assert_eq!(Observation::new(1.0, "x").trend_or_stable(), Trend::Stable);
    }

    #[test]
    fn stance_uses_kebab_case_tags() {
        let v = serde_json::to_value(RateStance::NeutralHawkish).unwrap();
        assert_eq!(v, serde_json::json!("neutral-hawkish"));
    }
}
