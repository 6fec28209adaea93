use crate::domain::currency::{Currency, Pair};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    CurrentRate,
    RateExpectations,
    Inflation,
    Growth,
    Pmi,
    RiskSentiment,
    Fiscal,
}

impl Component {
    pub const ALL: [Component; 7] = [
        Component::CurrentRate,
        Component::RateExpectations,
        Component::Inflation,
        Component::Growth,
        Component::Pmi,
        Component::RiskSentiment,
        Component::Fiscal,
    ];

    /// Largest absolute score the component may take. Rate expectations carry double weight.
    pub fn bound(self) -> i32 {
        match self {
            Component::RateExpectations => 2,
            _ => 1,
        }
    }
}

/// Seven component scores for one currency, as seen from one comparison.
///
/// Every field always holds a value; 0 stands for "no data" or "inconclusive".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub currency: Currency,
    pub current_rate: i32,
    pub rate_expectations: i32,
    pub inflation: i32,
    pub growth: i32,
    pub pmi: i32,
    pub risk_sentiment: i32,
    pub fiscal: i32,
}

impl ScoreSet {
    pub fn zero(currency: Currency) -> Self {
        Self {
            currency,
            current_rate: 0,
            rate_expectations: 0,
            inflation: 0,
            growth: 0,
            pmi: 0,
            risk_sentiment: 0,
            fiscal: 0,
        }
    }

    pub fn get(&self, component: Component) -> i32 {
        match component {
            Component::CurrentRate => self.current_rate,
            Component::RateExpectations => self.rate_expectations,
            Component::Inflation => self.inflation,
            Component::Growth => self.growth,
            Component::Pmi => self.pmi,
            Component::RiskSentiment => self.risk_sentiment,
            Component::Fiscal => self.fiscal,
        }
    }

    /// Sets a component, clamped into its bound.
    pub fn set(&mut self, component: Component, value: i32) {
        let b = component.bound();
        let v = value.clamp(-b, b);
        match component {
            Component::CurrentRate => self.current_rate = v,
            Component::RateExpectations => self.rate_expectations = v,
            Component::Inflation => self.inflation = v,
            Component::Growth => self.growth = v,
            Component::Pmi => self.pmi = v,
            Component::RiskSentiment => self.risk_sentiment = v,
            Component::Fiscal => self.fiscal = v,
        }
    }

    /// Sum of all components, within [-8, 8].
    pub fn total(&self) -> i32 {
        Component::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDiff {
    pub component: Component,
    pub base: i32,
    pub quote: i32,
    pub diff: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl Bias {
    pub fn from_differential(differential: i32) -> Bias {
        match differential {
            d if d >= 8 => Bias::StrongBullish,
            3..=7 => Bias::Bullish,
            -2..=2 => Bias::Neutral,
            -7..=-3 => Bias::Bearish,
            _ => Bias::StrongBearish,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Bias::StrongBullish => "strong bullish",
            Bias::Bullish => "bullish",
            Bias::Neutral => "neutral",
            Bias::Bearish => "bearish",
            Bias::StrongBearish => "strong bearish",
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairResult {
    pub pair: Pair,
    pub base: ScoreSet,
    pub quote: ScoreSet,
    pub components: Vec<ComponentDiff>,
    /// `base.total() - quote.total()`, within [-16, 16].
    pub differential: i32,
    pub bias: Bias,
}

/// Four-quadrant read of where an economy is heading. Informational; never part of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeKind {
    Expansion,
    Reflation,
    Stagflation,
    Deflation,
}

impl RegimeKind {
    pub fn forex_score(self) -> i32 {
        match self {
            RegimeKind::Expansion => 1,
            RegimeKind::Reflation => 2,
            RegimeKind::Stagflation => -2,
            RegimeKind::Deflation => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Momentum {
    StrongUp,
    Up,
    SlightUp,
    Flat,
    SlightDown,
    Down,
    StrongDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomicRegime {
    pub currency: Currency,
    pub kind: RegimeKind,
    pub forex_score: i32,
    pub pmi_delta: f64,
    pub inflation_delta: f64,
    pub pmi_momentum: Momentum,
    pub inflation_momentum: Momentum,
    /// Core × 0.7 + headline × 0.3, or headline alone without a core reading.
    #[serde(default)]
    pub inflation_index: f64,
    #[serde(default)]
    pub cpi_divergence: Option<CpiDivergence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceKind {
    /// Energy and food pressure that may fade.
    HeadlineHigher,
    /// Structural inflation; the central bank is likely to stay hawkish.
    CoreHigher,
}

/// Headline and core CPI more than half a point apart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpiDivergence {
    pub kind: DivergenceKind,
    /// Headline minus core, percentage points.
    pub gap: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bias_bands_cover_the_whole_range() {
        assert_eq!(Bias::from_differential(16), Bias::StrongBullish);
        assert_eq!(Bias::from_differential(8), Bias::StrongBullish);
        assert_eq!(Bias::from_differential(7), Bias::Bullish);
        assert_eq!(Bias::from_differential(3), Bias::Bullish);
        assert_eq!(Bias::from_differential(2), Bias::Neutral);
        assert_eq!(Bias::from_differential(-2), Bias::Neutral);
        assert_eq!(Bias::from_differential(-3), Bias::Bearish);
        assert_eq!(Bias::from_differential(-7), Bias::Bearish);
        assert_eq!(Bias::from_differential(-8), Bias::StrongBearish);
        assert_eq!(Bias::from_differential(-16), Bias::StrongBearish);

        // Walking the range, the band only ever moves one step bearish at a time.
        let order = [
            Bias::StrongBullish,
            Bias::Bullish,
            Bias::Neutral,
            Bias::Bearish,
            Bias::StrongBearish,
        ];
        let idx = |b: Bias| order.iter().position(|x| *x == b).unwrap();
        let mut prev = idx(Bias::from_differential(16));
        for d in (-16..16).rev() {
            let cur = idx(Bias::from_differential(d));
            assert!(cur == prev || cur == prev + 1, "gap at {d}");
            prev = cur;
        }
    }

    #[test]
    fn set_clamps_to_component_bound() {
        let mut s = ScoreSet::zero(Currency::Usd);
        s.set(Component::RateExpectations, 5);
        s.set(Component::Pmi, -3);
        assert_eq!(s.rate_expectations, 2);
        assert_eq!(s.pmi, -1);
        assert_eq!(s.total(), 1);
    }

    #[test]
    fn bias_serializes_snake_case_and_displays_label() {
        let v = serde_json::to_value(Bias::StrongBearish).unwrap();
        assert_eq!(v, serde_json::json!("strong_bearish"));
        assert_eq!(Bias::StrongBearish.to_string(), "strong bearish");
    }
}
