//! Per-component lookup tables. Every function is total: no data, or data that does not
//! fall in a decisive band, scores 0.

use crate::domain::currency::Currency;
use crate::domain::indicators::{FiscalStance, Observation, PmiReading, RateOutlook, RateStance, Trend};

pub const IDEAL_INFLATION_LOW: f64 = 1.5;
pub const IDEAL_INFLATION_HIGH: f64 = 2.5;

/// Rate spread (quote minus base) in basis points, rounded.
pub fn spread_bp(base_rate: f64, quote_rate: f64) -> i32 {
    ((quote_rate - base_rate) * 100.0).round() as i32
}

/// `(base, quote)` scores from the policy-rate spread.
pub fn current_rate(base: Option<&Observation>, quote: Option<&Observation>) -> (i32, i32) {
    match (base, quote) {
        (Some(b), Some(q)) => current_rate_from_spread(spread_bp(b.value, q.value)),
        _ => (0, 0),
    }
}

pub fn current_rate_from_spread(spread: i32) -> (i32, i32) {
    match spread {
        s if s >= 150 => (-1, 1),
        s if s > 50 => (0, 1),
        s if s >= -50 => (0, 0),
        s if s > -150 => (1, 0),
        _ => (1, -1),
    }
}

pub fn stance_score(stance: RateStance) -> i32 {
    match stance {
        RateStance::Hawkish => 2,
        RateStance::NeutralHawkish => 1,
        RateStance::Neutral => 0,
        RateStance::NeutralDovish => -1,
        RateStance::Dovish => -2,
    }
}

/// `None` for probabilities outside 0..=100.
pub fn cut_probability_score(p: f64) -> Option<i32> {
    if !(0.0..=100.0).contains(&p) {
        return None;
    }
    let score = if p >= 70.0 {
        -2
    } else if p >= 50.0 {
        -1
    } else if p >= 30.0 {
        0
    } else if p >= 10.0 {
        1
    } else {
        2
    };
    Some(score)
}

/// Probability band first, stance tag second.
pub fn rate_expectations(outlook: &RateOutlook) -> i32 {
    outlook
        .cut_probability
        .and_then(cut_probability_score)
        .or_else(|| outlook.stance.map(stance_score))
        .unwrap_or(0)
}

pub fn inflation(obs: Option<&Observation>) -> i32 {
    let Some(obs) = obs else {
        return 0;
    };
    let trend = obs.trend_or_stable();
    let v = obs.value;
    if (IDEAL_INFLATION_LOW..=IDEAL_INFLATION_HIGH).contains(&v) && trend != Trend::Rising {
        1
    } else if (v > IDEAL_INFLATION_HIGH && trend == Trend::Rising)
        || (v < IDEAL_INFLATION_LOW && trend == Trend::Falling)
    {
        -1
    } else {
        0
    }
}

pub fn growth(gdp: Option<&Observation>, inflation: Option<&Observation>) -> i32 {
    let Some(gdp) = gdp else {
        return 0;
    };
    let g = gdp.value;
    let infl = inflation.map(|o| o.value);

    if g < 0.5 && infl.is_some_and(|i| i > IDEAL_INFLATION_HIGH) {
        return -1;
    }
    if g < 0.0 {
        return -1;
    }
    if g >= 2.0 {
        // Strong growth with runaway prices is not sustainable.
        return if infl.is_some_and(|i| i > 4.0) { 0 } else { 1 };
    }
    0
}

/// Weighted PMI level and delta for `currency`. Weights are renormalized over the series that
/// are present and carry weight; `None` when nothing usable remains.
pub fn weighted_pmi(
    currency: Currency,
    manufacturing: Option<&PmiReading>,
    services: Option<&PmiReading>,
) -> Option<(f64, f64)> {
    let w = currency.profile().pmi_weights;
    let parts: Vec<(f64, &PmiReading)> = [(w.manufacturing, manufacturing), (w.services, services)]
        .into_iter()
        .filter_map(|(weight, r)| r.filter(|_| weight > 0.0).map(|r| (weight, r)))
        .collect();

    let total_weight: f64 = parts.iter().map(|(w, _)| w).sum();
    if total_weight <= 0.0 {
        return None;
    }

    let level = parts.iter().map(|(w, r)| w * r.value).sum::<f64>() / total_weight;
    let delta = parts
        .iter()
        .map(|(w, r)| w * r.delta.unwrap_or(0.0))
        .sum::<f64>()
        / total_weight;
    Some((level, delta))
}

pub fn pmi_from_weighted(level: f64, delta: f64) -> i32 {
    let rising = delta > 0.0;
    if level >= 52.0 {
        1
    } else if level >= 50.0 {
        if rising {
            1
        } else {
            0
        }
    } else if level >= 48.0 {
        if rising {
            0
        } else {
            -1
        }
    } else {
        -1
    }
}

pub fn pmi(
    currency: Currency,
    manufacturing: Option<&PmiReading>,
    services: Option<&PmiReading>,
) -> i32 {
    weighted_pmi(currency, manufacturing, services)
        .map(|(level, delta)| pmi_from_weighted(level, delta))
        .unwrap_or(0)
}

/// Current account as % of GDP when known, otherwise the news-derived tag.
pub fn fiscal(current_account_gdp: Option<&Observation>, stance: Option<FiscalStance>) -> i32 {
    if let Some(ca) = current_account_gdp {
        return if ca.value >= 2.0 {
            1
        } else if ca.value <= -3.0 {
            -1
        } else {
            0
        };
    }
    match stance {
        Some(FiscalStance::Surplus) => 1,
        Some(FiscalStance::Deficit) => -1,
        Some(FiscalStance::Balanced) | None => 0,
    }
}
