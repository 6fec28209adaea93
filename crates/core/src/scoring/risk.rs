use crate::domain::currency::RiskClass;
use crate::domain::indicators::{MarketInputs, RiskRegime, Trend};

pub const VIX_RISK_OFF: f64 = 25.0;
pub const VIX_ELEVATED: f64 = 18.0;

/// Classifies the global regime from the VIX level and the equity trend. No VIX reading means
/// neutral.
pub fn classify(market: &MarketInputs) -> RiskRegime {
    let Some(vix) = market.vix.as_ref().map(|o| o.value) else {
        return RiskRegime::Neutral;
    };
    let equities = market.equity_trend.unwrap_or(Trend::Stable);

    if vix >= VIX_RISK_OFF {
        RiskRegime::RiskOff
    } else if vix >= VIX_ELEVATED && equities == Trend::Falling {
        RiskRegime::RiskOff
    } else if vix < VIX_ELEVATED && equities == Trend::Rising {
        RiskRegime::RiskOn
    } else {
        RiskRegime::Neutral
    }
}

fn matrix(class: RiskClass, regime: RiskRegime) -> i32 {
    match (class, regime) {
        (RiskClass::Cyclical, RiskRegime::RiskOn) => 1,
        (RiskClass::Cyclical, RiskRegime::RiskOff) => -1,
        (RiskClass::SafeHaven, RiskRegime::RiskOn) => -1,
        (RiskClass::SafeHaven, RiskRegime::RiskOff) => 1,
        _ => 0,
    }
}

/// `(base, quote)` risk-sentiment scores. Only a cyclical/safe-haven mix reacts to the regime.
pub fn pair_scores(base: RiskClass, quote: RiskClass, regime: RiskRegime) -> (i32, i32) {
    let mixed = matches!(
        (base, quote),
        (RiskClass::Cyclical, RiskClass::SafeHaven) | (RiskClass::SafeHaven, RiskClass::Cyclical)
    );
    if !mixed {
        return (0, 0);
    }
    (matrix(base, regime), matrix(quote, regime))
}
