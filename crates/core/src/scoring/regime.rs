use crate::domain::indicators::{CurrencyIndicators, TREND_THRESHOLD};
use crate::domain::score::{CpiDivergence, DivergenceKind, EconomicRegime, Momentum, RegimeKind};
use crate::scoring::components::weighted_pmi;

pub fn classify(pmi_delta: f64, inflation_delta: f64) -> RegimeKind {
    let pmi_up = pmi_delta > TREND_THRESHOLD;
    let pmi_down = pmi_delta < -TREND_THRESHOLD;
    let infl_up = inflation_delta > TREND_THRESHOLD;
    let infl_down = inflation_delta < -TREND_THRESHOLD;

    match (pmi_up, pmi_down, infl_up, infl_down) {
        (true, _, _, true) => RegimeKind::Expansion,
        (true, _, true, _) => RegimeKind::Reflation,
        (_, true, true, _) => RegimeKind::Stagflation,
        (_, true, _, true) => RegimeKind::Deflation,
        // In transition: the larger move decides.
        _ if pmi_delta.abs() > inflation_delta.abs() => {
            if pmi_up {
                RegimeKind::Reflation
            } else {
                RegimeKind::Deflation
            }
        }
        _ if infl_up => RegimeKind::Stagflation,
        _ => RegimeKind::Expansion,
    }
}

pub fn momentum(delta: f64) -> Momentum {
    if delta > 1.0 {
        Momentum::StrongUp
    } else if delta > 0.3 {
        Momentum::Up
    } else if delta > 0.1 {
        Momentum::SlightUp
    } else if delta < -1.0 {
        Momentum::StrongDown
    } else if delta < -0.3 {
        Momentum::Down
    } else if delta < -0.1 {
        Momentum::SlightDown
    } else {
        Momentum::Flat
    }
}

/// Gap in percentage points past which headline and core are said to diverge.
pub const CPI_DIVERGENCE_GAP: f64 = 0.5;

const CORE_WEIGHT: f64 = 0.7;

pub fn inflation_index(headline: f64, core: Option<f64>) -> f64 {
    match core {
        Some(core) => core * CORE_WEIGHT + headline * (1.0 - CORE_WEIGHT),
        None => headline,
    }
}

pub fn cpi_divergence(headline: f64, core: Option<f64>) -> Option<CpiDivergence> {
    let gap = headline - core?;
    if gap.abs() <= CPI_DIVERGENCE_GAP {
        return None;
    }
    let kind = if gap > 0.0 {
        DivergenceKind::HeadlineHigher
    } else {
        DivergenceKind::CoreHigher
    };
    Some(CpiDivergence { kind, gap })
}

/// `None` unless both a weighted PMI delta and a headline inflation delta are known.
/// The inflation delta is the blended index against the headline's recent mean.
pub fn economic_regime(data: &CurrencyIndicators) -> Option<EconomicRegime> {
    let (_, pmi_delta) = weighted_pmi(
        data.currency,
        data.pmi_manufacturing.as_ref(),
        data.pmi_services.as_ref(),
    )?;
    let headline = data.inflation.as_ref()?;
    let core = data.core_inflation.as_ref().map(|o| o.value);
    let index = inflation_index(headline.value, core);
    let inflation_delta = headline.delta? + (index - headline.value);
    let kind = classify(pmi_delta, inflation_delta);
    Some(EconomicRegime {
        currency: data.currency,
        kind,
        forex_score: kind.forex_score(),
        pmi_delta,
        inflation_delta,
        pmi_momentum: momentum(pmi_delta),
        inflation_momentum: momentum(inflation_delta),
        inflation_index: index,
        cpi_divergence: cpi_divergence(headline.value, core),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::currency::Currency;
    use crate::domain::indicators::{Observation, PmiReading};

    #[test]
    fn quadrants() {
        assert_eq!(classify(0.5, -0.5), RegimeKind::Expansion);
        assert_eq!(classify(0.5, 0.5), RegimeKind::Reflation);
        assert_eq!(classify(-0.5, 0.5), RegimeKind::Stagflation);
        assert_eq!(classify(-0.5, -0.5), RegimeKind::Deflation);
    }

    #[test]
    fn transition_goes_to_the_larger_move() {
        assert_eq!(classify(0.8, 0.05), RegimeKind::Reflation);
        assert_eq!(classify(-0.8, 0.05), RegimeKind::Deflation);
        assert_eq!(classify(0.02, 0.4), RegimeKind::Stagflation);
        assert_eq!(classify(0.0, 0.0), RegimeKind::Expansion);
    }

    #[test]
    fn momentum_bands() {
        assert_eq!(momentum(1.5), Momentum::StrongUp);
        assert_eq!(momentum(0.5), Momentum::Up);
        assert_eq!(momentum(0.2), Momentum::SlightUp);
        assert_eq!(momentum(0.05), Momentum::Flat);
        assert_eq!(momentum(-0.2), Momentum::SlightDown);
        assert_eq!(momentum(-0.5), Momentum::Down);
        assert_eq!(momentum(-1.5), Momentum::StrongDown);
    }

    #[test]
    fn needs_both_deltas() {
        let mut data = CurrencyIndicators::empty(Currency::Eur);
        assert!(economic_regime(&data).is_none());

        data.pmi_manufacturing = Some(PmiReading {
            value: 51.0,
            delta: Some(0.6),
            date: None,
            source: "test".to_string(),
        });
        data.pmi_services = Some(PmiReading {
            value: 52.0,
            delta: Some(0.4),
            date: None,
            source: "test".to_string(),
        });
        data.inflation = Some(Observation::new(2.1, "test").with_history(&[2.5, 2.6, 2.4]));
        let regime = economic_regime(&data).unwrap();
        assert_eq!(regime.kind, RegimeKind::Expansion);
        assert_eq!(regime.forex_score, 1);
        assert_eq!(regime.pmi_momentum, Momentum::Up);
        assert_eq!(regime.inflation_index, 2.1);
        assert!(regime.cpi_divergence.is_none());
    }

    #[test]
    fn inflation_index_weights_core() {
        assert!((inflation_index(3.0, Some(2.0)) - 2.3).abs() < 1e-9);
        assert_eq!(inflation_index(3.0, None), 3.0);
    }

    #[test]
    fn cpi_divergence_needs_more_than_half_a_point() {
        assert_eq!(cpi_divergence(3.0, None), None);
        assert_eq!(cpi_divergence(3.0, Some(2.6)), None);
        assert_eq!(cpi_divergence(2.0, Some(2.5)), None);

        let d = cpi_divergence(3.2, Some(2.4)).unwrap();
        assert_eq!(d.kind, DivergenceKind::HeadlineHigher);
        assert!((d.gap - 0.8).abs() < 1e-9);

        let d = cpi_divergence(2.0, Some(3.1)).unwrap();
        assert_eq!(d.kind, DivergenceKind::CoreHigher);
    }

    #[test]
    fn core_reading_shifts_the_inflation_delta() {
        let mut data = CurrencyIndicators::empty(Currency::Usd);
        data.pmi_manufacturing = Some(PmiReading {
            value: 49.0,
            delta: Some(-0.5),
            date: None,
            source: "test".to_string(),
        });
        data.pmi_services = Some(PmiReading {
            value: 50.0,
            delta: Some(-0.5),
            date: None,
            source: "test".to_string(),
        });
        // Headline flat against its recent mean; core running well above it.
        data.inflation = Some(Observation::new(2.0, "test").with_history(&[2.0, 2.0, 2.0]));
        data.core_inflation = Some(Observation::new(3.0, "test"));

        let regime = economic_regime(&data).unwrap();
        assert!((regime.inflation_index - 2.7).abs() < 1e-9);
        assert!((regime.inflation_delta - 0.7).abs() < 1e-9);
        assert_eq!(regime.kind, RegimeKind::Stagflation);
        assert_eq!(regime.inflation_momentum, Momentum::Up);
        assert_eq!(regime.cpi_divergence.unwrap().kind, DivergenceKind::CoreHigher);
    }
}
