//! Deterministic rule-based scoring.
//!
//! `score` covers the components that depend on one currency alone. `score_pair` adds the two
//! pair-relative components (rate spread, risk sentiment) and derives the differential.

pub mod components;
pub mod cot;
pub mod regime;
pub mod risk;

use crate::domain::currency::{Currency, Pair};
use crate::domain::indicators::{CurrencyIndicators, RiskRegime};
use crate::domain::record::{AnalysisPayload, RankedPair, Ranking};
use crate::domain::score::{Bias, Component, ComponentDiff, EconomicRegime, PairResult, ScoreSet};

pub const RANKING_SIZE: usize = 5;

/// Currency-only components. Current rate and risk sentiment are left at 0.
pub fn score(data: &CurrencyIndicators) -> ScoreSet {
    let mut s = ScoreSet::zero(data.currency);
    s.set(
        Component::RateExpectations,
        components::rate_expectations(&data.rate_outlook),
    );
    s.set(Component::Inflation, components::inflation(data.inflation.as_ref()));
    s.set(
        Component::Growth,
        components::growth(data.gdp_growth.as_ref(), data.inflation.as_ref()),
    );
    s.set(
        Component::Pmi,
        components::pmi(
            data.currency,
            data.pmi_manufacturing.as_ref(),
            data.pmi_services.as_ref(),
        ),
    );
    s.set(
        Component::Fiscal,
        components::fiscal(data.current_account_gdp.as_ref(), data.fiscal_stance),
    );
    s
}

pub fn differential(base: ScoreSet, quote: ScoreSet) -> PairResult {
    let components = Component::ALL
        .iter()
        .map(|c| {
            let (b, q) = (base.get(*c), quote.get(*c));
            ComponentDiff {
                component: *c,
                base: b,
                quote: q,
                diff: b - q,
            }
        })
        .collect();
    let differential = base.total() - quote.total();
    PairResult {
        pair: Pair {
            base: base.currency,
            quote: quote.currency,
        },
        base,
        quote,
        components,
        differential,
        bias: Bias::from_differential(differential),
    }
}

pub fn score_pair(
    pair: Pair,
    base: &CurrencyIndicators,
    quote: &CurrencyIndicators,
    regime: RiskRegime,
) -> PairResult {
    let mut b = score(base);
    let mut q = score(quote);

    let (rb, rq) =
        components::current_rate(base.interest_rate.as_ref(), quote.interest_rate.as_ref());
    b.set(Component::CurrentRate, rb);
    q.set(Component::CurrentRate, rq);

    let (sb, sq) = risk::pair_scores(pair.base.risk_class(), pair.quote.risk_class(), regime);
    b.set(Component::RiskSentiment, sb);
    q.set(Component::RiskSentiment, sq);

    differential(b, q)
}

fn indicators_for(payload: &AnalysisPayload, currency: Currency) -> CurrencyIndicators {
    payload
        .currencies
        .get(&currency)
        .cloned()
        .unwrap_or_else(|| CurrencyIndicators::empty(currency))
}

/// Scores every requested pair in payload order. Currencies without data score 0 everywhere.
pub fn score_all(payload: &AnalysisPayload) -> Vec<PairResult> {
    let regime = payload
        .market
        .as_ref()
        .map(risk::classify)
        .unwrap_or(RiskRegime::Neutral);

    payload
        .pairs
        .iter()
        .map(|pair| {
            let base = indicators_for(payload, pair.base);
            let quote = indicators_for(payload, pair.quote);
            score_pair(*pair, &base, &quote, regime)
        })
        .collect()
}

/// Up to [`RANKING_SIZE`] pairs each side. Pairs with a zero differential are in neither list.
pub fn rank(results: &[PairResult]) -> Ranking {
    let ranked = |r: &PairResult| RankedPair {
        pair: r.pair,
        differential: r.differential,
        bias: r.bias,
    };

    let mut bullish: Vec<RankedPair> = results
        .iter()
        .filter(|r| r.differential > 0)
        .map(ranked)
        .collect();
    bullish.sort_by(|a, b| b.differential.cmp(&a.differential));
    bullish.truncate(RANKING_SIZE);

    let mut bearish: Vec<RankedPair> = results
        .iter()
        .filter(|r| r.differential < 0)
        .map(ranked)
        .collect();
    bearish.sort_by(|a, b| a.differential.cmp(&b.differential));
    bearish.truncate(RANKING_SIZE);

    Ranking {
        top_bullish: bullish,
        top_bearish: bearish,
    }
}

pub fn economic_regimes(payload: &AnalysisPayload) -> Vec<EconomicRegime> {
    payload
        .currencies
        .values()
        .filter_map(regime::economic_regime)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicators::{
        MarketInputs, Observation, PmiReading, RateOutlook, RateStance, Trend,
    };
    use crate::domain::record::AnalysisOptions;
    use crate::domain::currency::SUPPORTED_PAIRS;
    use chrono::Utc;

    fn obs(v: f64) -> Observation {
        Observation::new(v, "test")
    }

    fn rich(currency: Currency, rate: f64, pmi: f64) -> CurrencyIndicators {
        let mut d = CurrencyIndicators::empty(currency);
        d.interest_rate = Some(obs(rate));
        d.inflation = Some(obs(2.0).with_trend(Trend::Stable));
        d.gdp_growth = Some(obs(2.4));
        d.pmi_manufacturing = Some(PmiReading {
            value: pmi,
            delta: Some(0.5),
            date: None,
            source: "test".to_string(),
        });
        d.pmi_services = d.pmi_manufacturing.clone();
        d.rate_outlook = RateOutlook {
            stance: Some(RateStance::Hawkish),
            cut_probability: None,
        };
        d
    }

    fn bounded(s: &ScoreSet) -> bool {
        Component::ALL
            .iter()
            .all(|c| s.get(*c).abs() <= c.bound())
    }

    #[test]
    fn empty_data_scores_zero_everywhere() {
        let s = score(&CurrencyIndicators::empty(Currency::Gbp));
        assert_eq!(s, ScoreSet::zero(Currency::Gbp));
    }

    #[test]
    fn every_pair_has_bounded_scores() {
        let mut payload = AnalysisPayload::new(Utc::now(), Pair::all(), AnalysisOptions::full());
        for (i, c) in Currency::ALL.into_iter().enumerate() {
            payload
                .currencies
                .insert(c, rich(c, i as f64 * 0.9, 47.0 + i as f64));
        }
        payload.market = Some(MarketInputs {
            vix: Some(obs(30.0)),
            equity_trend: Some(Trend::Falling),
            missing: Vec::new(),
        });

        let results = score_all(&payload);
        assert_eq!(results.len(), SUPPORTED_PAIRS.len());
        for r in &results {
            assert!(bounded(&r.base) && bounded(&r.quote), "{}", r.pair);
            assert!((-16..=16).contains(&r.differential));
            assert_eq!(r.differential, r.base.total() - r.quote.total());
            assert_eq!(r.components.len(), 7);
        }
    }

    #[test]
    fn score_pair_applies_spread_and_risk() {
        // AUD (cyclical) vs JPY (safe haven) in risk-off, JPY paying far less.
        let aud = rich(Currency::Aud, 4.10, 50.0);
        let jpy = rich(Currency::Jpy, 0.25, 50.0);
        let pair: Pair = "AUD/JPY".parse().unwrap();
        let r = score_pair(pair, &aud, &jpy, RiskRegime::RiskOff);
        assert_eq!((r.base.current_rate, r.quote.current_rate), (1, -1));
        assert_eq!((r.base.risk_sentiment, r.quote.risk_sentiment), (-1, 1));
        // Everything else is identical, so the two pair-relative components cancel out.
        assert_eq!(r.differential, 0);
        assert_eq!(r.bias, Bias::Neutral);
    }

    #[test]
    fn differential_takes_pair_from_score_sets() {
        let mut b = ScoreSet::zero(Currency::Eur);
        b.set(Component::RateExpectations, 2);
        b.set(Component::Pmi, 1);
        b.set(Component::Inflation, 1);
        let mut q = ScoreSet::zero(Currency::Usd);
        q.set(Component::RateExpectations, -2);
        q.set(Component::Growth, -1);
        q.set(Component::Fiscal, -1);
        let r = differential(b, q);
        assert_eq!(r.pair.to_string(), "EUR/USD");
        assert_eq!(r.differential, 8);
        assert_eq!(r.bias, Bias::StrongBullish);
    }

    #[test]
    fn rank_orders_and_splits() {
        let mk = |pair: &str, d: i32| {
            let p: Pair = pair.parse().unwrap();
            let mut b = ScoreSet::zero(p.base);
            let mut q = ScoreSet::zero(p.quote);
            if d >= 0 {
                b.set(Component::RateExpectations, d.min(2));
                b.set(Component::Pmi, (d - 2).clamp(0, 1));
            } else {
                q.set(Component::RateExpectations, (-d).min(2));
            }
            differential(b, q)
        };
        let results = vec![
            mk("EUR/USD", 1),
            mk("USD/JPY", 3),
            mk("GBP/USD", -2),
            mk("AUD/CAD", 0),
            mk("EUR/GBP", -1),
        ];
        let ranking = rank(&results);
        let bulls: Vec<_> = ranking.top_bullish.iter().map(|r| r.pair.to_string()).collect();
        let bears: Vec<_> = ranking.top_bearish.iter().map(|r| r.pair.to_string()).collect();
        assert_eq!(bulls, vec!["USD/JPY", "EUR/USD"]);
        assert_eq!(bears, vec!["GBP/USD", "EUR/GBP"]);
    }
}
