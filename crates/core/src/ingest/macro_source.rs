use crate::config::Settings;
use crate::domain::currency::Currency;
use crate::domain::indicators::{
    CurrencyIndicators, MarketInputs, MissingSource, Observation, Trend, TREND_LOOKBACK,
};
use crate::error::FxError;
use crate::ingest::fred::{self, DatedValue, FredClient};
use crate::ingest::official::OfficialRates;
use crate::ingest::IndicatorSource;
use anyhow::Result;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    InterestRate,
    Inflation,
    CoreInflation,
    GdpGrowth,
    Unemployment,
    CurrentAccount,
}

impl Indicator {
    pub fn label(self) -> &'static str {
        match self {
            Indicator::InterestRate => "interest_rate",
            Indicator::Inflation => "inflation",
            Indicator::CoreInflation => "core_inflation",
            Indicator::GdpGrowth => "gdp_growth",
            Indicator::Unemployment => "unemployment",
            Indicator::CurrentAccount => "current_account_gdp",
        }
    }

    /// Values outside this range are treated as bad data, not as readings.
    pub fn plausible_range(self) -> RangeInclusive<f64> {
        match self {
            Indicator::InterestRate => -2.0..=25.0,
            Indicator::Inflation | Indicator::CoreInflation => -10.0..=50.0,
            Indicator::GdpGrowth => -20.0..=25.0,
            Indicator::Unemployment => 0.0..=35.0,
            Indicator::CurrentAccount => -50.0..=50.0,
        }
    }

    fn fred_series(self, currency: Currency) -> Option<&'static str> {
        match self {
            Indicator::InterestRate => Some(fred::series::policy_rate(currency)),
            Indicator::Inflation => Some(fred::series::inflation(currency)),
            Indicator::CoreInflation => fred::series::core_inflation(currency),
            Indicator::GdpGrowth => Some(fred::series::gdp_growth(currency)),
            Indicator::Unemployment => Some(fred::series::unemployment(currency)),
            Indicator::CurrentAccount => Some(fred::series::current_account(currency)),
        }
    }
}

pub fn validate(indicator: Indicator, obs: Observation) -> Result<Observation> {
    anyhow::ensure!(
        indicator.plausible_range().contains(&obs.value),
        "{} value {} from {} is outside the plausible range",
        indicator.label(),
        obs.value,
        obs.source
    );
    Ok(obs)
}

/// Newest value with the trend taken against the readings behind it.
fn to_observation(values: &[DatedValue]) -> Result<Observation> {
    let (latest, previous) = values
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("no observations"))?;
    let history: Vec<f64> = previous.iter().map(|v| v.value).collect();
    Ok(Observation::new(latest.value, fred::SOURCE_NAME)
        .with_date(latest.date.clone())
        .with_history(&history))
}

/// Equity direction from the percent move of the latest close against the prior closes.
pub fn equity_trend(values: &[DatedValue]) -> Option<Trend> {
    let (latest, previous) = values.split_first()?;
    let window: Vec<f64> = previous
        .iter()
        .take(TREND_LOOKBACK)
        .map(|v| v.value)
        .collect();
    if window.is_empty() {
        return None;
    }
    let mean = window.iter().sum::<f64>() / window.len() as f64;
    if mean == 0.0 {
        return None;
    }
    Some(Trend::from_delta((latest.value / mean - 1.0) * 100.0))
}

/// Official central-bank rates where available, FRED for everything else.
#[derive(Debug, Clone)]
pub struct MacroIndicatorSource {
    fred: Option<FredClient>,
    official: OfficialRates,
}

impl MacroIndicatorSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            FredClient::from_settings(settings)?,
            OfficialRates::from_settings(settings)?,
        ))
    }

    pub fn new(fred: Option<FredClient>, official: OfficialRates) -> Self {
        Self { fred, official }
    }

    async fn from_fred(&self, indicator: Indicator, currency: Currency) -> Result<Observation> {
        let fred = self
            .fred
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("FRED_API_KEY not configured"))?;
        let series = indicator
            .fred_series(currency)
            .ok_or_else(|| anyhow::anyhow!("no {} series for {currency}", indicator.label()))?;
        let values = fred.recent(series).await?;
        validate(indicator, to_observation(&values)?)
    }

    async fn interest_rate(&self, currency: Currency) -> Result<Observation> {
        if OfficialRates::covers(currency) {
            match self.official.policy_rate(currency).await {
                Ok(obs) => match validate(Indicator::InterestRate, obs) {
                    Ok(obs) => return Ok(obs),
                    Err(err) => {
                        tracing::warn!(%currency, error = %err, "official rate rejected; falling back to FRED")
                    }
                },
                Err(err) => {
                    tracing::warn!(%currency, error = %err, "official rate unavailable; falling back to FRED")
                }
            }
        }
        self.from_fred(Indicator::InterestRate, currency).await
    }
}

fn settle(
    out: &mut CurrencyIndicators,
    indicator: Indicator,
    source: &str,
    res: Result<Observation>,
) -> Option<Observation> {
    match res {
        Ok(obs) => Some(obs),
        Err(err) => {
            let fx = FxError::source_unavailable(source, format!("{}: {err:#}", indicator.label()));
            tracing::warn!(
                currency = %out.currency,
                indicator = indicator.label(),
                error = %fx,
                "indicator missing"
            );
            out.mark_missing(indicator.label(), source, format!("{err:#}"));
            None
        }
    }
}

#[async_trait::async_trait]
impl IndicatorSource for MacroIndicatorSource {
    fn source_name(&self) -> &'static str {
        "macro"
    }

    async fn fetch_indicators(&self, currency: Currency) -> CurrencyIndicators {
        let has_core = Indicator::CoreInflation.fred_series(currency).is_some();
        let (rate, inflation, core, gdp, unemployment, current_account) = futures::join!(
            self.interest_rate(currency),
            self.from_fred(Indicator::Inflation, currency),
            async {
                if has_core {
                    Some(self.from_fred(Indicator::CoreInflation, currency).await)
                } else {
                    None
                }
            },
            self.from_fred(Indicator::GdpGrowth, currency),
            self.from_fred(Indicator::Unemployment, currency),
            self.from_fred(Indicator::CurrentAccount, currency),
        );

        let mut out = CurrencyIndicators::empty(currency);
        let rate_source = if OfficialRates::covers(currency) {
            "official+FRED"
        } else {
            fred::SOURCE_NAME
        };
        let interest_rate = settle(&mut out, Indicator::InterestRate, rate_source, rate);
        let inflation = settle(&mut out, Indicator::Inflation, fred::SOURCE_NAME, inflation);
        let core_inflation = core.and_then(|res| {
            settle(&mut out, Indicator::CoreInflation, fred::SOURCE_NAME, res)
        });
        let gdp_growth = settle(&mut out, Indicator::GdpGrowth, fred::SOURCE_NAME, gdp);
        let unemployment = settle(
            &mut out,
            Indicator::Unemployment,
            fred::SOURCE_NAME,
            unemployment,
        );
        let current_account_gdp = settle(
            &mut out,
            Indicator::CurrentAccount,
            fred::SOURCE_NAME,
            current_account,
        );
        out.interest_rate = interest_rate;
        out.inflation = inflation;
        out.core_inflation = core_inflation;
        out.gdp_growth = gdp_growth;
        out.unemployment = unemployment;
        out.current_account_gdp = current_account_gdp;
        out
    }

    async fn fetch_market(&self) -> MarketInputs {
        let mut market = MarketInputs::default();
        let Some(fred) = self.fred.as_ref() else {
            for indicator in ["vix", "equity_trend"] {
                market.missing.push(MissingSource {
                    indicator: indicator.to_string(),
                    source: fred::SOURCE_NAME.to_string(),
                    reason: "FRED_API_KEY not configured".to_string(),
                });
            }
            tracing::warn!("market inputs missing: FRED_API_KEY not configured");
            return market;
        };

        let (vix, spx) = futures::join!(
            fred.recent(fred::series::VIX),
            fred.recent(fred::series::SP500)
        );

        match vix.and_then(|v| to_observation(&v)) {
            Ok(obs) => market.vix = Some(obs),
            Err(err) => {
                tracing::warn!(error = %err, "VIX unavailable");
                market.missing.push(MissingSource {
                    indicator: "vix".to_string(),
                    source: fred::SOURCE_NAME.to_string(),
                    reason: format!("{err:#}"),
                });
            }
        }

        match spx {
            Ok(values) => market.equity_trend = equity_trend(&values),
            Err(err) => {
                tracing::warn!(error = %err, "S&P 500 unavailable");
                market.missing.push(MissingSource {
                    indicator: "equity_trend".to_string(),
                    source: fred::SOURCE_NAME.to_string(),
                    reason: format!("{err:#}"),
                });
            }
        }
        market
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::http_client;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dated(values: &[f64]) -> Vec<DatedValue> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DatedValue {
                date: format!("2025-0{}-01", 9 - i),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn implausible_values_are_rejected() {
        assert!(validate(Indicator::InterestRate, Observation::new(40.0, "x")).is_err());
        assert!(validate(Indicator::Unemployment, Observation::new(-1.0, "x")).is_err());
        assert!(validate(Indicator::Inflation, Observation::new(3.1, "x")).is_ok());
    }

    #[test]
    fn equity_trend_uses_percent_move() {
        assert_eq!(equity_trend(&dated(&[5100.0, 5000.0, 5000.0])), Some(Trend::Rising));
        assert_eq!(equity_trend(&dated(&[4900.0, 5000.0])), Some(Trend::Falling));
        assert_eq!(equity_trend(&dated(&[5001.0, 5000.0])), Some(Trend::Stable));
        assert_eq!(equity_trend(&dated(&[5000.0])), None);
    }

    #[tokio::test]
    async fn without_fred_everything_is_marked_missing() {
        let http = http_client(Duration::from_secs(1)).unwrap();
        // Unroutable official endpoints; the USD rate never touches them anyway.
        let official = OfficialRates::new(http, "http://127.0.0.1:9", "http://127.0.0.1:9");
        let source = MacroIndicatorSource::new(None, official);

        let data = source.fetch_indicators(Currency::Usd).await;
        assert!(data.interest_rate.is_none());
        assert!(data.inflation.is_none());
        assert_eq!(data.missing.len(), 6);
        assert!(data.missing[0].reason.contains("FRED_API_KEY"));

        // No core CPI series exists for CHF, so nothing is reported missing for it.
        let data = source.fetch_indicators(Currency::Chf).await;
        assert_eq!(data.missing.len(), 5);
        assert!(data.missing.iter().all(|m| m.indicator != "core_inflation"));

        let market = source.fetch_market().await;
        assert!(market.vix.is_none());
        assert_eq!(market.missing.len(), 2);
    }

    #[tokio::test]
    async fn core_inflation_comes_from_its_own_series() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fred/series/observations"))
            .and(query_param("series_id", "CPGRLE01GBM659N"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"observations":[{"date":"2025-09-01","value":"3.6"},{"date":"2025-08-01","value":"3.8"}]}"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fred/series/observations"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let http = http_client(Duration::from_secs(5)).unwrap();
        let fred = FredClient::new(http.clone(), server.uri(), "k");
        let official = OfficialRates::new(http, server.uri(), server.uri());
        let source = MacroIndicatorSource::new(Some(fred), official);

        let data = source.fetch_indicators(Currency::Gbp).await;
        let core = data.core_inflation.unwrap();
        assert_eq!(core.value, 3.6);
        assert_eq!(core.trend, Some(Trend::Falling));
        assert!(data.inflation.is_none());
    }

    #[tokio::test]
    async fn falls_back_to_fred_when_official_rate_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/service/data/FM/D.U2.EUR.4F.KR.DFR.LEV"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fred/series/observations"))
            .and(query_param("series_id", "ECBDFR"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"observations":[{"date":"2025-10-01","value":"2.00"},{"date":"2025-09-01","value":"2.00"}]}"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fred/series/observations"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let http = http_client(Duration::from_secs(5)).unwrap();
        let fred = FredClient::new(http.clone(), server.uri(), "k");
        let official = OfficialRates::new(http, server.uri(), server.uri());
        let source = MacroIndicatorSource::new(Some(fred), official);

        let data = source.fetch_indicators(Currency::Eur).await;
        let rate = data.interest_rate.unwrap();
        assert_eq!(rate.value, 2.0);
        assert_eq!(rate.source, "FRED");
        assert_eq!(rate.trend, Some(Trend::Stable));
        // inflation, core inflation, gdp, unemployment and current account all hit the 500 mock.
        assert_eq!(data.missing.len(), 5);
    }
}
