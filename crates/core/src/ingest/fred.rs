use crate::config::Settings;
use crate::domain::currency::Currency;
use crate::ingest::types::FredObservationsResponse;
use crate::ingest::{http_client, join_url, send_json};
use anyhow::Result;

pub const DEFAULT_FRED_BASE_URL: &str = "https://api.stlouisfed.org";
pub const SOURCE_NAME: &str = "FRED";

/// Observations requested per series; enough to skip a few "." gaps and still derive a trend.
pub const OBSERVATION_LIMIT: usize = 5;

/// FRED series ids used per currency.
pub mod series {
    use crate::domain::currency::Currency;

    pub const VIX: &str = "VIXCLS";
    pub const SP500: &str = "SP500";

    pub fn policy_rate(c: Currency) -> &'static str {
        match c {
            Currency::Usd => "DFEDTARU",
            Currency::Eur => "ECBDFR",
            Currency::Gbp => "BOERUKM",
            Currency::Jpy => "IRSTCI01JPM156N",
            Currency::Chf => "IRSTCI01CHM156N",
            Currency::Aud => "IRSTCI01AUM156N",
            Currency::Cad => "IRSTCI01CAM156N",
        }
    }

    pub fn inflation(c: Currency) -> &'static str {
        match c {
            Currency::Usd => "CPALTT01USM657N",
            Currency::Eur => "EA19CPALTT01GYM",
            Currency::Gbp => "CPALTT01GBM657N",
            Currency::Jpy => "CPALTT01JPM657N",
            Currency::Chf => "CPALTT01CHM657N",
            Currency::Aud => "CPALTT01AUQ657N",
            Currency::Cad => "CPALTT01CAM657N",
        }
    }

    /// OECD CPI less food and energy, YoY. The SNB publishes no core measure.
    pub fn core_inflation(c: Currency) -> Option<&'static str> {
        match c {
            Currency::Usd => Some("CPGRLE01USM659N"),
            Currency::Eur => Some("CPGRLE01EZM659N"),
            Currency::Gbp => Some("CPGRLE01GBM659N"),
            Currency::Jpy => Some("CPGRLE01JPM659N"),
            Currency::Chf => None,
            Currency::Aud => Some("CPGRLE01AUQ659N"),
            Currency::Cad => Some("CPGRLE01CAM659N"),
        }
    }

    pub fn gdp_growth(c: Currency) -> &'static str {
        match c {
            Currency::Usd => "A191RL1Q225SBEA",
            Currency::Eur => "NAEXKP01EZQ657S",
            Currency::Gbp => "NAEXKP01GBQ657S",
            Currency::Jpy => "NAEXKP01JPQ657S",
            Currency::Chf => "NAEXKP01CHQ657S",
            Currency::Aud => "NAEXKP01AUQ657S",
            Currency::Cad => "NAEXKP01CAQ657S",
        }
    }

    pub fn unemployment(c: Currency) -> &'static str {
        match c {
            Currency::Usd => "UNRATE",
            Currency::Eur => "LRHUTTTTEZM156S",
            Currency::Gbp => "LRHUTTTTGBM156S",
            Currency::Jpy => "LRHUTTTTJPM156S",
            Currency::Chf => "LRHUTTTTCHM156S",
            Currency::Aud => "LRHUTTTTAUM156S",
            Currency::Cad => "LRHUTTTTCAM156S",
        }
    }

    /// OECD current account balance, percent of GDP.
    pub fn current_account(c: Currency) -> &'static str {
        match c {
            Currency::Usd => "BPBLTT01USQ188S",
            Currency::Eur => "BPBLTT01EZQ188S",
            Currency::Gbp => "BPBLTT01GBQ188S",
            Currency::Jpy => "BPBLTT01JPQ188S",
            Currency::Chf => "BPBLTT01CHQ188S",
            Currency::Aud => "BPBLTT01AUQ188S",
            Currency::Cad => "BPBLTT01CAQ188S",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatedValue {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct FredClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FredClient {
    /// `None` when no API key is configured; every FRED-backed indicator is then missing.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(api_key) = settings.fred_api_key.clone() else {
            return Ok(None);
        };
        let base_url = settings
            .fred_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_FRED_BASE_URL.to_string());
        let http = http_client(settings.source_timeout())?;
        Ok(Some(Self::new(http, base_url, api_key)))
    }

    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Latest numeric observations of `series_id`, newest first.
    pub async fn recent(&self, series_id: &str) -> Result<Vec<DatedValue>> {
        let url = join_url(&self.base_url, "/fred/series/observations");
        let limit = OBSERVATION_LIMIT.to_string();
        let req = self.http.get(url).query(&[
            ("series_id", series_id),
            ("api_key", self.api_key.as_str()),
            ("file_type", "json"),
            ("sort_order", "desc"),
            ("limit", limit.as_str()),
        ]);

        let parsed: FredObservationsResponse = send_json(req, SOURCE_NAME).await?;
        let values: Vec<DatedValue> = parsed
            .observations
            .into_iter()
            .filter_map(|o| {
                let value = o.value.trim().parse::<f64>().ok()?;
                value.is_finite().then_some(DatedValue {
                    date: o.date,
                    value,
                })
            })
            .collect();

        anyhow::ensure!(
            !values.is_empty(),
            "FRED series {series_id} has no numeric observations"
        );
        Ok(values)
    }

    pub async fn policy_rate(&self, currency: Currency) -> Result<Vec<DatedValue>> {
        self.recent(series::policy_rate(currency)).await
    }
}
