use crate::config::Settings;
use crate::domain::currency::Currency;
use crate::domain::indicators::PmiReading;
use crate::ingest::types::{PmiResponse, PmiSeries};
use crate::ingest::{http_client, join_url, send_json, PmiSnapshot, PmiSource};
use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue};

const DEFAULT_PATH: &str = "/v1/pmi";

/// Generic JSON PMI provider: `GET {base}/v1/pmi?currency=XXX`.
#[derive(Debug, Clone)]
pub struct HttpPmiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpPmiProvider {
    /// `None` when no provider URL is configured.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(base_url) = settings.pmi_provider_base_url.clone() else {
            return Ok(None);
        };
        let http = http_client(settings.source_timeout())?;
        Ok(Some(Self::new(
            http,
            base_url,
            settings.pmi_provider_api_key.clone(),
        )))
    }

    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    fn validate(&self, resp: &PmiResponse, expected: Currency) -> Result<()> {
        anyhow::ensure!(
            resp.currency.eq_ignore_ascii_case(expected.code()),
            "PMI provider currency mismatch: expected {expected}, got {}",
            resp.currency
        );
        for series in [&resp.manufacturing, &resp.services].into_iter().flatten() {
            validate_series(series)?;
        }
        Ok(())
    }
}

fn validate_series(series: &PmiSeries) -> Result<()> {
    anyhow::ensure!(
        (0.0..=100.0).contains(&series.value),
        "PMI value {} is outside 0..=100",
        series.value
    );
    Ok(())
}

fn to_reading(series: PmiSeries, source: &str) -> PmiReading {
    PmiReading {
        delta: series.previous.map(|p| series.value - p),
        value: series.value,
        date: series.date,
        source: source.to_string(),
    }
}

#[async_trait::async_trait]
impl PmiSource for HttpPmiProvider {
    fn source_name(&self) -> &'static str {
        "pmi_provider"
    }

    async fn fetch_pmi(&self, currency: Currency) -> Result<PmiSnapshot> {
        let req = self
            .http
            .get(join_url(&self.base_url, DEFAULT_PATH))
            .headers(self.headers()?)
            .query(&[("currency", currency.code())]);

        let parsed: PmiResponse = send_json(req, self.source_name()).await?;
        self.validate(&parsed, currency)?;

        let source = self.source_name();
        Ok(PmiSnapshot {
            manufacturing: parsed.manufacturing.map(|s| to_reading(s, source)),
            services: parsed.services.map(|s| to_reading(s, source)),
        })
    }
}
