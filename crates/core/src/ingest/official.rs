//! Central-bank published policy rates, queried before the FRED fallback.

use crate::config::Settings;
use crate::domain::currency::Currency;
use crate::domain::indicators::Observation;
use crate::ingest::types::{SdmxResponse, ValetResponse};
use crate::ingest::{http_client, join_url, send_json};
use anyhow::{Context, Result};

pub const DEFAULT_ECB_BASE_URL: &str = "https://data-api.ecb.europa.eu";
pub const DEFAULT_BOC_BASE_URL: &str = "https://www.bankofcanada.ca";

/// Deposit facility rate, daily.
const ECB_DFR_PATH: &str = "/service/data/FM/D.U2.EUR.4F.KR.DFR.LEV";
/// Target for the overnight rate.
pub const BOC_POLICY_SERIES: &str = "V39079";

#[derive(Debug, Clone)]
pub struct OfficialRates {
    http: reqwest::Client,
    ecb_base_url: String,
    boc_base_url: String,
}

impl OfficialRates {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = http_client(settings.source_timeout())?;
        Ok(Self::new(
            http,
            settings
                .ecb_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_ECB_BASE_URL.to_string()),
            settings
                .boc_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BOC_BASE_URL.to_string()),
        ))
    }

    pub fn new(
        http: reqwest::Client,
        ecb_base_url: impl Into<String>,
        boc_base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            ecb_base_url: ecb_base_url.into(),
            boc_base_url: boc_base_url.into(),
        }
    }

    /// Whether `currency` has an official source here. Others go straight to FRED.
    pub fn covers(currency: Currency) -> bool {
        matches!(currency, Currency::Eur | Currency::Cad)
    }

    pub async fn policy_rate(&self, currency: Currency) -> Result<Observation> {
        match currency {
            Currency::Eur => self.ecb_deposit_rate().await,
            Currency::Cad => self.boc_overnight_target().await,
            other => anyhow::bail!("no official rate source for {other}"),
        }
    }

    pub async fn ecb_deposit_rate(&self) -> Result<Observation> {
        let req = self
            .http
            .get(join_url(&self.ecb_base_url, ECB_DFR_PATH))
            .header("Accept", "application/json")
            .query(&[("lastNObservations", "1"), ("format", "jsondata")]);
        let parsed: SdmxResponse = send_json(req, "ECB").await?;
        parse_sdmx_latest(&parsed)
    }

    pub async fn boc_overnight_target(&self) -> Result<Observation> {
        let path = format!("/valet/observations/{BOC_POLICY_SERIES}/json");
        let req = self
            .http
            .get(join_url(&self.boc_base_url, &path))
            .query(&[("recent", "1")]);
        let parsed: ValetResponse = send_json(req, "Bank of Canada").await?;
        parse_valet_latest(&parsed, BOC_POLICY_SERIES)
    }
}

fn json_number(v: &serde_json::Value) -> Option<f64> {
    match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn parse_sdmx_latest(resp: &SdmxResponse) -> Result<Observation> {
    let series = resp
        .data_sets
        .first()
        .and_then(|ds| ds.series.values().next())
        .context("ECB response has no series")?;

    let (index, values) = series
        .observations
        .iter()
        .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
        .max_by_key(|(i, _)| *i)
        .context("ECB series has no observations")?;

    let value = values
        .first()
        .and_then(|v| v.as_ref())
        .and_then(json_number)
        .context("ECB observation has no numeric value")?;

    let date = resp
        .structure
        .as_ref()
        .and_then(|s| s.dimensions.observation.iter().find(|d| d.id == "TIME_PERIOD"))
        .and_then(|d| d.values.get(index))
        .map(|v| v.id.clone());

    let mut obs = Observation::new(value, "ECB");
    obs.date = date;
    Ok(obs)
}

pub fn parse_valet_latest(resp: &ValetResponse, series: &str) -> Result<Observation> {
    let latest = resp
        .observations
        .last()
        .context("Bank of Canada response has no observations")?;

    let raw = latest
        .get(series)
        .with_context(|| format!("Bank of Canada observation lacks {series}"))?;
    let value = match raw {
        serde_json::Value::Object(map) => map.get("v").and_then(json_number),
        other => json_number(other),
    }
    .context("Bank of Canada observation has no numeric value")?;

    let mut obs = Observation::new(value, "Bank of Canada");
    obs.date = latest.get("d").and_then(|d| d.as_str()).map(str::to_string);
    Ok(obs)
}
