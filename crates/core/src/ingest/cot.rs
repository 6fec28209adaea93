use crate::config::Settings;
use crate::domain::currency::Currency;
use crate::domain::positioning::CotWeek;
use crate::ingest::types::CftcRow;
use crate::ingest::{http_client, join_url, send_json, PositioningSource};
use anyhow::Result;

pub const DEFAULT_CFTC_BASE_URL: &str = "https://publicreporting.cftc.gov";

/// Legacy futures-only COT report dataset.
const DATASET_PATH: &str = "/resource/6dca-aqww.json";

/// Weeks requested; a few more than the 52-week lookback.
pub const WEEKS_REQUESTED: usize = 60;

const SELECT: &str = "report_date_as_yyyy_mm_dd,noncomm_positions_long_all,noncomm_positions_short_all,open_interest_all";

/// Contract names tried in order; the CFTC has renamed some of them over time.
pub fn contracts(c: Currency) -> &'static [&'static str] {
    match c {
        Currency::Usd => &[
            "USD INDEX - ICE FUTURES U.S.",
            "U.S. DOLLAR INDEX - ICE FUTURES U.S.",
            "US DOLLAR INDEX",
        ],
        Currency::Eur => &["EURO FX - CHICAGO MERCANTILE EXCHANGE", "EURO FX"],
        Currency::Gbp => &[
            "BRITISH POUND STERLING - CHICAGO MERCANTILE EXCHANGE",
            "BRITISH POUND",
            "BRITISH POUND STERLING",
        ],
        Currency::Jpy => &["JAPANESE YEN - CHICAGO MERCANTILE EXCHANGE", "JAPANESE YEN"],
        Currency::Chf => &["SWISS FRANC - CHICAGO MERCANTILE EXCHANGE", "SWISS FRANC"],
        Currency::Aud => &[
            "AUSTRALIAN DOLLAR - CHICAGO MERCANTILE EXCHANGE",
            "AUSTRALIAN DOLLAR",
        ],
        Currency::Cad => &[
            "CANADIAN DOLLAR - CHICAGO MERCANTILE EXCHANGE",
            "CANADIAN DOLLAR",
        ],
    }
}

#[derive(Debug, Clone)]
pub struct CftcClient {
    http: reqwest::Client,
    base_url: String,
}

impl CftcClient {
    /// The public endpoint needs no key, so this always yields a client.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = http_client(settings.source_timeout())?;
        let base_url = settings
            .cot_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_CFTC_BASE_URL.to_string());
        Ok(Self::new(http, base_url))
    }

    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn fetch_contract(&self, contract: &str) -> Result<Vec<CotWeek>> {
        let req = self.http.get(join_url(&self.base_url, DATASET_PATH)).query(&[
            ("$where", format!("market_and_exchange_names = '{contract}'")),
            ("$order", "report_date_as_yyyy_mm_dd DESC".to_string()),
            ("$limit", WEEKS_REQUESTED.to_string()),
            ("$select", SELECT.to_string()),
        ]);
        let rows: Vec<CftcRow> = send_json(req, self.source_name()).await?;
        Ok(to_weeks(rows))
    }
}

fn parse_count(raw: Option<&String>) -> Option<i64> {
    let raw = raw?.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|v| v as i64))
}

/// Rows without both position counts are dropped. Result is oldest first.
fn to_weeks(rows: Vec<CftcRow>) -> Vec<CotWeek> {
    let mut weeks: Vec<CotWeek> = rows
        .into_iter()
        .filter_map(|row| {
            Some(CotWeek {
                noncomm_long: parse_count(row.noncomm_positions_long_all.as_ref())?,
                noncomm_short: parse_count(row.noncomm_positions_short_all.as_ref())?,
                open_interest: parse_count(row.open_interest_all.as_ref()),
                report_date: row.report_date_as_yyyy_mm_dd.chars().take(10).collect(),
            })
        })
        .collect();
    weeks.sort_by(|a, b| a.report_date.cmp(&b.report_date));
    weeks
}

#[async_trait::async_trait]
impl PositioningSource for CftcClient {
    fn source_name(&self) -> &'static str {
        "CFTC"
    }

    async fn fetch_weeks(&self, currency: Currency) -> Result<Vec<CotWeek>> {
        let mut last_err = None;
        for contract in contracts(currency) {
            match self.fetch_contract(contract).await {
                Ok(weeks) if !weeks.is_empty() => {
                    tracing::debug!(%currency, contract, weeks = weeks.len(), "COT report fetched");
                    return Ok(weeks);
                }
                Ok(_) => tracing::debug!(%currency, contract, "no COT rows; trying next name"),
                Err(err) => {
                    tracing::debug!(%currency, contract, error = %err, "COT request failed");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            anyhow::anyhow!("no COT rows for {currency} under any contract name")
        }))
    }
}
