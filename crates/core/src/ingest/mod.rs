pub mod cot;
pub mod fred;
pub mod macro_source;
pub mod official;
pub mod pmi;
pub mod search;
pub mod signals;
pub mod types;

use crate::domain::currency::Currency;
use crate::domain::indicators::{CurrencyIndicators, MarketInputs, PmiReading};
use crate::domain::positioning::CotWeek;
use crate::domain::record::Snippet;
use anyhow::Context;
use serde::de::DeserializeOwned;

/// Macro indicators for one currency plus the global market inputs.
///
/// Implementations never fail as a whole: a source that is down leaves its field `None` and
/// adds an entry to `missing`.
#[async_trait::async_trait]
pub trait IndicatorSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_indicators(&self, currency: Currency) -> CurrencyIndicators;

    async fn fetch_market(&self) -> MarketInputs;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PmiSnapshot {
    pub manufacturing: Option<PmiReading>,
    pub services: Option<PmiReading>,
}

#[async_trait::async_trait]
pub trait PmiSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_pmi(&self, currency: Currency) -> anyhow::Result<PmiSnapshot>;
}

/// Weekly COT report rows for one currency future, oldest first.
#[async_trait::async_trait]
pub trait PositioningSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_weeks(&self, currency: Currency) -> anyhow::Result<Vec<CotWeek>>;
}

/// Web search returning raw snippets, uninterpreted.
#[async_trait::async_trait]
pub trait NewsSearch: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<Snippet>>;
}

pub(crate) fn http_client(timeout: std::time::Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build source http client")
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Sends `req`, reads the body, and decodes it. Non-2xx responses are errors carrying the body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    req: reqwest::RequestBuilder,
    source: &str,
) -> anyhow::Result<T> {
    let res = req
        .send()
        .await
        .with_context(|| format!("{source} request failed"))?;

    let status = res.status();
    let text = res
        .text()
        .await
        .with_context(|| format!("failed to read {source} response"))?;
    if !status.is_success() {
        anyhow::bail!("{source} HTTP {status}: {text}");
    }

    serde_json::from_str::<T>(&text)
        .with_context(|| format!("{source} response is not in the expected shape: {text}"))
}
