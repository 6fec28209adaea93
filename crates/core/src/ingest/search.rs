use crate::config::Settings;
use crate::domain::currency::Currency;
use crate::domain::record::Snippet;
use crate::ingest::types::SearchResponse;
use crate::ingest::{http_client, join_url, send_json, NewsSearch};
use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue};

/// Longest snippet text kept per hit.
pub const SNIPPET_MAX_CHARS: usize = 400;

/// Generic JSON web search: `GET {base}/search?q=..&count=N` -> `{results: [{title, snippet, url}]}`.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSearchClient {
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(base_url) = settings.search_api_base_url.clone() else {
            return Ok(None);
        };
        let http = http_client(settings.source_timeout())?;
        Ok(Some(Self::new(http, base_url, settings.search_api_key.clone())))
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
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[async_trait::async_trait]
impl NewsSearch for HttpSearchClient {
    fn source_name(&self) -> &'static str {
        "web_search"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>> {
        let count = max_results.to_string();
        let req = self
            .http
            .get(join_url(&self.base_url, "/search"))
            .headers(self.headers()?)
            .query(&[("q", query), ("count", count.as_str())]);

        let parsed: SearchResponse = send_json(req, self.source_name()).await?;
        Ok(parsed
            .results
            .into_iter()
            .filter(|h| !h.title.trim().is_empty() || !h.snippet.trim().is_empty())
            .take(max_results)
            .map(|h| Snippet {
                title: h.title.trim().to_string(),
                snippet: truncate_chars(h.snippet.trim(), SNIPPET_MAX_CHARS),
                url: h.url,
            })
            .collect())
    }
}

/// Templated queries, seeded with the run's year so results stay current.
pub mod queries {
    use super::Currency;

    pub fn central_bank(currency: Currency, year: i32) -> Vec<String> {
        let next = year + 1;
        match currency {
            Currency::Usd => vec![
                format!("Federal Reserve interest rate decision {year}"),
                format!("Fed rate cuts {next} forecast expectations"),
                format!("FOMC statement dovish hawkish {year}"),
                format!("US economy outlook {next}"),
            ],
            Currency::Eur => vec![
                format!("ECB interest rate decision {year}"),
                format!("ECB rate cuts {next} Lagarde forecast"),
                format!("Eurozone economy outlook {next}"),
            ],
            Currency::Gbp => vec![
                format!("Bank of England rate decision {year}"),
                format!("BoE interest rate forecast {next}"),
                format!("UK economy inflation outlook {next}"),
            ],
            Currency::Jpy => vec![
                format!("Bank of Japan rate hike {year} Ueda"),
                format!("BoJ monetary policy outlook {next}"),
                "Japan inflation wage growth".to_string(),
            ],
            Currency::Chf => vec![
                format!("SNB Swiss National Bank rate decision {year}"),
                format!("Switzerland interest rate outlook {next}"),
                "Swiss franc safe haven".to_string(),
            ],
            Currency::Aud => vec![
                format!("RBA Reserve Bank Australia rate decision {year}"),
                format!("Australia interest rate forecast {next}"),
                "AUD China commodities outlook".to_string(),
            ],
            Currency::Cad => vec![
                format!("Bank of Canada rate decision {year}"),
                format!("BoC interest rate forecast {next}"),
                "Canada economy oil outlook".to_string(),
            ],
        }
    }

    pub fn geopolitics(year: i32) -> Vec<String> {
        vec![
            format!("geopolitical risk {year} market forex"),
            format!("US China trade tariffs {year}"),
            format!("global recession risk {year}"),
        ]
    }

    pub fn fx_outlook(year: i32) -> Vec<String> {
        let next = year + 1;
        vec![
            format!("EUR USD forecast {next}"),
            format!("USD JPY outlook {next}"),
            format!("major currencies forecast {next}"),
        ]
    }

    pub fn calendar(year: i32) -> Vec<String> {
        vec![
            format!("FOMC meeting schedule {year}"),
            format!("ECB meeting schedule {year}"),
            format!("central bank meetings {year} calendar"),
        ]
    }
}
