//! Joins indicators, PMI, news and caller links into one payload per run.

use crate::config::Settings;
use crate::domain::currency::{currencies_of, Currency, Pair};
use crate::domain::indicators::{CurrencyIndicators, MissingSource};
use crate::domain::positioning::CotPositioning;
use crate::domain::record::{AnalysisOptions, AnalysisPayload, NewsBundle, Snippet};
use crate::error::FxError;
use crate::ingest::cot::CftcClient;
use crate::ingest::macro_source::MacroIndicatorSource;
use crate::ingest::pmi::HttpPmiProvider;
use crate::ingest::search::{queries, HttpSearchClient};
use crate::ingest::{signals, IndicatorSource, NewsSearch, PmiSource, PositioningSource};
use crate::scoring::cot;
use chrono::{DateTime, Datelike, Utc};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Hits kept per query in the non-central-bank groups.
const SECONDARY_MAX_RESULTS: usize = 2;

#[derive(Clone)]
pub struct Aggregator {
    indicators: Arc<dyn IndicatorSource>,
    pmi: Option<Arc<dyn PmiSource>>,
    positioning: Option<Arc<dyn PositioningSource>>,
    search: Option<Arc<dyn NewsSearch>>,
    search_max_results: usize,
}

impl Aggregator {
    pub fn new(
        indicators: Arc<dyn IndicatorSource>,
        pmi: Option<Arc<dyn PmiSource>>,
        search: Option<Arc<dyn NewsSearch>>,
        search_max_results: usize,
    ) -> Self {
        Self {
            indicators,
            pmi,
            positioning: None,
            search,
            search_max_results: search_max_results.max(1),
        }
    }

    /// COT positioning is fetched alongside the macro section.
    pub fn with_positioning(mut self, source: Arc<dyn PositioningSource>) -> Self {
        self.positioning = Some(source);
        self
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let indicators: Arc<dyn IndicatorSource> =
            Arc::new(MacroIndicatorSource::from_settings(settings)?);
        let pmi = HttpPmiProvider::from_settings(settings)?
            .map(|p| Arc::new(p) as Arc<dyn PmiSource>);
        let search = HttpSearchClient::from_settings(settings)?
            .map(|s| Arc::new(s) as Arc<dyn NewsSearch>);
        if pmi.is_none() {
            tracing::info!("PMI_PROVIDER_BASE_URL not set; PMI will be missing");
        }
        if search.is_none() {
            tracing::info!("SEARCH_API_BASE_URL not set; news will be missing");
        }
        let cot: Arc<dyn PositioningSource> = Arc::new(CftcClient::from_settings(settings)?);
        Ok(Self::new(indicators, pmi, search, settings.search_max_results()).with_positioning(cot))
    }

    pub async fn aggregate(
        &self,
        pairs: &[Pair],
        options: AnalysisOptions,
        links: &[String],
    ) -> AnalysisPayload {
        self.aggregate_at(pairs, options, links, Utc::now()).await
    }

    /// Each enabled section is fetched once per currency, however many pairs share it.
    pub async fn aggregate_at(
        &self,
        pairs: &[Pair],
        options: AnalysisOptions,
        links: &[String],
        now: DateTime<Utc>,
    ) -> AnalysisPayload {
        let mut payload = AnalysisPayload::new(now, pairs.to_vec(), options);
        let currencies: Vec<Currency> = currencies_of(pairs).into_iter().collect();

        if options.macro_data && !currencies.is_empty() {
            let per_currency = join_all(currencies.iter().map(|c| self.macro_for(*c)));
            let (per_currency, market) =
                futures::join!(per_currency, self.indicators.fetch_market());
            for (data, positioning) in per_currency {
                if let Some(p) = positioning {
                    payload.positioning.insert(p.currency, p);
                }
                payload.currencies.insert(data.currency, data);
            }
            payload.market = Some(market);
        }

        if options.news {
            let news = self.news_for(&currencies, now.year()).await;
            for (currency, snippets) in &news.central_banks {
                let entry = payload
                    .currencies
                    .entry(*currency)
                    .or_insert_with(|| CurrencyIndicators::empty(*currency));
                entry.rate_outlook = signals::rate_outlook(snippets);
                entry.fiscal_stance = signals::fiscal_stance(snippets);
            }
            payload.news = Some(news);
        }

        if options.links {
            payload.links = links
                .iter()
                .filter(|l| !l.trim().is_empty())
                .cloned()
                .collect();
        }

        tracing::info!(
            pairs = payload.pairs.len(),
            currencies = payload.currencies.len(),
            positioning = payload.positioning.len(),
            news_snippets = payload.news.as_ref().map(NewsBundle::snippet_count).unwrap_or(0),
            links = payload.links.len(),
            "payload aggregated"
        );
        payload
    }

    async fn macro_for(&self, currency: Currency) -> (CurrencyIndicators, Option<CotPositioning>) {
        let (mut data, pmi, weeks) = futures::join!(
            self.indicators.fetch_indicators(currency),
            async {
                match &self.pmi {
                    Some(p) => Some(p.fetch_pmi(currency).await),
                    None => None,
                }
            },
            async {
                match &self.positioning {
                    Some(p) => Some((p.source_name(), p.fetch_weeks(currency).await)),
                    None => None,
                }
            }
        );

        match pmi {
            Some(Ok(snapshot)) => {
                data.pmi_manufacturing = snapshot.manufacturing;
                data.pmi_services = snapshot.services;
            }
            Some(Err(err)) => {
                let fx = FxError::source_unavailable("pmi_provider", format!("{err:#}"));
                tracing::warn!(%currency, error = %fx, "PMI missing");
                data.mark_missing("pmi", "pmi_provider", format!("{err:#}"));
            }
            None => data.mark_missing("pmi", "pmi_provider", "PMI provider not configured"),
        }

        let positioning = match weeks {
            Some((_, Ok(weeks))) => {
                let p = cot::positioning(currency, &weeks);
                tracing::info!(
                    %currency,
                    net = p.net_position,
                    index = p.cot_index,
                    score = p.score,
                    weeks = p.weeks_available,
                    "COT positioning"
                );
                Some(p)
            }
            Some((source, Err(err))) => {
                let fx = FxError::source_unavailable(source, format!("{err:#}"));
                tracing::warn!(%currency, error = %fx, "COT positioning missing");
                data.mark_missing("cot", source, format!("{err:#}"));
                None
            }
            None => None,
        };
        (data, positioning)
    }

    async fn news_for(&self, currencies: &[Currency], year: i32) -> NewsBundle {
        let mut bundle = NewsBundle::default();
        let Some(search) = self.search.as_ref() else {
            bundle.missing.push(MissingSource {
                indicator: "news".to_string(),
                source: "web_search".to_string(),
                reason: "search API not configured".to_string(),
            });
            tracing::warn!("news requested but no search API is configured");
            return bundle;
        };

        let cb_jobs = currencies.iter().map(|c| {
            let qs = queries::central_bank(*c, year);
            async move { (*c, self.run_queries(search.as_ref(), &qs, self.search_max_results).await) }
        });
        let (geo_qs, fx_qs, cal_qs) = (
            queries::geopolitics(year),
            queries::fx_outlook(year),
            queries::calendar(year),
        );
        let (cb, geo, fx, cal) = futures::join!(
            join_all(cb_jobs),
            self.run_queries(search.as_ref(), &geo_qs, SECONDARY_MAX_RESULTS),
            self.run_queries(search.as_ref(), &fx_qs, SECONDARY_MAX_RESULTS),
            self.run_queries(search.as_ref(), &cal_qs, 1),
        );

        let mut missing = Vec::new();
        let mut central_banks = BTreeMap::new();
        for (currency, (snippets, mut failed)) in cb {
            central_banks.insert(currency, snippets);
            missing.append(&mut failed);
        }
        let mut take = |(snippets, mut failed): (Vec<Snippet>, Vec<MissingSource>)| {
            missing.append(&mut failed);
            snippets
        };
        bundle.geopolitics = take(geo);
        bundle.fx_outlook = take(fx);
        bundle.calendar = take(cal);
        bundle.central_banks = central_banks;
        bundle.missing = missing;
        bundle
    }

    async fn run_queries(
        &self,
        search: &dyn NewsSearch,
        qs: &[String],
        max_results: usize,
    ) -> (Vec<Snippet>, Vec<MissingSource>) {
        let results = join_all(qs.iter().map(|q| search.search(q, max_results))).await;
        let mut snippets = Vec::new();
        let mut missing = Vec::new();
        for (q, res) in qs.iter().zip(results) {
            match res {
                Ok(mut hits) => snippets.append(&mut hits),
                Err(err) => {
                    let fx = FxError::source_unavailable(search.source_name(), format!("{err:#}"));
                    tracing::warn!(query = %q, error = %fx, "news query failed");
                    missing.push(MissingSource {
                        indicator: format!("news: {q}"),
                        source: search.source_name().to_string(),
                        reason: format!("{err:#}"),
                    });
                }
            }
        }
        (snippets, missing)
    }
}
