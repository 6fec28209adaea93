//! One analysis run end to end: aggregate, score, rank, optionally narrate, optionally persist.

use crate::aggregate::Aggregator;
use crate::config::Settings;
use crate::domain::currency::Pair;
use crate::domain::record::{AnalysisData, AnalysisOptions, AnalysisRecord, AnalysisType};
use crate::error::FxError;
use crate::llm::anthropic::AnthropicClient;
use crate::llm::requestor::AnalysisRequestor;
use crate::llm::Provider;
use crate::scoring;
use crate::storage::HistoryStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub pairs: Vec<Pair>,
    pub options: AnalysisOptions,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub user_id: Option<uuid::Uuid>,
}

/// The record is always present. The two error slots report steps that failed after scoring.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub record: AnalysisRecord,
    pub llm_error: Option<FxError>,
    pub persistence_warning: Option<FxError>,
    pub persisted: bool,
}

#[derive(Clone)]
pub struct AnalysisService {
    aggregator: Aggregator,
    requestor: Option<AnalysisRequestor>,
    history: Option<Arc<dyn HistoryStore>>,
}

impl AnalysisService {
    pub fn new(
        aggregator: Aggregator,
        requestor: Option<AnalysisRequestor>,
        history: Option<Arc<dyn HistoryStore>>,
    ) -> Self {
        Self {
            aggregator,
            requestor,
            history,
        }
    }

    /// The LLM client is optional here; a run that asks for it without a key reports
    /// `AnalysisUnavailable` instead of failing to start.
    pub fn from_settings(
        settings: &Settings,
        history: Option<Arc<dyn HistoryStore>>,
    ) -> anyhow::Result<Self> {
        let aggregator = Aggregator::from_settings(settings)?;
        let requestor = if settings.anthropic_api_key.is_some() {
            Some(AnalysisRequestor::new(Arc::new(
                AnthropicClient::from_settings(settings)?,
            )))
        } else {
            tracing::info!("ANTHROPIC_API_KEY not set; narrative analysis disabled");
            None
        };
        Ok(Self::new(aggregator, requestor, history))
    }

    pub async fn run_analysis(&self, request: AnalysisRequest) -> anyhow::Result<AnalysisOutcome> {
        self.run_analysis_at(request, Utc::now()).await
    }

    pub async fn run_analysis_at(
        &self,
        request: AnalysisRequest,
        now: DateTime<Utc>,
    ) -> anyhow::Result<AnalysisOutcome> {
        let mut pairs = Vec::with_capacity(request.pairs.len());
        for p in request.pairs {
            if !pairs.contains(&p) {
                pairs.push(p);
            }
        }
        anyhow::ensure!(!pairs.is_empty(), "at least one pair is required");
        let options = request.options;

        let payload = self
            .aggregator
            .aggregate_at(&pairs, options, &request.links, now)
            .await;
        let results = scoring::score_all(&payload);
        let ranking = scoring::rank(&results);
        let regimes = scoring::economic_regimes(&payload);

        let mut narrative = None;
        let mut llm_error = None;
        if options.llm {
            if payload.is_empty() {
                tracing::warn!("LLM requested without any data section; skipping");
            } else {
                match &self.requestor {
                    Some(requestor) => match requestor.request_analysis(&payload, &results).await {
                        Ok(text) => narrative = Some(text),
                        Err(err) => llm_error = Some(err),
                    },
                    None => {
                        llm_error = Some(FxError::AnalysisUnavailable {
                            provider: Provider::Anthropic.to_string(),
                            detail: "ANTHROPIC_API_KEY is not configured".to_string(),
                        })
                    }
                }
            }
        }

        let record = AnalysisRecord {
            id: uuid::Uuid::new_v4(),
            analysis_datetime: now,
            user_id: request.user_id,
            analysis_type: AnalysisType::from_options(&options),
            options_selected: options,
            data: AnalysisData {
                payload,
                results,
                ranking,
                regimes,
                narrative,
            },
        };

        let mut persisted = false;
        let mut persistence_warning = None;
        if let (Some(history), Some(_)) = (&self.history, record.user_id) {
            match history.save(&record).await {
                Ok(()) => persisted = true,
                Err(err) => {
                    tracing::warn!(record_id = %record.id, error = %format!("{err:#}"), "failed to persist analysis");
                    persistence_warning = Some(FxError::PersistenceFailed {
                        detail: format!("{err:#}"),
                    });
                }
            }
        }

        tracing::info!(
            record_id = %record.id,
            analysis_type = record.analysis_type.as_str(),
            pairs = record.data.results.len(),
            narrative = record.data.narrative.is_some(),
            llm_failed = llm_error.is_some(),
            persisted,
            "analysis finished"
        );

        Ok(AnalysisOutcome {
            record,
            llm_error,
            persistence_warning,
            persisted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::currency::Currency;
    use crate::domain::indicators::{CurrencyIndicators, MarketInputs, Observation};
    use crate::domain::record::AnalysisSummary;
    use crate::ingest::IndicatorSource;
    use crate::llm::{CompletionRequest, LlmClient};
    use crate::storage::MemoryHistoryStore;

    struct FixedRates;

    #[async_trait::async_trait]
    impl IndicatorSource for FixedRates {
        fn source_name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_indicators(&self, currency: Currency) -> CurrencyIndicators {
            let mut out = CurrencyIndicators::empty(currency);
            let rate = match currency {
                Currency::Usd => 4.5,
                Currency::Jpy => 0.5,
                _ => 2.0,
            };
            out.interest_rate = Some(Observation::new(rate, "fixed"));
            out
        }

        async fn fetch_market(&self) -> MarketInputs {
            MarketInputs::default()
        }
    }

    struct DownLlm;

    #[async_trait::async_trait]
    impl LlmClient for DownLlm {
        fn provider(&self) -> Provider {
            Provider::Anthropic
        }

        async fn complete(&self, _request: CompletionRequest) -> anyhow::Result<String> {
            anyhow::bail!("503 from upstream")
        }
    }

    struct BrokenHistory;

    #[async_trait::async_trait]
    impl HistoryStore for BrokenHistory {
        async fn save(&self, _record: &AnalysisRecord) -> anyhow::Result<()> {
            anyhow::bail!("connection reset")
        }
        async fn list(&self, _user_id: uuid::Uuid) -> anyhow::Result<Vec<AnalysisSummary>> {
            Ok(Vec::new())
        }
        async fn get(&self, _id: uuid::Uuid) -> anyhow::Result<Option<AnalysisRecord>> {
            Ok(None)
        }
        async fn delete(&self, _id: uuid::Uuid, _user_id: uuid::Uuid) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    fn aggregator() -> Aggregator {
        Aggregator::new(Arc::new(FixedRates), None, None, 3)
    }

    fn request(options: AnalysisOptions, user_id: Option<uuid::Uuid>) -> AnalysisRequest {
        AnalysisRequest {
            pairs: vec!["USD/JPY".parse().unwrap(), "USD/JPY".parse().unwrap()],
            options,
            links: Vec::new(),
            user_id,
        }
    }

    #[tokio::test]
    async fn llm_failure_keeps_the_scores() {
        let service = AnalysisService::new(
            aggregator(),
            Some(AnalysisRequestor::new(Arc::new(DownLlm))),
            None,
        );
        let options = AnalysisOptions {
            macro_data: true,
            llm: true,
            ..Default::default()
        };
        let out = service.run_analysis(request(options, None)).await.unwrap();

        assert!(matches!(
            out.llm_error,
            Some(FxError::AnalysisUnavailable { .. })
        ));
        assert_eq!(out.record.analysis_type, AnalysisType::MacroOnly);
        assert_eq!(out.record.data.results.len(), 1);
        let r = &out.record.data.results[0];
        // 400 bp spread in favour of USD.
        assert_eq!((r.base.current_rate, r.quote.current_rate), (1, -1));
        assert_eq!(r.differential, 2);
        assert!(out.record.data.narrative.is_none());
    }

    #[tokio::test]
    async fn llm_without_key_reports_unavailable() {
        let service = AnalysisService::new(aggregator(), None, None);
        let out = service
            .run_analysis(request(AnalysisOptions::full(), None))
            .await
            .unwrap();
        assert_eq!(
            out.llm_error.as_ref().map(FxError::kind),
            Some("analysis_unavailable")
        );
        assert_eq!(out.record.analysis_type, AnalysisType::Full);
    }

    #[tokio::test]
    async fn persistence_failure_is_a_warning() {
        let service = AnalysisService::new(aggregator(), None, Some(Arc::new(BrokenHistory)));
        let options = AnalysisOptions {
            macro_data: true,
            ..Default::default()
        };
        let out = service
            .run_analysis(request(options, Some(uuid::Uuid::new_v4())))
            .await
            .unwrap();
        assert!(!out.persisted);
        assert!(matches!(
            out.persistence_warning,
            Some(FxError::PersistenceFailed { .. })
        ));
        assert_eq!(out.record.data.results.len(), 1);
    }

    #[tokio::test]
    async fn saves_only_runs_with_an_owner() {
        let history = Arc::new(MemoryHistoryStore::new());
        let service = AnalysisService::new(aggregator(), None, Some(history.clone()));
        let options = AnalysisOptions {
            macro_data: true,
            ..Default::default()
        };
        let user = uuid::Uuid::new_v4();

        let anon = service.run_analysis(request(options, None)).await.unwrap();
        assert!(!anon.persisted);
        let owned = service
            .run_analysis(request(options, Some(user)))
            .await
            .unwrap();
        assert!(owned.persisted);

        let listed = history.list(user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, owned.record.id);
    }

    #[tokio::test]
    async fn rejects_an_empty_pair_list() {
        let service = AnalysisService::new(aggregator(), None, None);
        let req = AnalysisRequest {
            pairs: Vec::new(),
            options: AnalysisOptions::full(),
            links: Vec::new(),
            user_id: None,
        };
        assert!(service.run_analysis(req).await.is_err());
    }
}
