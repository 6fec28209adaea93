use crate::domain::record::AnalysisPayload;
use crate::domain::score::PairResult;
use crate::error::FxError;
use crate::llm::{prompt, LlmClient};
use std::sync::Arc;

/// Formats a payload into the prompt and submits it. Any failure becomes
/// [`FxError::AnalysisUnavailable`]; the caller's scores are never touched.
#[derive(Clone)]
pub struct AnalysisRequestor {
    client: Arc<dyn LlmClient>,
}

impl AnalysisRequestor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub async fn request_analysis(
        &self,
        payload: &AnalysisPayload,
        results: &[PairResult],
    ) -> Result<String, FxError> {
        let provider = self.client.provider();
        let unavailable = |err: anyhow::Error| FxError::AnalysisUnavailable {
            provider: provider.to_string(),
            detail: format!("{err:#}"),
        };

        let request = prompt::render(payload, results).map_err(unavailable)?;
        let started = std::time::Instant::now();
        match self.client.complete(request).await {
            Ok(text) => {
                tracing::info!(
                    %provider,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    chars = text.len(),
                    "analysis received"
                );
                Ok(text)
            }
            Err(err) => {
                tracing::warn!(%provider, error = %err, "analysis request failed");
                Err(unavailable(err))
            }
        }
    }
}
