//! Deterministic prompt rendering. The same payload and scores always produce the same text.

use crate::domain::currency::Currency;
use crate::domain::record::AnalysisPayload;
use crate::domain::score::PairResult;
use crate::llm::CompletionRequest;
use anyhow::Context;
use std::fmt::Write as _;

pub fn system_prompt() -> String {
    [
        "You are a senior forex macro analyst.",
        "You receive macroeconomic indicators, central-bank outlook snippets, and a deterministic",
        "score matrix for a set of currency pairs. The scores are authoritative: explain them,",
        "do not recompute them.",
        "For each pair give the bias, the two or three drivers that matter most, and the main risk",
        "to the view. Mention missing data where it weakens a conclusion.",
        "Finish with a short list of upcoming events worth watching in the next 30 days.",
    ]
    .join("\n")
}

fn currency_lines(payload: &AnalysisPayload) -> String {
    let mut out = String::new();
    for c in Currency::ALL {
        if !payload.pairs.iter().any(|p| p.base == c || p.quote == c) {
            continue;
        }
        let profile = c.profile();
        let _ = writeln!(
            out,
            "- {c}: {} ({}), {:?}",
            profile.name, profile.central_bank, profile.risk_class
        );
    }
    out
}

fn score_table(results: &[PairResult]) -> String {
    let mut out = String::from("pair | base total | quote total | differential | bias\n");
    for r in results {
        let _ = writeln!(
            out,
            "{} | {} | {} | {:+} | {}",
            r.pair,
            r.base.total(),
            r.quote.total(),
            r.differential,
            r.bias
        );
    }
    out
}

pub fn user_prompt(payload: &AnalysisPayload, results: &[PairResult]) -> anyhow::Result<String> {
    let data = serde_json::to_string_pretty(payload).context("failed to serialize payload")?;
    let pairs = payload
        .pairs
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "Date: {date}\n\
Pairs: {pairs}\n\n\
Currencies:\n{currencies}\n\
Score matrix:\n{scores}\n\
Data (JSON):\n{data}\n",
        date = payload.generated_at.format("%Y-%m-%d"),
        currencies = currency_lines(payload),
        scores = score_table(results),
    ))
}

pub fn render(payload: &AnalysisPayload, results: &[PairResult]) -> anyhow::Result<CompletionRequest> {
    Ok(CompletionRequest {
        system: system_prompt(),
        user: user_prompt(payload, results)?,
    })
}
