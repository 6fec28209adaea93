use crate::domain::currency::{Currency, Pair};
use crate::domain::indicators::{CurrencyIndicators, MarketInputs, MissingSource};
use crate::domain::positioning::CotPositioning;
use crate::domain::score::{Bias, EconomicRegime, PairResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which inputs a run gathers, and whether the LLM step runs. Any combination is valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    #[serde(rename = "macro", default)]
    pub macro_data: bool,
    #[serde(default)]
    pub news: bool,
    #[serde(default)]
    pub links: bool,
    #[serde(default)]
    pub llm: bool,
}

impl AnalysisOptions {
    pub fn full() -> Self {
        Self {
            macro_data: true,
            news: true,
            links: true,
            llm: true,
        }
    }

    pub fn any_data(&self) -> bool {
        self.macro_data || self.news || self.links
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    Full,
    MacroOnly,
    NewsOnly,
    LinksOnly,
    ScoresOnly,
    Custom,
}

impl AnalysisType {
    pub fn from_options(o: &AnalysisOptions) -> Self {
        match (o.macro_data, o.news, o.links, o.llm) {
            (true, true, true, true) => AnalysisType::Full,
            (true, false, false, false) => AnalysisType::ScoresOnly,
            (true, false, false, true) => AnalysisType::MacroOnly,
            (false, true, false, _) => AnalysisType::NewsOnly,
            (false, false, true, _) => AnalysisType::LinksOnly,
            _ => AnalysisType::Custom,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisType::Full => "full",
            AnalysisType::MacroOnly => "macro_only",
            AnalysisType::NewsOnly => "news_only",
            AnalysisType::LinksOnly => "links_only",
            AnalysisType::ScoresOnly => "scores_only",
            AnalysisType::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            AnalysisType::Full,
            AnalysisType::MacroOnly,
            AnalysisType::NewsOnly,
            AnalysisType::LinksOnly,
            AnalysisType::ScoresOnly,
            AnalysisType::Custom,
        ]
        .into_iter()
        .find(|t| t.as_str() == s)
    }
}

/// One search hit, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsBundle {
    /// Outlook snippets keyed by the currency whose central bank they cover.
    #[serde(default)]
    pub central_banks: BTreeMap<Currency, Vec<Snippet>>,
    #[serde(default)]
    pub geopolitics: Vec<Snippet>,
    #[serde(default)]
    pub fx_outlook: Vec<Snippet>,
    #[serde(default)]
    pub calendar: Vec<Snippet>,
    #[serde(default)]
    pub missing: Vec<MissingSource>,
}

impl NewsBundle {
    pub fn snippet_count(&self) -> usize {
        self.central_banks.values().map(Vec::len).sum::<usize>()
            + self.geopolitics.len()
            + self.fx_outlook.len()
            + self.calendar.len()
    }
}

/// Everything gathered for one run, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub generated_at: DateTime<Utc>,
    pub pairs: Vec<Pair>,
    pub options: AnalysisOptions,
    #[serde(default)]
    pub currencies: BTreeMap<Currency, CurrencyIndicators>,
    #[serde(default)]
    pub market: Option<MarketInputs>,
    /// COT positioning for the currencies whose report could be fetched.
    #[serde(default)]
    pub positioning: BTreeMap<Currency, CotPositioning>,
    #[serde(default)]
    pub news: Option<NewsBundle>,
    #[serde(default)]
    pub links: Vec<String>,
}

impl AnalysisPayload {
    pub fn new(generated_at: DateTime<Utc>, pairs: Vec<Pair>, options: AnalysisOptions) -> Self {
        Self {
            generated_at,
            pairs,
            options,
            currencies: BTreeMap::new(),
            market: None,
            positioning: BTreeMap::new(),
            news: None,
            links: Vec::new(),
        }
    }

    /// True when no data section was gathered.
    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
            && self.market.is_none()
            && self.positioning.is_empty()
            && self.news.is_none()
            && self.links.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPair {
    pub pair: Pair,
    pub differential: i32,
    pub bias: Bias,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    pub top_bullish: Vec<RankedPair>,
    pub top_bearish: Vec<RankedPair>,
}

/// The `data` column of a stored analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisData {
    pub payload: AnalysisPayload,
    pub results: Vec<PairResult>,
    #[serde(default)]
    pub ranking: Ranking,
    #[serde(default)]
    pub regimes: Vec<EconomicRegime>,
    #[serde(default)]
    pub narrative: Option<String>,
}

/// A finished run. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: uuid::Uuid,
    pub analysis_datetime: DateTime<Utc>,
    pub user_id: Option<uuid::Uuid>,
    pub analysis_type: AnalysisType,
    pub options_selected: AnalysisOptions,
    pub data: AnalysisData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub id: uuid::Uuid,
    pub analysis_datetime: DateTime<Utc>,
    pub analysis_type: AnalysisType,
    pub options_selected: AnalysisOptions,
}

impl From<&AnalysisRecord> for AnalysisSummary {
    fn from(r: &AnalysisRecord) -> Self {
        Self {
            id: r.id,
            analysis_datetime: r.analysis_datetime,
            analysis_type: r.analysis_type,
            options_selected: r.options_selected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: uuid::Uuid,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    #[serde(default)]
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_use_macro_as_wire_name() {
        let o: AnalysisOptions =
            serde_json::from_value(json!({"macro": true, "llm": true})).unwrap();
        assert!(o.macro_data && o.llm && !o.news && !o.links);
        let v = serde_json::to_value(o).unwrap();
        assert_eq!(v["macro"], json!(true));
    }

    #[test]
    fn analysis_type_follows_options() {
        let t = |m, n, l, llm| {
            AnalysisType::from_options(&AnalysisOptions {
                macro_data: m,
                news: n,
                links: l,
                llm,
            })
        };
        assert_eq!(t(true, true, true, true), AnalysisType::Full);
        assert_eq!(t(true, false, false, false), AnalysisType::ScoresOnly);
        assert_eq!(t(true, false, false, true), AnalysisType::MacroOnly);
        assert_eq!(t(false, true, false, true), AnalysisType::NewsOnly);
        assert_eq!(t(false, false, true, false), AnalysisType::LinksOnly);
        assert_eq!(t(true, true, false, true), AnalysisType::Custom);
        assert_eq!(t(false, false, false, false), AnalysisType::Custom);
        assert_eq!(AnalysisType::parse("news_only"), Some(AnalysisType::NewsOnly));
    }

    #[test]
    fn empty_payload_has_no_sections() {
        let p = AnalysisPayload::new(Utc::now(), Pair::all(), AnalysisOptions::default());
        assert!(p.is_empty());
    }

    #[test]
    fn user_never_serializes_its_hash() {
        let u = User {
            id: uuid::Uuid::new_v4(),
            username: "mario".to_string(),
            password_hash: "abc".to_string(),
            email: None,
            is_active: true,
            created_at: Utc::now(),
        };
        let v = serde_json::to_value(&u).unwrap();
        assert!(v.get("password_hash").is_none());
    }
}
