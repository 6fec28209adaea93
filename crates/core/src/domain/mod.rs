pub mod currency;
pub mod indicators;
pub mod positioning;
pub mod record;
pub mod score;

pub use currency::{Currency, Pair, RiskClass, SUPPORTED_PAIRS};
pub use indicators::{CurrencyIndicators, MarketInputs, Observation, RiskRegime, Trend};
pub use record::{AnalysisOptions, AnalysisPayload, AnalysisRecord, AnalysisType};
pub use score::{Bias, PairResult, ScoreSet};
