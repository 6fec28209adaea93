use std::fmt;

/// Failure kinds that callers are expected to tell apart.
///
/// Everything else travels as plain `anyhow::Error`; these are wrapped into `anyhow` too and
/// recovered with `downcast_ref::<FxError>()` where the distinction matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FxError {
    /// A single indicator or news source could not be read. The run continues without it.
    SourceUnavailable { source: String, detail: String },
    /// The LLM step failed. Scores and payload are still valid.
    AnalysisUnavailable { provider: String, detail: String },
    /// Unknown user, inactive user, or wrong password.
    AuthenticationFailed { username: String },
    /// The history store rejected a write. The in-memory result is unaffected.
    PersistenceFailed { detail: String },
}

impl FxError {
    pub fn source_unavailable(source: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::SourceUnavailable {
            source: source.into(),
            detail: detail.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::AnalysisUnavailable { .. } => "analysis_unavailable",
            Self::AuthenticationFailed { .. } => "authentication_failed",
            Self::PersistenceFailed { .. } => "persistence_failed",
        }
    }
}

impl fmt::Display for FxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable { source, detail } => {
                write!(f, "source unavailable ({source}): {detail}")
            }
            Self::AnalysisUnavailable { provider, detail } => {
                write!(f, "analysis unavailable (provider={provider}): {detail}")
            }
            Self::AuthenticationFailed { username } => {
                write!(f, "authentication failed for user '{username}'")
            }
            Self::PersistenceFailed { detail } => write!(f, "persistence failed: {detail}"),
        }
    }
}

impl std::error::Error for FxError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_a_round_trip_through_anyhow() {
        let err: anyhow::Error = FxError::AuthenticationFailed {
            username: "mario".to_string(),
        }
        .into();
        let err = err.context("login");
        let fx = err.downcast_ref::<FxError>().unwrap();
        assert_eq!(fx.kind(), "authentication_failed");
        assert_eq!(fx.to_string(), "authentication failed for user 'mario'");
    }
}
