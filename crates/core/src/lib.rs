pub mod aggregate;
pub mod auth;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod scoring;
pub mod storage;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 20;
    const DEFAULT_SEARCH_MAX_RESULTS: usize = 3;
    const DEFAULT_PORT: u16 = 3000;

    /// Process-wide configuration, built once and handed to every component constructor.
    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub port: Option<u16>,

        pub anthropic_api_key: Option<String>,
        pub anthropic_base_url: Option<String>,
        pub anthropic_model: Option<String>,
        pub anthropic_max_tokens: Option<u32>,
        pub anthropic_timeout_secs: Option<u64>,

        pub fred_api_key: Option<String>,
        pub fred_base_url: Option<String>,
        pub ecb_base_url: Option<String>,
        pub boc_base_url: Option<String>,
        pub cot_base_url: Option<String>,

        pub pmi_provider_base_url: Option<String>,
        pub pmi_provider_api_key: Option<String>,

        pub search_api_base_url: Option<String>,
        pub search_api_key: Option<String>,
        pub search_max_results: usize,

        pub source_timeout_secs: u64,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: env_opt("DATABASE_URL"),
                sentry_dsn: env_opt("SENTRY_DSN"),
                port: env_parse("PORT")?,
                anthropic_api_key: env_opt("ANTHROPIC_API_KEY"),
                anthropic_base_url: env_opt("ANTHROPIC_BASE_URL"),
                anthropic_model: env_opt("ANTHROPIC_MODEL"),
                anthropic_max_tokens: env_parse("ANTHROPIC_MAX_TOKENS")?,
                anthropic_timeout_secs: env_parse("ANTHROPIC_TIMEOUT_SECS")?,
                fred_api_key: env_opt("FRED_API_KEY"),
                fred_base_url: env_opt("FRED_BASE_URL"),
                ecb_base_url: env_opt("ECB_BASE_URL"),
                boc_base_url: env_opt("BOC_BASE_URL"),
                cot_base_url: env_opt("COT_BASE_URL"),
                pmi_provider_base_url: env_opt("PMI_PROVIDER_BASE_URL"),
                pmi_provider_api_key: env_opt("PMI_PROVIDER_API_KEY"),
                search_api_base_url: env_opt("SEARCH_API_BASE_URL"),
                search_api_key: env_opt("SEARCH_API_KEY"),
                search_max_results: env_parse("SEARCH_MAX_RESULTS")?
                    .unwrap_or(DEFAULT_SEARCH_MAX_RESULTS),
                source_timeout_secs: env_parse("SOURCE_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_SOURCE_TIMEOUT_SECS),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        /// Listen port of the API binary.
        pub fn port(&self) -> u16 {
            self.port.unwrap_or(DEFAULT_PORT)
        }

        pub fn source_timeout(&self) -> Duration {
            let secs = if self.source_timeout_secs == 0 {
                DEFAULT_SOURCE_TIMEOUT_SECS
            } else {
                self.source_timeout_secs
            };
            Duration::from_secs(secs)
        }

        pub fn search_max_results(&self) -> usize {
            if self.search_max_results == 0 {
                DEFAULT_SEARCH_MAX_RESULTS
            } else {
                self.search_max_results
            }
        }
    }

    fn env_opt(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env_opt(key) {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| anyhow::anyhow!("{key} is not valid ({raw}): {e}")),
            None => Ok(None),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn zero_values_fall_back_to_defaults() {
            let settings = Settings::default();
            assert_eq!(settings.source_timeout(), Duration::from_secs(20));
            assert_eq!(settings.search_max_results(), 3);
            assert_eq!(settings.port(), 3000);

            let settings = Settings {
                port: Some(8080),
                ..Default::default()
            };
            assert_eq!(settings.port(), 8080);
        }

        #[test]
        fn missing_required_keys_are_reported_by_name() {
            let settings = Settings::default();
            let err = settings.require_anthropic_api_key().unwrap_err();
            assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
            let err = settings.require_database_url().unwrap_err();
            assert!(err.to_string().contains("DATABASE_URL"));
        }
    }
}
