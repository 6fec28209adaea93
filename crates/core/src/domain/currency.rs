use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Chf,
    Aud,
    Cad,
}

/// How a currency tends to trade when global risk appetite shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskClass {
    SafeHaven,
    Cyclical,
    SemiCyclical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrencyProfile {
    pub name: &'static str,
    pub central_bank: &'static str,
    pub country: &'static str,
    pub risk_class: RiskClass,
    pub pmi_weights: PmiWeights,
}

/// Share of manufacturing vs services in the composite PMI, reflecting the economy's structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PmiWeights {
    pub manufacturing: f64,
    pub services: f64,
}

impl Currency {
    pub const ALL: [Currency; 7] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Chf,
        Currency::Aud,
        Currency::Cad,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Chf => "CHF",
            Currency::Aud => "AUD",
            Currency::Cad => "CAD",
        }
    }

    pub fn profile(self) -> CurrencyProfile {
        let (name, central_bank, country, risk_class, manufacturing, services) = match self {
            Currency::Usd => (
                "US Dollar",
                "Federal Reserve",
                "United States",
                RiskClass::SafeHaven,
                0.30,
                0.70,
            ),
            Currency::Eur => (
                "Euro",
                "ECB",
                "Euro Area",
                RiskClass::SemiCyclical,
                0.50,
                0.50,
            ),
            Currency::Gbp => (
                "British Pound",
                "Bank of England",
                "United Kingdom",
                RiskClass::Cyclical,
                0.20,
                0.80,
            ),
            Currency::Jpy => (
                "Japanese Yen",
                "Bank of Japan",
                "Japan",
                RiskClass::SafeHaven,
                0.60,
                0.40,
            ),
            // Only a manufacturing PMI is published for CHF and CAD.
            Currency::Chf => (
                "Swiss Franc",
                "SNB",
                "Switzerland",
                RiskClass::SafeHaven,
                1.00,
                0.00,
            ),
            Currency::Aud => (
                "Australian Dollar",
                "RBA",
                "Australia",
                RiskClass::Cyclical,
                0.50,
                0.50,
            ),
            Currency::Cad => (
                "Canadian Dollar",
                "Bank of Canada",
                "Canada",
                RiskClass::Cyclical,
                1.00,
                0.00,
            ),
        };

        CurrencyProfile {
            name,
            central_bank,
            country,
            risk_class,
            pmi_weights: PmiWeights {
                manufacturing,
                services,
            },
        }
    }

    pub fn risk_class(self) -> RiskClass {
        self.profile().risk_class
    }

    pub fn central_bank(self) -> &'static str {
        self.profile().central_bank
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .with_context(|| format!("unsupported currency: {s}"))
    }
}

/// An ordered base/quote combination drawn from [`SUPPORTED_PAIRS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pair {
    pub base: Currency,
    pub quote: Currency,
}

const fn pair(base: Currency, quote: Currency) -> Pair {
    Pair { base, quote }
}

pub const SUPPORTED_PAIRS: [Pair; 19] = {
    use Currency::*;
    [
        pair(Usd, Jpy),
        pair(Gbp, Jpy),
        pair(Aud, Jpy),
        pair(Eur, Jpy),
        pair(Cad, Jpy),
        pair(Aud, Usd),
        pair(Aud, Cad),
        pair(Gbp, Aud),
        pair(Eur, Aud),
        pair(Eur, Cad),
        pair(Gbp, Cad),
        pair(Usd, Chf),
        pair(Eur, Chf),
        pair(Gbp, Chf),
        pair(Cad, Chf),
        pair(Aud, Chf),
        pair(Eur, Usd),
        pair(Eur, Gbp),
        pair(Gbp, Usd),
    ]
};

impl Pair {
    pub fn new(base: Currency, quote: Currency) -> anyhow::Result<Self> {
        let candidate = pair(base, quote);
        if !SUPPORTED_PAIRS.contains(&candidate) {
            bail!("unsupported pair: {base}/{quote}");
        }
        Ok(candidate)
    }

    pub fn all() -> Vec<Pair> {
        SUPPORTED_PAIRS.to_vec()
    }

    /// Parses a comma-separated list such as `"EUR/USD, USD/JPY"`, dropping duplicates but
    /// keeping first-seen order.
    pub fn parse_list(s: &str) -> anyhow::Result<Vec<Pair>> {
        let mut out: Vec<Pair> = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let p: Pair = part.parse()?;
            if !out.contains(&p) {
                out.push(p);
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for Pair {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .trim()
            .split_once('/')
            .with_context(|| format!("pair must look like BASE/QUOTE (got {s:?})"))?;
        Pair::new(base.parse()?, quote.parse()?)
    }
}

impl TryFrom<String> for Pair {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pair> for String {
    fn from(value: Pair) -> Self {
        value.to_string()
    }
}

/// Distinct currencies referenced by `pairs`, in a stable order.
pub fn currencies_of(pairs: &[Pair]) -> BTreeSet<Currency> {
    pairs
        .iter()
        .flat_map(|p| [p.base, p.quote])
        .collect::<BTreeSet<_>>()
}
