//! Deterministic signals pulled out of central-bank news snippets.

use crate::domain::indicators::{FiscalStance, RateOutlook, RateStance};
use crate::domain::record::Snippet;
use regex::Regex;
use std::sync::OnceLock;

const HAWKISH_TERMS: &[&str] = &[
    "hawkish",
    "rate hikes?",
    "raise rates",
    "raising rates",
    "tightening",
    "higher for longer",
];

const DOVISH_TERMS: &[&str] = &[
    "dovish",
    "rate cuts?",
    "cut rates",
    "cutting rates",
    "easing",
    "lower rates",
];

/// Words that turn "NN% chance of a cut" into the opposite.
const NEGATIONS: &[&str] = &["no", "not", "without"];

fn whole_words(terms: &[&str]) -> Regex {
    Regex::new(&format!(r"(?i)\b(?:{})\b", terms.join("|"))).expect("valid regex")
}

fn term_patterns() -> &'static (Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| (whole_words(HAWKISH_TERMS), whole_words(DOVISH_TERMS)))
}

fn cut_probability_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // "70% chance of a rate cut", "65 % probability of cut"; `qual` is checked for negations
            Regex::new(
                r"(?i)(\d{1,3}(?:\.\d+)?)\s*%\s*(?:chance|probability|odds|likelihood)\s+(?:of\s+)?(?:an?\s+)?(?:(?P<qual>\w+)\s+)?(?:rate\s+)?cut",
            )
            .expect("valid regex"),
            // "probability of a cut at 40%"
            Regex::new(
                r"(?i)(?:chance|probability|odds|likelihood)\s+of\s+(?:an?\s+)?(?:rate\s+)?cut\s+(?:\w+\s+){0,3}?(\d{1,3}(?:\.\d+)?)\s*%",
            )
            .expect("valid regex"),
        ]
    })
}

fn text_of(snippet: &Snippet) -> String {
    format!("{} {}", snippet.title, snippet.snippet).to_lowercase()
}

fn count_terms(text: &str, pattern: &Regex) -> usize {
    pattern.find_iter(text).count()
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.iter().any(|n| word.eq_ignore_ascii_case(n))
}

/// Net hawkish-minus-dovish tally mapped onto the five stance tags. `None` when no term appears.
pub fn stance(snippets: &[Snippet]) -> Option<RateStance> {
    let (hawkish, dovish) = term_patterns();
    let (mut hawk, mut dove) = (0usize, 0usize);
    for s in snippets {
        let text = text_of(s);
        hawk += count_terms(&text, hawkish);
        dove += count_terms(&text, dovish);
    }
    if hawk + dove == 0 {
        return None;
    }

    let net = hawk as i64 - dove as i64;
    Some(match net {
        n if n >= 3 => RateStance::Hawkish,
        1..=2 => RateStance::NeutralHawkish,
        0 => RateStance::Neutral,
        -2..=-1 => RateStance::NeutralDovish,
        _ => RateStance::Dovish,
    })
}

/// First cut probability quoted in the snippets, in order. Negated quotes
/// ("90% chance of no cut") are skipped.
pub fn cut_probability(snippets: &[Snippet]) -> Option<f64> {
    snippets.iter().find_map(|s| {
        let text = format!("{} {}", s.title, s.snippet);
        cut_probability_patterns().iter().find_map(|re| {
            re.captures_iter(&text)
                .filter(|c| !c.name("qual").is_some_and(|q| is_negation(q.as_str())))
                .find_map(|c| {
                    c.get(1)
                        .and_then(|m| m.as_str().parse::<f64>().ok())
                        .filter(|p| (0.0..=100.0).contains(p))
                })
        })
    })
}

pub fn fiscal_stance(snippets: &[Snippet]) -> Option<FiscalStance> {
    let (mut surplus, mut deficit) = (0usize, 0usize);
    for s in snippets {
        let text = text_of(s);
        surplus += text.matches("current account surplus").count();
        deficit += text.matches("current account deficit").count();
    }
    match surplus.cmp(&deficit) {
        std::cmp::Ordering::Greater => Some(FiscalStance::Surplus),
        std::cmp::Ordering::Less => Some(FiscalStance::Deficit),
        std::cmp::Ordering::Equal => None,
    }
}

pub fn rate_outlook(snippets: &[Snippet]) -> RateOutlook {
    RateOutlook {
        stance: stance(snippets),
        cut_probability: cut_probability(snippets),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snip(title: &str, body: &str) -> Snippet {
        Snippet {
            title: title.to_string(),
            snippet: body.to_string(),
            url: String::new(),
        }
    }

    #[test]
    fn tallies_stance() {
        let s = vec![
            snip("Fed signals rate cut", "Markets see easing ahead; dovish tone"),
            snip("Powell", "No tightening planned"),
        ];
        assert_eq!(stance(&s), Some(RateStance::NeutralDovish));

        let h = vec![snip(
            "BoJ hawkish",
            "rate hike likely, further tightening, higher for longer",
        )];
        assert_eq!(stance(&h), Some(RateStance::Hawkish));

        assert_eq!(stance(&[snip("Weather", "sunny")]), None);
    }

    #[test]
    fn extracts_cut_probability() {
        let s = vec![
            snip("Nothing here", ""),
            snip("Futures", "Traders price a 72% chance of a rate cut in December"),
        ];
        assert_eq!(cut_probability(&s), Some(72.0));

        let s = vec![snip("CME", "The probability of a cut stands at 35.5%")];
        assert_eq!(cut_probability(&s), Some(35.5));

        let s = vec![snip("Odd", "a 150% chance of a cut")];
        assert_eq!(cut_probability(&s), None);
    }

    #[test]
    fn negated_cut_quotes_are_ignored() {
        let s = vec![snip("Fed", "Markets price a 90% chance of no cut in March")];
        assert_eq!(cut_probability(&s), None);
        let s = vec![snip("BoE", "There is a 60% likelihood of not cutting this year")];
        assert_eq!(cut_probability(&s), None);

        let s = vec![
            snip("RBA", "An 80% chance of no cut in May"),
            snip("RBA", "but a 40% chance of a cut by August"),
        ];
        assert_eq!(cut_probability(&s), Some(40.0));
    }

    #[test]
    fn terms_match_whole_words_only() {
        let s = vec![snip(
            "ECB keeps increasing pressure",
            "wage growth increasing, prices increasing, releasing data",
        )];
        assert_eq!(stance(&s), None);

        let s = vec![snip("BoC", "Rate cuts ahead as easing continues")];
        assert_eq!(stance(&s), Some(RateStance::NeutralDovish));
    }

    #[test]
    fn fiscal_from_current_account_mentions() {
        let s = vec![snip("Swiss", "Current account surplus widens")];
        assert_eq!(fiscal_stance(&s), Some(FiscalStance::Surplus));
        let s = vec![snip("UK", "current account deficit persists")];
        assert_eq!(fiscal_stance(&s), Some(FiscalStance::Deficit));
        assert_eq!(fiscal_stance(&[]), None);
    }
}
