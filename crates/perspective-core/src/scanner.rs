//! Lexical scanner for rupee amounts
//!
//! An ordered table of patterns is evaluated in priority order. The first
//! pattern that yields a valid amount decides the amount attributed to a text,
//! which ties the result to the most specific lexical form present. When no
//! pattern succeeds but the text carries a currency marker, the largest plain
//! number that passes validation is taken instead.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Smallest amount treated as a price
pub const MIN_AMOUNT: f64 = 1.0;

/// Sanity ceiling on plausible consumer prices (₹10 crore)
///
/// Rejects phone numbers, order IDs and similar digit runs that happen to sit
/// next to a currency marker.
pub const MAX_AMOUNT: f64 = 100_000_000.0;

/// Grouped numeral first (`1,234,567` or `12,34,567`), bare digits second.
const NUMERAL: &str = r"(\d{1,3}(?:,\d{2,3})+(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)";

macro_rules! price_pattern {
    ($name:ident, $regex:expr) => {
        static $name: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(&$regex).ok());
    };
}

price_pattern!(RE_SYMBOL, format!(r"₹\s*{NUMERAL}"));
price_pattern!(RE_ABBREVIATION, format!(r"(?i)\brs\.?\s*{NUMERAL}"));
price_pattern!(RE_ISO_CODE, format!(r"(?i)\binr\s*{NUMERAL}"));
price_pattern!(
    RE_TRAILING_WORD,
    format!(r"(?i){NUMERAL}\s*(?:rupees?\b|rs\b\.?)")
);
price_pattern!(
    RE_LABEL,
    format!(r"(?i)\b(?:price|cost|worth|mrp)[:\s]*₹?\s*{NUMERAL}")
);
price_pattern!(RE_PLAIN_NUMBER, String::from(r"\d[\d,]*(?:\.\d+)?"));
price_pattern!(
    RE_CURRENCY_MARKER,
    String::from(r"(?i)₹|\b(?:rs|inr)(?:\b|\d)|\brupees?\b")
);
price_pattern!(
    RE_PRICE_LABEL,
    String::from(r"(?i)\b(?:price|cost|worth|mrp)\b")
);

/// Lexical form that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// `₹1,299`
    Symbol,
    /// `Rs. 1299`
    Abbreviation,
    /// `INR 1299`
    IsoCode,
    /// `1299 rupees`
    TrailingWord,
    /// `MRP: 1299`
    Label,
    /// Largest plain number in text that carries a currency marker
    Fallback,
}

impl MatchSource {
    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::Abbreviation => "abbreviation",
            Self::IsoCode => "iso_code",
            Self::TrailingWord => "trailing_word",
            Self::Label => "label",
            Self::Fallback => "fallback",
        }
    }
}

/// One monetary token found in a text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceMatch {
    /// Matched text, currency marker included
    pub raw: String,
    /// Validated numeric amount
    pub amount: f64,
    /// Byte range of `raw` within the scanned text
    pub span: Range<usize>,
    /// Pattern that produced the match
    pub source: MatchSource,
}

struct PricePattern {
    source: MatchSource,
    regex: &'static Lazy<Option<Regex>>,
}

impl PricePattern {
    fn extract(&self, caps: &Captures<'_>) -> Option<PriceMatch> {
        let whole = caps.get(0)?;
        let numeral = caps.get(1)?;
        let amount = parse_amount(numeral.as_str())?;
        Some(PriceMatch {
            raw: whole.as_str().to_string(),
            amount,
            span: whole.range(),
            source: self.source,
        })
    }

    fn first_valid(&self, text: &str) -> Option<PriceMatch> {
        let regex = self.regex.as_ref()?;
        regex
            .captures_iter(text)
            .find_map(|caps| self.extract(&caps))
    }

    fn all_valid(&self, text: &str) -> Vec<PriceMatch> {
        let Some(regex) = self.regex.as_ref() else {
            return Vec::new();
        };
        regex
            .captures_iter(text)
            .filter_map(|caps| self.extract(&caps))
            .collect()
    }
}

/// Patterns in priority order (most specific first)
static PATTERNS: [PricePattern; 5] = [
    PricePattern {
        source: MatchSource::Symbol,
        regex: &RE_SYMBOL,
    },
    PricePattern {
        source: MatchSource::Abbreviation,
        regex: &RE_ABBREVIATION,
    },
    PricePattern {
        source: MatchSource::IsoCode,
        regex: &RE_ISO_CODE,
    },
    PricePattern {
        source: MatchSource::TrailingWord,
        regex: &RE_TRAILING_WORD,
    },
    PricePattern {
        source: MatchSource::Label,
        regex: &RE_LABEL,
    },
];

/// Normalize a numeral and validate it as a price
///
/// Grouping separators and whitespace are stripped before parsing. Returns
/// `None` for non-finite results and for amounts outside
/// [`MIN_AMOUNT`]`..=`[`MAX_AMOUNT`].
///
/// # Examples
/// ```
/// use perspective_core::scanner::parse_amount;
///
/// assert_eq!(parse_amount("1,23,456.50"), Some(123_456.5));
/// assert_eq!(parse_amount("0.5"), None);
/// ```
#[must_use]
pub fn parse_amount(numeral: &str) -> Option<f64> {
    let cleaned: String = numeral
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let amount: f64 = cleaned.parse().ok()?;
    (amount.is_finite() && (MIN_AMOUNT..=MAX_AMOUNT).contains(&amount)).then_some(amount)
}

/// Whether the text carries a rupee marker (`₹`, `Rs`, `INR`, `rupee`)
#[must_use]
pub fn has_currency_marker(text: &str) -> bool {
    RE_CURRENCY_MARKER
        .as_ref()
        .is_some_and(|re| re.is_match(text))
}

/// Cheap pre-filter: a currency marker or price label, and at least one digit
#[must_use]
pub fn is_price_like(text: &str) -> bool {
    if !text.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    has_currency_marker(text)
        || RE_PRICE_LABEL
            .as_ref()
            .is_some_and(|re| re.is_match(text))
}

/// The single amount attributed to a text
///
/// Patterns are tried in priority order and the first valid match of the
/// first successful pattern wins. Falls back to the largest valid plain number
/// when the text carries a currency marker.
#[must_use]
pub fn detect(text: &str) -> Option<PriceMatch> {
    PATTERNS
        .iter()
        .find_map(|pattern| pattern.first_valid(text))
        .or_else(|| fallback(text))
}

/// Every non-overlapping token in the text, in text order
///
/// Overlapping matches are resolved in favour of the higher-priority pattern.
/// The fallback only applies when no pattern matched at all.
#[must_use]
pub fn scan(text: &str) -> Vec<PriceMatch> {
    let mut accepted: Vec<PriceMatch> = Vec::new();
    for pattern in &PATTERNS {
        for candidate in pattern.all_valid(text) {
            let overlaps = accepted
                .iter()
                .any(|m| m.span.start < candidate.span.end && candidate.span.start < m.span.end);
            if !overlaps {
                accepted.push(candidate);
            }
        }
    }

    if accepted.is_empty() {
        accepted.extend(fallback(text));
    }

    accepted.sort_by_key(|m| m.span.start);
    accepted
}

fn fallback(text: &str) -> Option<PriceMatch> {
    if !has_currency_marker(text) {
        return None;
    }
    let regex = RE_PLAIN_NUMBER.as_ref()?;
    regex
        .find_iter(text)
        .filter_map(|m| {
            let raw = m.as_str().trim_end_matches(',');
            parse_amount(raw).map(|amount| PriceMatch {
                raw: raw.to_string(),
                amount,
                span: m.start()..m.start() + raw.len(),
                source: MatchSource::Fallback,
            })
        })
        .max_by(|a, b| a.amount.total_cmp(&b.amount))
}
