//! Text primitives shared by extraction, verification and risk scoring
//!
//! Everything here is deterministic and allocation-light: sentence
//! splitting, word counting, scaled amount parsing, date recognition and
//! corporate-name normalization.

use crate::claim::AmountUnit;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Corporate suffixes stripped during name normalization
pub const DEFAULT_CORPORATE_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "co",
    "company",
    "ltd",
    "limited",
    "llc",
    "plc",
    "lp",
    "llp",
    "sa",
    "ag",
    "nv",
    "group",
    "holdings",
];

/// Corporate suffixes that end a sentence when a capitalized word follows
const SUFFIX_ABBREVIATIONS: &[&str] = &["inc", "corp", "co", "ltd"];

/// Abbreviations that end with a period but do not end a sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "st", "vs", "jr", "sr", "u.s", "e.g", "i.e", "no", "approx",
    "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
];

/// Full month names, used to keep dates out of proper-name detection
pub const MONTHS: &[&str] = &[
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<cur>[$€£])?(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)(?:\s?(?P<word>trillion|billion|million|thousand)\b|(?P<abbr>bn|mm|[kmbt])\b)?(?P<pct>\s?%|\s?percent\b)?",
    )
    .expect("amount regex")
});

static ISO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})\b").expect("iso date regex")
});

const MONTH_PATTERN: &str =
    r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

static MONTH_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?P<month>{})\.?\s+(?P<day>\d{{1,2}})(?:st|nd|rd|th)?,?\s+(?P<year>\d{{4}})\b",
        MONTH_PATTERN
    ))
    .expect("month-first date regex")
});

static DAY_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\s+(?P<month>{})\.?,?\s+(?P<year>\d{{4}})\b",
        MONTH_PATTERN
    ))
    .expect("day-first date regex")
});

/// A numeric value found in text
#[derive(Debug, Clone, PartialEq)]
pub struct AmountMatch {
    /// Scaled value
    pub value: f64,
    /// Currency, percent or plain
    pub unit: AmountUnit,
    /// Byte offset of the match start
    pub start: usize,
    /// Byte offset of the match end
    pub end: usize,
    /// Matched text
    pub raw: String,
    /// A bare four-digit number that reads like a year
    pub is_year: bool,
}

/// A calendar date found in text
#[derive(Debug, Clone, PartialEq)]
pub struct DateMatch {
    /// The date
    pub date: NaiveDate,
    /// Byte offset of the match start
    pub start: usize,
    /// Byte offset of the match end
    pub end: usize,
}

/// Count whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Lowercase alphanumeric tokens
pub fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Lowercase tokens joined by single spaces
pub fn normalize_text(text: &str) -> String {
    tokens(text).join(" ")
}

/// Whether `needle` occurs in `haystack` on token boundaries (both normalized)
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    let haystack = normalize_text(haystack);
    let needle = normalize_text(needle);
    if needle.is_empty() {
        return false;
    }
    format!(" {} ", haystack).contains(&format!(" {} ", needle))
}

/// Render a number without noise: integers without decimals, others trimmed
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        let s = format!("{:.4}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Whether two numbers agree within a relative tolerance
pub fn within_tolerance(claimed: f64, recorded: f64, tolerance: f64) -> bool {
    if recorded == 0.0 {
        return claimed.abs() <= f64::EPSILON;
    }
    ((claimed - recorded) / recorded).abs() <= tolerance
}

/// Split text into sentences
///
/// Splits after `.`, `!` or `?` when followed by whitespace, except after
/// known abbreviations and single capital initials. A corporate suffix
/// (`Corp.`, `Inc.`) ends the sentence when the next word is capitalized.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for (i, &(idx, c)) in chars.iter().enumerate() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let next_is_space = chars.get(i + 1).map(|(_, n)| n.is_whitespace()).unwrap_or(true);
        if !next_is_space {
            continue;
        }
        if c == '.' {
            let preceding = text[start..idx].split_whitespace().last().unwrap_or("");
            let word = preceding.trim_start_matches(|ch: char| !ch.is_alphanumeric()).to_lowercase();
            let is_initial = word.len() == 1 && preceding.chars().all(|ch| ch.is_uppercase());
            let capital_follows = chars[i + 1..]
                .iter()
                .map(|(_, n)| *n)
                .find(|n| !n.is_whitespace())
                .is_some_and(char::is_uppercase);
            let open_suffix = SUFFIX_ABBREVIATIONS.contains(&word.as_str()) && !capital_follows;
            if ABBREVIATIONS.contains(&word.as_str()) || open_suffix || is_initial {
                // Abbreviation at the very end of the text still closes the sentence.
                if chars.get(i + 1).is_some() {
                    continue;
                }
            }
        }
        let end = idx + c.len_utf8();
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = end;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.to_lowercase().chars().take(3).collect();
    MONTHS.iter().position(|m| m.starts_with(&prefix)).map(|i| i as u32 + 1)
}

/// Find calendar dates (ISO `2024-10-15`, `October 15, 2024`, `15 October 2024`)
pub fn find_dates(text: &str) -> Vec<DateMatch> {
    let mut found = Vec::new();

    for caps in ISO_DATE_RE.captures_iter(text) {
        let parsed = (
            caps["year"].parse::<i32>(),
            caps["month"].parse::<u32>(),
            caps["day"].parse::<u32>(),
        );
        if let (Ok(y), Ok(m), Ok(d)) = parsed {
            if let (Some(date), Some(whole)) = (NaiveDate::from_ymd_opt(y, m, d), caps.get(0)) {
                found.push(DateMatch { date, start: whole.start(), end: whole.end() });
            }
        }
    }

    for re in [&*MONTH_FIRST_RE, &*DAY_FIRST_RE] {
        for caps in re.captures_iter(text) {
            let month = month_number(&caps["month"]);
            let parsed = (caps["year"].parse::<i32>(), caps["day"].parse::<u32>());
            if let (Some(m), (Ok(y), Ok(d))) = (month, parsed) {
                if let (Some(date), Some(whole)) = (NaiveDate::from_ymd_opt(y, m, d), caps.get(0)) {
                    found.push(DateMatch { date, start: whole.start(), end: whole.end() });
                }
            }
        }
    }

    found.sort_by_key(|d| (d.start, std::cmp::Reverse(d.end)));
    let mut result: Vec<DateMatch> = Vec::new();
    for date in found {
        if result.last().is_some_and(|prev| date.start < prev.end) {
            continue;
        }
        result.push(date);
    }
    result
}

fn scale_for(word: Option<&str>, abbr: Option<&str>) -> f64 {
    let key = word.or(abbr).map(|s| s.to_lowercase());
    match key.as_deref() {
        Some("trillion") | Some("t") => 1e12,
        Some("billion") | Some("bn") | Some("b") => 1e9,
        Some("million") | Some("mm") | Some("m") => 1e6,
        Some("thousand") | Some("k") => 1e3,
        _ => 1.0,
    }
}

/// Find numeric values, skipping digits that belong to dates or words
///
/// Scale words are applied (`$5.2 billion` is 5.2e9). Bare four-digit
/// numbers between 1800 and 2100 are reported with `is_year` set.
pub fn find_amounts(text: &str) -> Vec<AmountMatch> {
    let dates = find_dates(text);
    let mut found = Vec::new();

    for caps in AMOUNT_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(num) = caps.name("num") else { continue };
        let cur = caps.name("cur");
        let word = caps.name("word").map(|m| m.as_str());
        let abbr = caps.name("abbr").map(|m| m.as_str());
        let pct = caps.name("pct");

        if dates.iter().any(|d| whole.start() < d.end && d.start < whole.end()) {
            continue;
        }
        if cur.is_none() {
            let prev = text[..whole.start()].chars().next_back();
            if prev.is_some_and(|c| c.is_alphanumeric() || c == '.' || c == '-') {
                continue;
            }
        }
        let next = text[whole.end()..].chars().next();
        if next.is_some_and(|c| c.is_alphabetic() || c == '-') {
            continue;
        }

        let Ok(base) = num.as_str().replace(',', "").parse::<f64>() else { continue };
        let value = base * scale_for(word, abbr);
        let unit = if pct.is_some() {
            AmountUnit::Percent
        } else if cur.is_some() {
            AmountUnit::Currency
        } else {
            AmountUnit::Plain
        };
        let digits = num.as_str();
        let is_year = unit == AmountUnit::Plain
            && word.is_none()
            && abbr.is_none()
            && digits.len() == 4
            && digits.chars().all(|c| c.is_ascii_digit())
            && (1800.0..=2100.0).contains(&base);

        found.push(AmountMatch {
            value,
            unit,
            start: whole.start(),
            end: whole.end(),
            raw: whole.as_str().trim().to_string(),
            is_year,
        });
    }
    found
}

/// Normalize a firm or person name for alias-tolerant comparison
///
/// Lowercases, drops punctuation, a leading "the" and trailing corporate
/// suffixes ("Tick Corp." and "tick corporation" both become "tick").
pub fn normalize_name<S: AsRef<str>>(name: &str, suffixes: &[S]) -> String {
    let mut parts = tokens(&name.replace('&', " and "));
    if parts.first().is_some_and(|p| p == "the") && parts.len() > 1 {
        parts.remove(0);
    }
    while parts.len() > 1 {
        let Some(last) = parts.last() else { break };
        let is_suffix = suffixes.iter().any(|s| s.as_ref().eq_ignore_ascii_case(last));
        if !is_suffix {
            break;
        }
        parts.pop();
        if parts.len() > 1 && parts.last().is_some_and(|p| p == "and") {
            parts.pop();
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  Tick Corp   reported revenue "), 4);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_split_sentences_respects_abbreviations_and_decimals() {
        let text = "Tick Corp. reported revenue of $5.2 billion. Earnings per share were $2.15. Shares rose!";
        let sentences = split_sentences(text);
        assert_eq!(
            sentences,
            vec![
                "Tick Corp. reported revenue of $5.2 billion.",
                "Earnings per share were $2.15.",
                "Shares rose!",
            ]
        );
    }

    #[test]
    fn test_corporate_suffix_ends_sentence_before_capital() {
        let text = "Revenue reached $5.2 billion for Tick Corp. Tick Corp announced a $500 million buyback.";
        assert_eq!(
            split_sentences(text),
            vec![
                "Revenue reached $5.2 billion for Tick Corp.",
                "Tick Corp announced a $500 million buyback.",
            ]
        );
        assert_eq!(split_sentences("Acme Inc. and Tick Corp. merged.").len(), 1);
    }

    #[test]
    fn test_split_sentences_without_terminal_punctuation() {
        assert_eq!(split_sentences("A steady quarter"), vec!["A steady quarter"]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_find_amounts_scales_and_units() {
        let amounts = find_amounts("Revenue of $5.2 billion, margin of 41.5% and 1,200 employees.");
        assert_eq!(amounts.len(), 3);
        assert_eq!(amounts[0].value, 5.2e9);
        assert_eq!(amounts[0].unit, AmountUnit::Currency);
        assert_eq!(amounts[1].value, 41.5);
        assert_eq!(amounts[1].unit, AmountUnit::Percent);
        assert_eq!(amounts[2].value, 1200.0);
        assert_eq!(amounts[2].unit, AmountUnit::Plain);
    }

    #[test]
    fn test_find_amounts_abbreviated_scale() {
        let amounts = find_amounts("a $500M buyback and $1.5bn of debt");
        assert_eq!(amounts.len(), 2);
        assert_eq!(amounts[0].value, 500e6);
        assert_eq!(amounts[1].value, 1.5e9);
    }

    #[test]
    fn test_find_amounts_flags_years_and_skips_dates() {
        let amounts = find_amounts("For fiscal 2024 the buyback was announced on 2024-10-15 and October 15, 2024.");
        assert_eq!(amounts.len(), 1);
        assert!(amounts[0].is_year);
    }

    #[test]
    fn test_find_amounts_skips_embedded_digits() {
        assert!(find_amounts("Q3 results and a 10-K filing").is_empty());
    }

    #[test]
    fn test_find_dates_formats() {
        let dates = find_dates("Announced 2024-10-15, paid Nov. 1st, 2024 and reviewed 3 December 2024.");
        let got: Vec<String> = dates.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(got, vec!["2024-10-15", "2024-11-01", "2024-12-03"]);
    }

    #[test]
    fn test_find_dates_rejects_impossible_dates() {
        assert!(find_dates("on 2024-02-30").is_empty());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Tick Corp.", DEFAULT_CORPORATE_SUFFIXES), "tick");
        assert_eq!(normalize_name("The Tick Corporation", DEFAULT_CORPORATE_SUFFIXES), "tick");
        assert_eq!(normalize_name("Morgan Stanley & Co. LLC", DEFAULT_CORPORATE_SUFFIXES), "morgan stanley");
        assert_eq!(normalize_name("Group", DEFAULT_CORPORATE_SUFFIXES), "group");
    }

    #[test]
    fn test_contains_phrase_uses_token_boundaries() {
        assert!(contains_phrase("Morgan Stanley reiterated a Buy rating", "buy"));
        assert!(!contains_phrase("Analysts are buying", "buy"));
        assert!(!contains_phrase("anything", ""));
    }

    #[test]
    fn test_format_number_and_tolerance() {
        assert_eq!(format_number(195.0), "195");
        assert_eq!(format_number(2.15), "2.15");
        assert!(within_tolerance(196.9, 195.0, 0.01));
        assert!(!within_tolerance(200.0, 195.0, 0.01));
        assert!(within_tolerance(0.0, 0.0, 0.01));
    }
}
