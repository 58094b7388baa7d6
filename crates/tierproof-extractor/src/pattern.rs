//! Rule-based claim extraction
//!
//! Deterministic, offline and fast. Each clause is scanned for dates first,
//! then amounts (digits inside dates are masked), rating labels and proper
//! names. Every value found becomes its own claim; a clause that asserts an
//! event without any such value becomes one event claim.

use crate::clauses::{split_clauses, Clause};
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use async_trait::async_trait;
use std::collections::HashSet;
use tierproof_domain::text::{self, find_amounts, find_dates, normalize_name, tokens, DEFAULT_CORPORATE_SUFFIXES, MONTHS};
use tierproof_domain::{Claim, ClaimExtractor, ClaimKind, ClaimValue, ExtractionError};
use tracing::debug;

/// Minimum words on each side of a connective before a clause is split
const CLAUSE_MIN_WORDS: usize = 3;

/// Words carrying no labelling information
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "of", "to", "at", "in", "on", "for", "by", "with", "was", "were", "is", "are", "be", "been",
    "per", "from", "and", "or", "its", "their", "about", "around", "approximately", "roughly", "nearly", "some",
    "set", "this", "that", "it", "has", "had", "have", "up", "down", "over", "under", "than", "which",
];

/// Capitalized words that never start a proper name
const NAME_STOPWORDS: &[&str] = &[
    "the", "a", "an", "in", "on", "at", "for", "its", "this", "that", "these", "those", "shares", "analysts",
    "revenue", "earnings", "fiscal", "management", "overall", "meanwhile", "however", "also", "after", "before",
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "q1", "q2", "q3", "q4", "fy",
];

/// Rule-based extractor implementing [`ClaimExtractor`]
#[derive(Debug, Clone, Default)]
pub struct PatternExtractor {
    config: ExtractorConfig,
}

impl PatternExtractor {
    /// Create an extractor with the given configuration
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract claims synchronously
    pub fn extract_claims(&self, text: &str) -> Result<Vec<Claim>, ExtractorError> {
        let length = text.chars().count();
        if length > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(length, self.config.max_text_length));
        }

        let mut claims = Vec::new();
        let mut seen_names: HashSet<String> = HashSet::new();
        for clause in split_clauses(text, CLAUSE_MIN_WORDS) {
            self.extract_clause(&clause, &mut seen_names, &mut claims);
        }

        debug!(claims = claims.len(), "Pattern extraction finished");
        Ok(claims)
    }

    fn extract_clause(&self, clause: &Clause, seen_names: &mut HashSet<String>, claims: &mut Vec<Claim>) {
        let text = clause.text.as_str();
        let before = claims.len();

        // Facts in textual order so each value's subject is the span since the previous fact.
        let mut facts: Vec<(usize, usize, ClaimKind, ClaimValue)> = Vec::new();
        for date in find_dates(text) {
            facts.push((date.start, date.end, ClaimKind::Date, ClaimValue::Date { date: date.date }));
        }
        for amount in find_amounts(text).into_iter().filter(|a| !a.is_year) {
            facts.push((
                amount.start,
                amount.end,
                ClaimKind::Numeric,
                ClaimValue::Amount {
                    value: amount.value,
                    unit: amount.unit,
                },
            ));
        }
        facts.sort_by_key(|f| f.0);

        let mut previous_end = 0;
        for (start, end, kind, value) in facts {
            let preceding = label_words(&text[previous_end.min(start)..start]);
            let subject = if preceding.is_empty() {
                let following = label_words(&text[end..]);
                following[..following.len().min(3)].join(" ")
            } else {
                preceding[preceding.len().saturating_sub(4)..].join(" ")
            };
            claims.push(Claim::new(text, kind, subject, value));
            previous_end = end;
        }

        if let Some(label) = self.rating_in(text) {
            claims.push(Claim::new(
                text,
                ClaimKind::Attribution,
                "rating",
                ClaimValue::Name { name: label },
            ));
        }

        for name in self.names_in(clause) {
            let key = normalize_name(&name, DEFAULT_CORPORATE_SUFFIXES);
            if seen_names.insert(key) {
                claims.push(Claim::new(text, ClaimKind::Attribution, "", ClaimValue::Name { name }));
            }
        }

        if claims.len() == before && self.is_event(text) {
            claims.push(Claim::new(text, ClaimKind::Event, "", ClaimValue::Statement));
        }
    }

    /// A rating label asserted by the clause, if any
    fn rating_in(&self, text: &str) -> Option<String> {
        let words = tokens(text);
        let rating_context = words
            .iter()
            .any(|w| matches!(w.as_str(), "rating" | "rated" | "upgraded" | "downgraded" | "reiterated"));
        if !rating_context {
            return None;
        }
        self.config
            .rating_labels
            .iter()
            .find(|label| text::contains_phrase(text, label))
            .cloned()
    }

    fn is_rating_word(&self, word: &str) -> bool {
        self.config
            .rating_labels
            .iter()
            .any(|l| l.split_whitespace().any(|part| part.eq_ignore_ascii_case(word)))
    }

    /// Proper names: runs of capitalized words
    fn names_in(&self, clause: &Clause) -> Vec<String> {
        let masked = mask_dates(&clause.text);
        let mut names = Vec::new();
        let mut run: Vec<&str> = Vec::new();
        let mut run_starts_clause = false;

        let words: Vec<&str> = masked.split_whitespace().collect();
        for (i, raw) in words.iter().enumerate() {
            let word = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '&');
            let closes = raw.ends_with([',', ';', ':', ')'])
                || (raw.ends_with('.') && (!is_suffix(word) || next_capitalized(&words, i)));
            let lower = word.to_lowercase();
            let capitalized = word.chars().next().is_some_and(char::is_uppercase);
            let connector = !run.is_empty() && (word == "&" || lower == "of") && next_capitalized(&words, i);

            let blocked = MONTHS.contains(&lower.as_str()) || self.is_rating_word(word);
            if (capitalized && !blocked) || connector {
                if run.is_empty() {
                    if NAME_STOPWORDS.contains(&lower.as_str()) {
                        continue;
                    }
                    run_starts_clause = i == 0 && clause.sentence_initial;
                }
                run.push(word);
            } else {
                flush(&mut run, run_starts_clause, &mut names);
            }
            if closes {
                flush(&mut run, run_starts_clause, &mut names);
            }
        }
        flush(&mut run, run_starts_clause, &mut names);
        names
    }

    fn is_event(&self, text: &str) -> bool {
        let words = tokens(text);
        words.len() >= self.config.min_event_words
            && words.iter().any(|w| self.config.event_verbs.iter().any(|v| v == w))
    }
}

fn is_suffix(word: &str) -> bool {
    DEFAULT_CORPORATE_SUFFIXES.iter().any(|s| s.eq_ignore_ascii_case(word))
}

fn next_capitalized(words: &[&str], i: usize) -> bool {
    words
        .get(i + 1)
        .and_then(|w| w.chars().next())
        .is_some_and(char::is_uppercase)
}

/// Keep a finished run when it reads like a name
fn flush(run: &mut Vec<&str>, starts_clause: bool, names: &mut Vec<String>) {
    while run.last().is_some_and(|w| *w == "&" || w.eq_ignore_ascii_case("of")) {
        run.pop();
    }
    let keep = match run.len() {
        0 => false,
        // A lone capitalized word opening a sentence is just capitalization;
        // lone all-caps words are tickers or acronyms.
        1 => !starts_clause && run[0].len() > 1 && !run[0].chars().all(|c| c.is_uppercase() || c.is_ascii_digit()),
        _ => true,
    };
    if keep {
        names.push(run.join(" "));
    }
    run.clear();
}

/// Blank out dates so month names and days never join a name run
fn mask_dates(text: &str) -> String {
    let mut masked = text.to_string();
    for date in find_dates(text).into_iter().rev() {
        masked.replace_range(date.start..date.end, &" ".repeat(date.end - date.start));
    }
    masked
}

/// Label words in a span: lowercase tokens without stopwords or digits
fn label_words(span: &str) -> Vec<String> {
    tokens(span)
        .into_iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()) && !t.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

#[async_trait]
impl ClaimExtractor for PatternExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<Claim>, ExtractionError> {
        Ok(self.extract_claims(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierproof_domain::AmountUnit;

    fn extract(text: &str) -> Vec<Claim> {
        PatternExtractor::default().extract_claims(text).unwrap()
    }

    fn names(claims: &[Claim]) -> Vec<String> {
        claims
            .iter()
            .filter(|c| c.kind == ClaimKind::Attribution && c.subject.is_empty())
            .map(|c| c.value_display())
            .collect()
    }

    #[test]
    fn test_numeric_claim_with_subject() {
        let claims = extract("Morgan Stanley set a price target of $200 for Tick Corp.");
        let numeric: Vec<&Claim> = claims.iter().filter(|c| c.kind == ClaimKind::Numeric).collect();
        assert_eq!(numeric.len(), 1);
        assert_eq!(numeric[0].subject, "morgan stanley price target");
        assert_eq!(
            numeric[0].value,
            ClaimValue::Amount {
                value: 200.0,
                unit: AmountUnit::Currency
            }
        );
        assert_eq!(names(&claims), vec!["Morgan Stanley", "Tick Corp"]);
    }

    #[test]
    fn test_one_claim_per_value() {
        let claims = extract("Tick Corp reported revenue of $5.2 billion for fiscal 2024. Earnings per share were $2.15.");
        let numeric: Vec<&Claim> = claims.iter().filter(|c| c.kind == ClaimKind::Numeric).collect();
        assert_eq!(numeric.len(), 2);
        assert_eq!(numeric[0].subject, "tick corp reported revenue");
        assert_eq!(numeric[1].subject, "earnings share");
        assert_eq!(names(&claims), vec!["Tick Corp"]);
    }

    #[test]
    fn test_dates_are_not_numbers_or_names() {
        let claims = extract("Tick Corp announced the buyback on October 15, 2024.");
        let kinds: Vec<ClaimKind> = claims.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ClaimKind::Date, ClaimKind::Attribution]);
        assert_eq!(claims[0].value_display(), "2024-10-15");
        assert_eq!(claims[0].subject, "tick corp announced buyback");
    }

    #[test]
    fn test_rating_label() {
        let claims = extract("Morgan Stanley reiterated a Buy rating with a price target of $195.");
        let rating = claims.iter().find(|c| c.subject == "rating").unwrap();
        assert_eq!(rating.value_display(), "Buy");
        assert_eq!(names(&claims), vec!["Morgan Stanley"]);
        assert!(claims.iter().any(|c| c.kind == ClaimKind::Numeric && c.subject == "price target"));
    }

    #[test]
    fn test_event_claim_only_without_other_facts() {
        let claims = extract("The board approved a new share repurchase program.");
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].kind, ClaimKind::Event);
        assert_eq!(claims[0].text, "The board approved a new share repurchase program");
    }

    #[test]
    fn test_no_checkable_assertions() {
        assert!(extract("A steady quarter overall, in line with expectations.").is_empty());
    }

    #[test]
    fn test_subject_falls_back_to_following_words() {
        let claims = extract("A $500 million share buyback was approved.");
        let numeric = claims.iter().find(|c| c.kind == ClaimKind::Numeric).unwrap();
        assert_eq!(numeric.subject, "share buyback approved");
    }

    #[test]
    fn test_names_deduplicated_across_text() {
        let claims = extract("Tick Corp grew quickly. Tick Corp. shares rose sharply.");
        assert_eq!(names(&claims), vec!["Tick Corp"]);
    }

    #[test]
    fn test_suffix_at_sentence_end_keeps_names_apart() {
        let claims = extract(
            "Morgan Stanley set a price target of $195 for Tick Corp. Tick Corp announced a $500 million share buyback.",
        );
        assert_eq!(names(&claims), vec!["Morgan Stanley", "Tick Corp"]);
        assert!(claims.iter().all(|c| !c.text.contains("Corp. Tick")));

        let clause = Clause {
            text: "Shares rose at Tick Corp. Acme Holdings followed".to_string(),
            sentence_initial: true,
        };
        assert_eq!(PatternExtractor::default().names_in(&clause), vec!["Tick Corp", "Acme Holdings"]);
    }

    #[test]
    fn test_text_too_long() {
        let mut config = ExtractorConfig::default();
        config.max_text_length = 5;
        let result = PatternExtractor::new(config).extract_claims("far too long");
        assert!(matches!(result, Err(ExtractorError::TextTooLong(12, 5))));
    }
}
