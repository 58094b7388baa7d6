//! Sentence and clause splitting
//!
//! A claim must carry one fact, so sentences are cut further at clause
//! connectives before facts are located.

use regex::Regex;
use std::sync::LazyLock;
use tierproof_domain::text::split_sentences;

static CONNECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i),?\s+(?:and|while|but|whereas|with|after|as)\s+").expect("connective regex")
});

/// A clause with its position inside the sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Clause text without trailing punctuation
    pub text: String,
    /// Whether the clause opens its sentence
    pub sentence_initial: bool,
}

/// Split text into clauses
///
/// Semicolons always split. A connective only splits when both sides keep
/// at least `min_words` words, so short coordinated phrases ("research and
/// development") stay whole.
pub fn split_clauses(text: &str, min_words: usize) -> Vec<Clause> {
    let mut clauses = Vec::new();
    for sentence in split_sentences(text) {
        let body = sentence.trim_end_matches(['.', '!', '?']).trim();
        let mut first = true;
        for part in body.split(';') {
            let mut start = 0;
            for m in CONNECTIVE_RE.find_iter(part) {
                let left = &part[start..m.start()];
                let right = &part[m.end()..];
                if left.split_whitespace().count() < min_words || right.split_whitespace().count() < min_words {
                    continue;
                }
                first &= !push_clause(&mut clauses, left, first);
                start = m.end();
            }
            first &= !push_clause(&mut clauses, &part[start..], first);
        }
    }
    clauses
}

/// Push a non-empty clause; returns whether one was pushed
fn push_clause(clauses: &mut Vec<Clause>, text: &str, sentence_initial: bool) -> bool {
    let text = text.trim().trim_end_matches([',', ':']).trim();
    if text.is_empty() {
        return false;
    }
    clauses.push(Clause {
        text: text.to_string(),
        sentence_initial,
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(clauses: &[Clause]) -> Vec<&str> {
        clauses.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_splits_on_connectives() {
        let clauses = split_clauses(
            "Morgan Stanley reiterated a Buy rating with a price target of $195. Revenue rose; margins fell sharply.",
            3,
        );
        assert_eq!(
            texts(&clauses),
            vec![
                "Morgan Stanley reiterated a Buy rating",
                "a price target of $195",
                "Revenue rose",
                "margins fell sharply",
            ]
        );
        assert!(clauses[0].sentence_initial);
        assert!(!clauses[1].sentence_initial);
        assert!(clauses[2].sentence_initial);
    }

    #[test]
    fn test_short_coordination_stays_whole() {
        let clauses = split_clauses("Spending on research and development grew.", 3);
        assert_eq!(texts(&clauses), vec!["Spending on research and development grew"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(split_clauses("   ", 2).is_empty());
    }
}
