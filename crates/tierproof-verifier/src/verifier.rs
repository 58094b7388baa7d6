//! Multi-source claim verification

use crate::config::VerifierConfig;
use chrono::NaiveDate;
use tierproof_domain::text::{
    contains_phrase, find_amounts, find_dates, format_number, normalize_name, normalize_text, split_sentences,
    tokens, within_tolerance,
};
use tierproof_domain::{
    AmountUnit, Claim, ClaimValue, ClaimVerification, FieldValue, SourceBundle, SourceDocument, SourceVerification,
    TierVerification,
};
use tracing::debug;

/// Field-name tokens that say nothing about what the field measures
const GENERIC_KEY_TOKENS: &[&str] = &["date", "value", "amount", "total", "usd", "per", "of"];

/// Minimum shared prefix for two words to count as the same stem
const STEM_PREFIX: usize = 5;

/// Checks claims against the normalized data of every available source
///
/// Each claim is checked once per provider that contributed documents. A
/// provider either supports the claim, directly contradicts it through a
/// structured field whose name matches the claim's subject, or says nothing.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerifierConfig,
}

impl Verifier {
    /// Create a verifier with the given configuration
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify every claim and aggregate the tier result
    ///
    /// An empty claim list yields a vacuous pass (pass rate 1.0).
    pub fn verify(&self, claims: Vec<Claim>, sources: &SourceBundle) -> TierVerification {
        if claims.is_empty() {
            debug!("No claims to verify, vacuous pass");
        }

        let results: Vec<ClaimVerification> = claims
            .into_iter()
            .map(|claim| {
                let per_source = sources
                    .available()
                    .map(|fetch| self.check_provider(&claim, &fetch.provider, &fetch.documents))
                    .collect();
                ClaimVerification::combine(claim, per_source)
            })
            .collect();

        let tier = TierVerification::from_claims(results);
        debug!(
            verified = tier.verified,
            failed = tier.failed,
            uncertain = tier.uncertain,
            pass_rate = tier.pass_rate,
            "Verification finished"
        );
        tier
    }

    /// Whether a tier result clears the pass threshold
    pub fn passes(&self, tier: &TierVerification) -> bool {
        tier.passes(self.config.pass_threshold)
    }

    /// Check one claim against one provider's documents
    pub fn check_provider(&self, claim: &Claim, provider: &str, documents: &[SourceDocument]) -> SourceVerification {
        let finding = match &claim.value {
            ClaimValue::Amount { value, unit } => self.check_amount(claim, *value, *unit, documents),
            ClaimValue::Date { date } => self.check_date(claim, *date, documents),
            ClaimValue::Name { name } => self.check_name(claim, name, documents),
            ClaimValue::Statement => self.check_statement(claim, documents),
        };

        match finding {
            Finding::Support(evidence) => SourceVerification::verified(claim.id, provider, evidence),
            Finding::Contradiction {
                evidence,
                discrepancy,
                expected,
            } => SourceVerification::failed(claim.id, provider, evidence, discrepancy, expected),
            Finding::Silent => SourceVerification::uncertain(claim.id, provider),
        }
    }

    fn check_amount(&self, claim: &Claim, value: f64, unit: AmountUnit, documents: &[SourceDocument]) -> Finding {
        let tolerance = self.config.numeric_tolerance;

        for doc in documents {
            for (key, field) in &doc.fields {
                if let FieldValue::Number(recorded) = field {
                    if within_tolerance(value, *recorded, tolerance) {
                        return Finding::Support(format!("{} = {}", key, format_number(*recorded)));
                    }
                }
            }
            for sentence in split_sentences(&doc.text) {
                let matched = find_amounts(&sentence)
                    .iter()
                    .any(|a| !a.is_year && within_tolerance(value, a.value, tolerance));
                if matched {
                    return Finding::Support(sentence);
                }
            }
        }

        for doc in documents {
            for (key, field) in &doc.fields {
                if let FieldValue::Number(recorded) = field {
                    if self.key_matches(key, &claim.subject) {
                        let expected = render_amount(*recorded, unit);
                        return Finding::Contradiction {
                            evidence: format!("{} = {}", key, format_number(*recorded)),
                            discrepancy: format!(
                                "claimed {} but {} is {} (outside ±{}%)",
                                render_amount(value, unit),
                                key.replace('_', " "),
                                expected,
                                format_number(tolerance * 100.0)
                            ),
                            expected,
                        };
                    }
                }
            }
        }

        Finding::Silent
    }

    fn check_date(&self, claim: &Claim, date: NaiveDate, documents: &[SourceDocument]) -> Finding {
        for doc in documents {
            for (key, field) in &doc.fields {
                if field == &FieldValue::Date(date) {
                    return Finding::Support(format!("{} = {}", key, date));
                }
            }
            for sentence in split_sentences(&doc.text) {
                if find_dates(&sentence).iter().any(|d| d.date == date) {
                    return Finding::Support(sentence);
                }
            }
        }

        for doc in documents {
            for (key, field) in &doc.fields {
                if let FieldValue::Date(recorded) = field {
                    if self.key_matches(key, &claim.subject) {
                        return Finding::Contradiction {
                            evidence: format!("{} = {}", key, recorded),
                            discrepancy: format!("claimed {} but {} is {}", date, key.replace('_', " "), recorded),
                            expected: recorded.to_string(),
                        };
                    }
                }
            }
        }

        Finding::Silent
    }

    fn check_name(&self, claim: &Claim, name: &str, documents: &[SourceDocument]) -> Finding {
        let wanted = normalize_name(name, &self.config.corporate_suffixes);
        if wanted.is_empty() {
            return Finding::Silent;
        }

        for doc in documents {
            for (key, field) in &doc.fields {
                if let FieldValue::Text(recorded) = field {
                    if normalize_name(recorded, &self.config.corporate_suffixes) == wanted {
                        return Finding::Support(format!("{} = {}", key, recorded));
                    }
                }
            }
            let body = normalize_name(&doc.text, &[] as &[&str]);
            if contains_phrase(&body, &wanted) {
                return Finding::Support(
                    split_sentences(&doc.text)
                        .into_iter()
                        .find(|s| contains_phrase(&normalize_name(s, &[] as &[&str]), &wanted))
                        .unwrap_or_else(|| doc.text.clone()),
                );
            }
        }

        for doc in documents {
            for (key, field) in &doc.fields {
                if let FieldValue::Text(recorded) = field {
                    if self.key_matches(key, &claim.subject) {
                        return Finding::Contradiction {
                            evidence: format!("{} = {}", key, recorded),
                            discrepancy: format!("claimed {} but {} is {}", name, key.replace('_', " "), recorded),
                            expected: recorded.clone(),
                        };
                    }
                }
            }
        }

        Finding::Silent
    }

    fn check_statement(&self, claim: &Claim, documents: &[SourceDocument]) -> Finding {
        let wanted = normalize_text(&claim.text);
        if wanted.is_empty() {
            return Finding::Silent;
        }

        let best = documents
            .iter()
            .flat_map(|doc| split_sentences(&doc.text))
            .map(|sentence| {
                let score = strsim::sorensen_dice(&wanted, &normalize_text(&sentence));
                (score, sentence)
            })
            .max_by(|a, b| a.0.total_cmp(&b.0));

        match best {
            Some((score, sentence)) if score >= self.config.similarity_threshold => {
                debug!(score, "Event claim entailed");
                Finding::Support(sentence)
            }
            _ => Finding::Silent,
        }
    }

    /// Whether a structured field name describes the claim's subject
    ///
    /// Every informative token of the key (after alias expansion) must match
    /// a subject token exactly or share a stem prefix with it.
    fn key_matches(&self, key: &str, subject: &str) -> bool {
        let subject_tokens = tokens(subject);
        if subject_tokens.is_empty() {
            return false;
        }

        let key_tokens: Vec<String> = key
            .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
            .map(str::to_lowercase)
            .flat_map(|t| match self.config.field_aliases.get(&t) {
                Some(aliases) => aliases.clone(),
                None => vec![t],
            })
            .filter(|t| !t.is_empty() && !GENERIC_KEY_TOKENS.contains(&t.as_str()))
            .collect();
        if key_tokens.is_empty() {
            return false;
        }

        key_tokens
            .iter()
            .all(|k| subject_tokens.iter().any(|s| same_stem(k, s)))
    }
}

fn same_stem(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    a.len() >= STEM_PREFIX && b.len() >= STEM_PREFIX && a.as_bytes()[..STEM_PREFIX] == b.as_bytes()[..STEM_PREFIX]
}

fn render_amount(value: f64, unit: AmountUnit) -> String {
    match unit {
        AmountUnit::Currency => format!("${}", format_number(value)),
        AmountUnit::Percent => format!("{}%", format_number(value)),
        AmountUnit::Plain => format_number(value),
    }
}

/// What one provider says about one claim
enum Finding {
    Support(String),
    Contradiction {
        evidence: String,
        discrepancy: String,
        expected: String,
    },
    Silent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use tierproof_domain::{ClaimKind, DocumentKind, SourceFetch, VerificationStatus};

    fn analyst() -> SourceDocument {
        SourceDocument::new(
            "analyst",
            DocumentKind::AnalystReport,
            Utc.with_ymd_and_hms(2024, 10, 20, 9, 0, 0).unwrap(),
            "Morgan Stanley reiterated a Buy rating with a price target of $195.",
        )
        .with_field("price_target", FieldValue::Number(195.0))
        .with_field("rating", FieldValue::Text("Buy".to_string()))
    }

    fn news() -> SourceDocument {
        SourceDocument::new(
            "news",
            DocumentKind::News,
            Utc.with_ymd_and_hms(2024, 10, 16, 9, 0, 0).unwrap(),
            "The board approved a new share repurchase program on October 15, 2024.",
        )
        .with_field(
            "announcement_date",
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 10, 15).unwrap()),
        )
    }

    fn amount(subject: &str, value: f64) -> Claim {
        Claim::new(
            format!("{} of ${}", subject, value),
            ClaimKind::Numeric,
            subject,
            ClaimValue::Amount {
                value,
                unit: AmountUnit::Currency,
            },
        )
    }

    fn check(claim: &Claim, doc: SourceDocument) -> SourceVerification {
        Verifier::default().check_provider(claim, &doc.provider.clone(), &[doc])
    }

    #[test]
    fn test_numeric_within_tolerance_verified() {
        let result = check(&amount("price target", 196.5), analyst());
        assert_eq!(result.status, VerificationStatus::Verified);
        assert_eq!(result.evidence.as_deref(), Some("price_target = 195"));
    }

    #[test]
    fn test_numeric_outside_tolerance_contradicted() {
        let result = check(&amount("price target", 200.0), analyst());
        assert_eq!(result.status, VerificationStatus::Failed);
        assert_eq!(result.expected.as_deref(), Some("$195"));
        assert!(result.discrepancy.unwrap().contains("claimed $200"));
    }

    #[test]
    fn test_numeric_unrelated_subject_is_uncertain() {
        let result = check(&amount("dividend", 200.0), analyst());
        assert_eq!(result.status, VerificationStatus::Uncertain);
    }

    #[test]
    fn test_numeric_found_in_free_text() {
        let doc = SourceDocument::new(
            "filings",
            DocumentKind::Filing,
            Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap(),
            "Tick Corp reported revenue of $5.2 billion for fiscal 2024.",
        );
        let result = check(&amount("revenue", 5.2e9), doc);
        assert_eq!(result.status, VerificationStatus::Verified);
        assert_eq!(
            result.evidence.as_deref(),
            Some("Tick Corp reported revenue of $5.2 billion for fiscal 2024.")
        );
    }

    #[test]
    fn test_field_alias_expansion() {
        let doc = SourceDocument::new(
            "filings",
            DocumentKind::Filing,
            Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap(),
            "",
        )
        .with_field("eps", FieldValue::Number(2.15));
        let result = check(&amount("earnings share", 2.5), doc);
        assert_eq!(result.status, VerificationStatus::Failed);
    }

    #[test]
    fn test_dates_exact_only() {
        let claim = |day| {
            Claim::new(
                "announced the buyback",
                ClaimKind::Date,
                "announced buyback",
                ClaimValue::Date {
                    date: NaiveDate::from_ymd_opt(2024, 10, day).unwrap(),
                },
            )
        };
        assert_eq!(check(&claim(15), news()).status, VerificationStatus::Verified);

        let wrong = check(&claim(16), news());
        assert_eq!(wrong.status, VerificationStatus::Failed);
        assert_eq!(wrong.expected.as_deref(), Some("2024-10-15"));
    }

    #[test]
    fn test_names_allow_suffix_aliases() {
        let claim = |name: &str| {
            Claim::new(
                name,
                ClaimKind::Attribution,
                "",
                ClaimValue::Name { name: name.to_string() },
            )
        };
        assert_eq!(check(&claim("Morgan Stanley & Co."), analyst()).status, VerificationStatus::Verified);
        assert_eq!(check(&claim("Goldman Sachs"), analyst()).status, VerificationStatus::Uncertain);
    }

    #[test]
    fn test_rating_label_contradiction() {
        let claim = Claim::new(
            "a Hold rating",
            ClaimKind::Attribution,
            "rating",
            ClaimValue::Name {
                name: "Hold".to_string(),
            },
        );
        let result = check(&claim, analyst());
        assert_eq!(result.status, VerificationStatus::Failed);
        assert_eq!(result.expected.as_deref(), Some("Buy"));
    }

    #[test]
    fn test_event_entailment() {
        let entailed = Claim::new(
            "The board approved a new share repurchase program",
            ClaimKind::Event,
            "",
            ClaimValue::Statement,
        );
        assert_eq!(check(&entailed, news()).status, VerificationStatus::Verified);

        let unrelated = Claim::new("The chief executive resigned abruptly", ClaimKind::Event, "", ClaimValue::Statement);
        assert_eq!(check(&unrelated, news()).status, VerificationStatus::Uncertain);
    }

    #[test]
    fn test_verify_aggregates_over_available_sources_only() {
        let bundle = SourceBundle::new(vec![
            SourceFetch::success("analyst", vec![analyst()]),
            SourceFetch::success("news", vec![news()]),
            SourceFetch::failed("filings", "timeout"),
        ]);
        let verifier = Verifier::default();

        let tier = verifier.verify(vec![amount("price target", 200.0), amount("price target", 195.0)], &bundle);
        assert_eq!(tier.verified, 1);
        assert_eq!(tier.failed, 1);
        assert_eq!(tier.pass_rate, 0.5);
        assert!(!verifier.passes(&tier));
        assert!(tier.claims.iter().all(|c| c.sources.len() == 2));
    }

    proptest! {
        #[test]
        fn prop_tolerance_band_decides(recorded in 1.0f64..1e9, factor in 0.9f64..1.1) {
            let doc = SourceDocument::new("filings", DocumentKind::Filing, Utc::now(), "")
                .with_field("revenue", FieldValue::Number(recorded));
            let result = Verifier::default().check_provider(&amount("revenue", recorded * factor), "filings", &[doc]);
            if (factor - 1.0).abs() <= 0.0099 {
                prop_assert_eq!(result.status, VerificationStatus::Verified);
            } else if (factor - 1.0).abs() > 0.0101 {
                prop_assert_eq!(result.status, VerificationStatus::Failed);
            }
        }
    }

    #[test]
    fn test_zero_claims_vacuous_pass() {
        let verifier = Verifier::default();
        let tier = verifier.verify(Vec::new(), &SourceBundle::default());
        assert_eq!(tier.pass_rate, 1.0);
        assert!(tier.vacuous);
        assert!(verifier.passes(&tier));
    }
}
