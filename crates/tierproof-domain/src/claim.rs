//! Claim module - atomic, independently checkable assertions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a claim based on UUIDv7
///
/// UUIDv7 keeps identifiers chronologically sortable, which keeps claims of
/// one attempt grouped together in persisted audit data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ClaimId(u128);

impl ClaimId {
    /// Generate a new UUIDv7-based ClaimId
    ///
    /// # Examples
    ///
    /// ```
    /// use tierproof_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a ClaimId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a ClaimId from its UUID string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid UUIDv7 string: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl From<ClaimId> for String {
    fn from(id: ClaimId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ClaimId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_string(&value)
    }
}

/// Kind of fact a claim asserts; selects the matching rule used to verify it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    /// Numeric, currency or percentage value
    Numeric,
    /// Calendar date
    Date,
    /// Named firm, person or rating label
    Attribution,
    /// Anything else: checked by fuzzy textual entailment
    Event,
}

impl ClaimKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimKind::Numeric => "numeric",
            ClaimKind::Date => "date",
            ClaimKind::Attribution => "attribution",
            ClaimKind::Event => "event",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "numeric" | "number" | "currency" | "percent" => Some(ClaimKind::Numeric),
            "date" => Some(ClaimKind::Date),
            "attribution" | "name" | "rating" => Some(ClaimKind::Attribution),
            "event" | "statement" => Some(ClaimKind::Event),
            _ => None,
        }
    }
}

/// Unit attached to a numeric claim value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountUnit {
    /// Currency amount (e.g. "$195")
    Currency,
    /// Percentage (e.g. "12.5%")
    Percent,
    /// Plain number
    Plain,
}

/// The checkable value carried by a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaimValue {
    /// Numeric value, already scaled (e.g. "$5.2 billion" is 5.2e9)
    Amount {
        /// Scaled numeric value
        value: f64,
        /// Currency, percent or plain
        unit: AmountUnit,
    },
    /// Calendar date
    Date {
        /// The asserted date
        date: NaiveDate,
    },
    /// Firm, person or rating label as written
    Name {
        /// The name as it appears in the text
        name: String,
    },
    /// Free statement; the claim text itself is the value
    Statement,
}

/// A claim extracted from a tier's candidate text
///
/// A claim carries exactly one checkable value. `subject` holds the words
/// that label the value (e.g. "price target" for "$195"), which the
/// verifier uses to find the source field that could contradict it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,

    /// Text of the clause the claim was taken from
    pub text: String,

    /// Claim kind
    pub kind: ClaimKind,

    /// Label words describing the value (may be empty)
    #[serde(default)]
    pub subject: String,

    /// The asserted value
    pub value: ClaimValue,

    /// Provider expected to support the claim (hint only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_hint: Option<String>,
}

impl Claim {
    /// Create a new claim with a fresh identifier
    pub fn new(text: impl Into<String>, kind: ClaimKind, subject: impl Into<String>, value: ClaimValue) -> Self {
        Self {
            id: ClaimId::new(),
            text: text.into(),
            kind,
            subject: subject.into(),
            value,
            provider_hint: None,
        }
    }

    /// Attach a provider hint
    pub fn with_provider_hint(mut self, provider: impl Into<String>) -> Self {
        self.provider_hint = Some(provider.into());
        self
    }

    /// Human-readable rendering of the asserted value
    pub fn value_display(&self) -> String {
        match &self.value {
            ClaimValue::Amount { value, unit } => match unit {
                AmountUnit::Currency => format!("${}", crate::text::format_number(*value)),
                AmountUnit::Percent => format!("{}%", crate::text::format_number(*value)),
                AmountUnit::Plain => crate::text::format_number(*value),
            },
            ClaimValue::Date { date } => date.to_string(),
            ClaimValue::Name { name } => name.clone(),
            ClaimValue::Statement => self.text.clone(),
        }
    }
}
