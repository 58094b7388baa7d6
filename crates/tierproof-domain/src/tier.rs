//! Tier module - the three summary lengths generated for every unit

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Summary tier: three progressively detailed summaries of one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// One-line summary
    Brief,
    /// Paragraph-length summary
    Medium,
    /// Full-length summary
    Expanded,
}

impl Tier {
    /// All tiers in generation order
    pub const ALL: [Tier; 3] = [Tier::Brief, Tier::Medium, Tier::Expanded];

    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Brief => "brief",
            Tier::Medium => "medium",
            Tier::Expanded => "expanded",
        }
    }

    /// Parse a tier from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "brief" => Some(Tier::Brief),
            "medium" => Some(Tier::Medium),
            "expanded" => Some(Tier::Expanded),
            _ => None,
        }
    }

    /// Default word range for this tier
    pub fn default_word_range(&self) -> WordRange {
        match self {
            Tier::Brief => WordRange::new(10, 15),
            Tier::Medium => WordRange::new(75, 150),
            Tier::Expanded => WordRange::new(200, 750),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown tier: {}", s))
    }
}

/// Inclusive word-count range a tier's text must fall within
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRange {
    /// Minimum number of words
    pub min: usize,
    /// Maximum number of words
    pub max: usize,
}

impl WordRange {
    /// Create a new range
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Whether `count` falls within the range
    pub fn contains(&self, count: usize) -> bool {
        count >= self.min && count <= self.max
    }
}

impl fmt::Display for WordRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} words", self.min, self.max)
    }
}
