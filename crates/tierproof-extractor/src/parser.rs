//! Parse LLM output into claims

use crate::error::ExtractorError;
use chrono::NaiveDate;
use serde_json::Value;
use tierproof_domain::text::{find_amounts, find_dates};
use tierproof_domain::{AmountUnit, Claim, ClaimKind, ClaimValue};
use tracing::warn;

/// Parse an LLM JSON response into claims
///
/// The response must hold a JSON array (optionally fenced as markdown).
/// Entries that cannot become a claim are skipped with a warning.
pub fn parse_llm_response(response: &str) -> Result<Vec<Claim>, ExtractorError> {
    let json_str = extract_json(response)?;

    let json: Value = serde_json::from_str(&json_str)
        .map_err(|e| ExtractorError::InvalidFormat(format!("JSON parse error: {}", e)))?;

    let entries = json
        .as_array()
        .ok_or_else(|| ExtractorError::InvalidFormat("Expected JSON array".to_string()))?;

    let mut claims = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        match parse_claim_json(entry) {
            Ok(claim) => claims.push(claim),
            Err(e) => warn!("Failed to parse claim {}: {}", idx, e),
        }
    }

    Ok(claims)
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> Result<String, ExtractorError> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(ExtractorError::InvalidFormat("Empty code block".to_string()));
        }
        let end = if lines[lines.len() - 1].trim() == "```" {
            lines.len() - 1
        } else {
            lines.len()
        };
        Ok(lines[1..end].join("\n"))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parse a single claim from JSON
fn parse_claim_json(json: &Value) -> Result<Claim, String> {
    let obj = json.as_object().ok_or_else(|| "Claim is not a JSON object".to_string())?;

    let text = obj
        .get("text")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "Missing or invalid 'text'".to_string())?;

    let kind_raw = obj
        .get("kind")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "Missing or invalid 'kind'".to_string())?;
    let kind = ClaimKind::parse(kind_raw).ok_or_else(|| format!("Unknown kind '{}'", kind_raw))?;

    let subject = obj.get("subject").and_then(|v| v.as_str()).unwrap_or("").trim().to_lowercase();
    let value = obj.get("value");

    let value = match kind {
        ClaimKind::Numeric => {
            let unit = obj
                .get("unit")
                .and_then(|v| v.as_str())
                .or(Some(kind_raw))
                .and_then(parse_unit);
            parse_amount(value, unit)?
        }
        ClaimKind::Date => parse_date(value)?,
        ClaimKind::Attribution => {
            let name = value
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| "Attribution claim needs a string 'value'".to_string())?;
            ClaimValue::Name { name: name.to_string() }
        }
        ClaimKind::Event => ClaimValue::Statement,
    };

    let mut claim = Claim::new(text, kind, subject, value);
    if let Some(provider) = obj.get("provider").and_then(|v| v.as_str()).filter(|p| !p.is_empty()) {
        claim = claim.with_provider_hint(provider);
    }
    Ok(claim)
}

fn parse_unit(s: &str) -> Option<AmountUnit> {
    match s.trim().to_lowercase().as_str() {
        "currency" | "usd" | "$" => Some(AmountUnit::Currency),
        "percent" | "%" => Some(AmountUnit::Percent),
        "plain" | "number" => Some(AmountUnit::Plain),
        _ => None,
    }
}

fn parse_amount(value: Option<&Value>, unit: Option<AmountUnit>) -> Result<ClaimValue, String> {
    match value {
        Some(Value::Number(n)) => {
            let value = n.as_f64().ok_or_else(|| "Numeric 'value' out of range".to_string())?;
            Ok(ClaimValue::Amount {
                value,
                unit: unit.unwrap_or(AmountUnit::Plain),
            })
        }
        Some(Value::String(s)) => {
            let found = find_amounts(s)
                .into_iter()
                .next()
                .ok_or_else(|| format!("No number in '{}'", s))?;
            Ok(ClaimValue::Amount {
                value: found.value,
                unit: unit.unwrap_or(found.unit),
            })
        }
        _ => Err("Numeric claim needs a 'value'".to_string()),
    }
}

fn parse_date(value: Option<&Value>) -> Result<ClaimValue, String> {
    let raw = value
        .and_then(|v| v.as_str())
        .ok_or_else(|| "Date claim needs a string 'value'".to_string())?;
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| find_dates(raw).first().map(|d| d.date))
        .ok_or_else(|| format!("Unparseable date '{}'", raw))?;
    Ok(ClaimValue::Date { date })
}
