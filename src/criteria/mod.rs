//! Criteria parsing and validation
//!
//! Criteria arrive as a JSON array of `{pattern, deduction, message}`
//! objects. Text that is not a JSON array is rejected outright. Individual
//! entries that are malformed are filtered out and reported back as
//! `SkippedCriterion` warnings, so one bad rule never blocks an upload.
//! Patterns are not compiled here; that happens in the deduction engine.

pub mod upload;

use crate::domain::{CriteriaSet, Criterion, GraderError, GraderResult, SkippedCriterion};
use serde::Deserialize;
use serde_json::Value as JsonValue;

pub use upload::{extract_criteria_text, CriteriaFileType};

/// Outcome of parsing a criteria blob
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCriteria {
    /// Entries that passed validation, in declaration order
    pub criteria: CriteriaSet,
    /// Entries that were dropped, with the reason
    pub skipped: Vec<SkippedCriterion>,
}

impl ParsedCriteria {
    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Wire shape of one entry; every field optional so absence is reportable
#[derive(Debug, Deserialize)]
struct RawCriterion {
    pattern: Option<String>,
    deduction: Option<f64>,
    message: Option<String>,
}

/// Parse raw criteria text into a validated set
pub fn parse(raw_text: &str) -> GraderResult<ParsedCriteria> {
    let text = raw_text.trim_start_matches('\u{feff}').trim();

    let value: JsonValue = serde_json::from_str(text)
        .map_err(|e| GraderError::criteria_format(format!("criteria are not valid JSON: {e}")))?;

    let entries = value.as_array().ok_or_else(|| {
        GraderError::criteria_format(format!(
            "expected a JSON array of criteria, found {}",
            json_type_name(&value)
        ))
    })?;

    let mut parsed = ParsedCriteria::default();
    let mut accepted = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        match validate_entry(entry) {
            Ok(criterion) => accepted.push(criterion),
            Err(reason) => {
                tracing::debug!("Dropping criterion #{}: {}", index, reason);
                parsed.skipped.push(SkippedCriterion { index, reason });
            }
        }
    }

    parsed.criteria = CriteriaSet::new(accepted);
    Ok(parsed)
}

/// Check one array entry, returning the reason it was rejected
fn validate_entry(entry: &JsonValue) -> Result<Criterion, String> {
    if !entry.is_object() {
        return Err(format!("expected an object, found {}", json_type_name(entry)));
    }

    let raw: RawCriterion =
        serde_json::from_value(entry.clone()).map_err(|e| format!("malformed field: {e}"))?;

    let pattern = raw.pattern.filter(|p| !p.is_empty()).ok_or("missing 'pattern'")?;
    let message = raw.message.filter(|m| !m.trim().is_empty()).ok_or("missing 'message'")?;
    let deduction = raw.deduction.ok_or("missing 'deduction'")?;

    if !deduction.is_finite() || deduction < 0.0 {
        return Err(format!("'deduction' must be a non-negative number, got {deduction}"));
    }

    Ok(Criterion { pattern, deduction, message })
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
