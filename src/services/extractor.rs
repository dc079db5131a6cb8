//! Turns the free text an AI vendor replies with into validated questions.
//!
//! Stage one ([`extract_array`]) only cares about finding a non-empty JSON
//! array somewhere in the reply. Stage two ([`validate_questions`]) checks
//! each entry against the [`Question`] shape, drops the ones that do not fit
//! and re-indexes the survivors from 1.

use crate::error::{Error, Result};
use crate::models::question::{Question, QuestionIssue};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value as JsonValue;

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z0-9_-]*[ \t]*\r?\n?").unwrap());

#[derive(Debug, Clone, Serialize)]
pub struct ValidatedBatch {
    pub questions: Vec<Question>,
    pub rejected: Vec<QuestionIssue>,
}

/// Remove every markdown fence marker (` ``` ` with an optional language tag).
pub fn strip_fences(text: &str) -> String {
    RE_FENCE.replace_all(text, "").into_owned()
}

/// The span from the first `[` to the last `]`, if both exist in that order.
pub fn candidate_json(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Best-effort extraction of a non-empty JSON array from a model reply.
pub fn extract_array(raw: &str) -> Result<Vec<JsonValue>> {
    let cleaned = strip_fences(raw);
    let trimmed = cleaned.trim();

    let parsed = match candidate_json(trimmed) {
        Some(slice) => serde_json::from_str::<JsonValue>(slice)
            .or_else(|_| serde_json::from_str::<JsonValue>(trimmed)),
        None => serde_json::from_str::<JsonValue>(trimmed),
    };

    let value = parsed.map_err(|e| {
        tracing::warn!(error = %e, "AI response did not contain parseable JSON");
        Error::malformed(format!("no valid JSON array found: {}", e), raw)
    })?;

    match value {
        JsonValue::Array(items) if !items.is_empty() => Ok(items),
        JsonValue::Array(_) => Err(Error::malformed("AI returned an empty question list", raw)),
        _ => Err(Error::malformed("AI response JSON is not an array", raw)),
    }
}

pub fn validate_questions(items: &[JsonValue]) -> ValidatedBatch {
    let mut questions = Vec::with_capacity(items.len());
    let mut rejected = Vec::new();

    for (position, item) in items.iter().enumerate() {
        match Question::from_value(item, position) {
            Ok(q) => questions.push(q),
            Err(issue) => {
                tracing::warn!(
                    position = issue.position,
                    reason = %issue.reason,
                    "Dropping malformed question from AI response"
                );
                rejected.push(issue);
            }
        }
    }

    for (idx, q) in questions.iter_mut().enumerate() {
        q.index = (idx as u32) + 1;
    }

    ValidatedBatch {
        questions,
        rejected,
    }
}

/// Full pipeline: raw vendor text to a non-empty list of questions.
pub fn parse_questions(raw: &str) -> Result<ValidatedBatch> {
    let items = extract_array(raw)?;
    let batch = validate_questions(&items);
    if batch.questions.is_empty() {
        let reasons: Vec<String> = batch
            .rejected
            .iter()
            .map(|i| format!("#{}: {}", i.position, i.reason))
            .collect();
        return Err(Error::malformed(
            format!("no entry matched the question shape ({})", reasons.join("; ")),
            raw,
        ));
    }
    Ok(batch)
}
