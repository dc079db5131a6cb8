use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

pub const OPTION_COUNT: usize = 4;

/// One quiz item as exchanged between the upload endpoint and the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub index: u32,
    pub question: String,
    pub options: [String; OPTION_COUNT],
    pub answer: AnswerLetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    pub const ALL: [AnswerLetter; OPTION_COUNT] =
        [AnswerLetter::A, AnswerLetter::B, AnswerLetter::C, AnswerLetter::D];

    pub fn option_position(self) -> usize {
        match self {
            AnswerLetter::A => 0,
            AnswerLetter::B => 1,
            AnswerLetter::C => 2,
            AnswerLetter::D => 3,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            AnswerLetter::A => 'a',
            AnswerLetter::B => 'b',
            AnswerLetter::C => 'c',
            AnswerLetter::D => 'd',
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for AnswerLetter {
    type Err = String;

    // Models answer "b", "B", "(b)", "b." or "b)"; all mean option b.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(|c: char| c == ')' || c == '.')
            .trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "a" => Ok(AnswerLetter::A),
            "b" => Ok(AnswerLetter::B),
            "c" => Ok(AnswerLetter::C),
            "d" => Ok(AnswerLetter::D),
            _ => Err(format!("answer must be one of a, b, c, d (got {:?})", s)),
        }
    }
}

impl<'de> Deserialize<'de> for AnswerLetter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Why a single model-produced entry was not accepted as a [`Question`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionIssue {
    /// 1-based position of the entry in the model's array.
    pub position: usize,
    pub reason: String,
}

impl Question {
    /// Strictly validate one raw entry. `position` is 0-based in the source
    /// array; the resulting question is indexed `position + 1` and callers
    /// re-index after filtering.
    pub fn from_value(value: &JsonValue, position: usize) -> Result<Self, QuestionIssue> {
        let issue = |reason: String| QuestionIssue {
            position: position + 1,
            reason,
        };

        let obj = value
            .as_object()
            .ok_or_else(|| issue("entry is not an object".to_string()))?;

        let question = obj
            .get("question")
            .and_then(|q| q.as_str())
            .filter(|q| !q.trim().is_empty())
            .map(|q| q.to_string())
            .ok_or_else(|| issue("missing or empty \"question\" text".to_string()))?;

        let raw_options = obj
            .get("options")
            .and_then(|o| o.as_array())
            .ok_or_else(|| issue("missing \"options\" array".to_string()))?;
        if raw_options.len() != OPTION_COUNT {
            return Err(issue(format!(
                "expected {} options, found {}",
                OPTION_COUNT,
                raw_options.len()
            )));
        }

        let mut options: [String; OPTION_COUNT] = Default::default();
        for (slot, raw) in options.iter_mut().zip(raw_options) {
            *slot = match raw {
                JsonValue::String(s) => s.clone(),
                JsonValue::Number(n) => n.to_string(),
                other => return Err(issue(format!("option is not text: {}", other))),
            };
        }

        let answer = obj
            .get("answer")
            .and_then(|a| a.as_str())
            .ok_or_else(|| issue("missing \"answer\" letter".to_string()))?
            .parse::<AnswerLetter>()
            .map_err(issue)?;

        Ok(Question {
            index: (position + 1) as u32,
            question,
            options,
            answer,
        })
    }
}
