//! Normalization of raw model output.
//!
//! The model is asked for a JSON object, but what comes back is free text: the
//! object may be wrapped in a markdown fence or surrounded by prose, and fields
//! that should be strings sometimes arrive as nested objects. Everything here
//! works on an untyped [`serde_json::Value`] and hands the generator a
//! [`Candidate`] with plain string fields. Whether the candidate is a valid
//! question is decided by [`Candidate::to_question`].

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::quiz::error::ValidationError;
use crate::quiz::{FillInBlank, MultipleChoice, Question, QuestionKind};

lazy_static! {
    static ref FENCED_BLOCK_REGEX: Regex = Regex::new(r"(?si)```[a-z]*\s*(.*?)```").unwrap();
}

/// Normalized but unchecked fields of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    MultipleChoice {
        question: String,
        options: Vec<String>,
        correct_answer: String,
    },
    FillInBlank {
        question: String,
        answer: String,
    },
}

impl Candidate {
    /// Runs the structural checks of the candidate's kind.
    pub fn to_question(&self) -> Result<Question, ValidationError> {
        match self {
            Candidate::MultipleChoice {
                question,
                options,
                correct_answer,
            } => MultipleChoice::new(question.clone(), options.clone(), correct_answer.clone())
                .map(Question::MultipleChoice),
            Candidate::FillInBlank { question, answer } => {
                FillInBlank::new(question.clone(), answer.clone()).map(Question::FillInBlank)
            }
        }
    }
}

/// Parses a raw model response into a candidate of the requested kind.
pub fn parse_candidate(kind: QuestionKind, raw: &str) -> Result<Candidate, ValidationError> {
    let payload = extract_payload(raw)?;
    let fields = payload.as_object().ok_or(ValidationError::NotAnObject)?;
    let candidate = match kind {
        QuestionKind::MultipleChoice => Candidate::MultipleChoice {
            question: normalize_text(required(fields, "question")?),
            options: normalize_options(required(fields, "options")?),
            correct_answer: normalize_text(required(fields, "correct_answer")?),
        },
        QuestionKind::FillInBlank => Candidate::FillInBlank {
            question: normalize_text(required(fields, "question")?),
            answer: normalize_text(required(fields, "answer")?),
        },
    };
    Ok(candidate)
}

/// Finds the JSON document inside a response: a fenced block if there is one,
/// otherwise the first complete value starting at the first `{`.
pub fn extract_payload(raw: &str) -> Result<Value, ValidationError> {
    let fenced = FENCED_BLOCK_REGEX
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty());

    if let Some(body) = fenced {
        return serde_json::from_str(body)
            .map_err(|e| ValidationError::InvalidJson(e.to_string()));
    }

    let start = raw.find('{').ok_or(ValidationError::NoPayload)?;
    match serde_json::Deserializer::from_str(&raw[start..])
        .into_iter::<Value>()
        .next()
    {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(ValidationError::InvalidJson(e.to_string())),
        None => Err(ValidationError::NoPayload),
    }
}

fn required<'a>(
    fields: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a Value, ValidationError> {
    match fields.get(name) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(name)),
        Some(value) => Ok(value),
    }
}

/// Objects collapse to their `description` field when they have one. Anything
/// that is not a string uses its JSON representation.
pub fn normalize_text(value: &Value) -> String {
    let value = match value {
        Value::Object(object) => object.get("description").unwrap_or(value),
        _ => value,
    };
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// A scalar where a list was expected becomes a one-element list, which the
/// option count check then rejects.
pub fn normalize_options(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(normalize_text).collect(),
        other => vec![normalize_text(other)],
    }
}
