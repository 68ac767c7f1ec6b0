use std::path::PathBuf;

use thiserror::Error;

use crate::quiz::QuestionKind;

/// A model response that could not be turned into a question.
///
/// These never leave the generator: each one rejects a single attempt and the
/// loop asks the model again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no JSON object found in model response")]
    NoPayload,

    #[error("model response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload is missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{0}' is empty")]
    EmptyField(&'static str),

    #[error("expected {expected} options, got {actual}")]
    WrongOptionCount { expected: usize, actual: usize },

    #[error("option '{0}' appears more than once")]
    DuplicateOption(String),

    #[error("correct answer '{0}' is not one of the options")]
    AnswerNotInOptions(String),

    #[error("question text has no blank marker")]
    MissingBlankMarker,
}

/// Errors surfaced to whoever asked for questions.
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("failed to generate question: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(
        "no valid {kind} question about '{topic}' ({difficulty}) after {attempts} attempts"
    )]
    Exhausted {
        kind: QuestionKind,
        topic: String,
        difficulty: String,
        attempts: u32,
    },

    #[error("unknown question type '{0}'")]
    UnknownKind(String),

    #[error("there is no question number {}", .0 + 1)]
    NoSuchQuestion(usize),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no results to save")]
    NoResults,

    #[error("invalid file name '{0}'")]
    InvalidName(String),

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}
