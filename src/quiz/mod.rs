use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod ai_helper;
pub mod error;
pub mod export;
pub mod generator;
pub mod prompts;
pub mod schema;
pub mod session;

use error::{QuizError, ValidationError};

/// Marks the position of the missing word in a fill-in-the-blank question.
pub const BLANK_MARKER: &str = "____";
pub const MCQ_OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    MultipleChoice,
    FillInBlank,
}

impl QuestionKind {
    /// Label used in result rows and exported files.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "MCQ",
            QuestionKind::FillInBlank => "Fill in the Blank",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuestionKind {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcq" | "multiple choice" => Ok(QuestionKind::MultipleChoice),
            "fill in the blank" | "fill in blank" | "fill-in-the-blank" => {
                Ok(QuestionKind::FillInBlank)
            }
            _ => Err(QuizError::UnknownKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MultipleChoiceFields")]
pub struct MultipleChoice {
    text: String,
    options: Vec<String>,
    correct_answer: String,
}

#[derive(Deserialize)]
struct MultipleChoiceFields {
    text: String,
    options: Vec<String>,
    correct_answer: String,
}

impl TryFrom<MultipleChoiceFields> for MultipleChoice {
    type Error = ValidationError;

    fn try_from(fields: MultipleChoiceFields) -> Result<Self, Self::Error> {
        MultipleChoice::new(fields.text, fields.options, fields.correct_answer)
    }
}

impl MultipleChoice {
    pub fn new(
        text: String,
        options: Vec<String>,
        correct_answer: String,
    ) -> Result<Self, ValidationError> {
        if text.is_empty() {
            return Err(ValidationError::EmptyField("question"));
        }
        if options.len() != MCQ_OPTION_COUNT {
            return Err(ValidationError::WrongOptionCount {
                expected: MCQ_OPTION_COUNT,
                actual: options.len(),
            });
        }
        let mut seen = HashSet::new();
        for option in &options {
            if option.is_empty() {
                return Err(ValidationError::EmptyField("options"));
            }
            if !seen.insert(option.as_str()) {
                return Err(ValidationError::DuplicateOption(option.clone()));
            }
        }
        // Exact membership: a paraphrased or re-cased answer is rejected
        if !options.contains(&correct_answer) {
            return Err(ValidationError::AnswerNotInOptions(correct_answer));
        }
        Ok(Self {
            text,
            options,
            correct_answer,
        })
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FillInBlankFields")]
pub struct FillInBlank {
    text: String,
    answer: String,
}

#[derive(Deserialize)]
struct FillInBlankFields {
    text: String,
    answer: String,
}

impl TryFrom<FillInBlankFields> for FillInBlank {
    type Error = ValidationError;

    fn try_from(fields: FillInBlankFields) -> Result<Self, Self::Error> {
        FillInBlank::new(fields.text, fields.answer)
    }
}

impl FillInBlank {
    pub fn new(text: String, answer: String) -> Result<Self, ValidationError> {
        if text.is_empty() {
            return Err(ValidationError::EmptyField("question"));
        }
        if !text.contains(BLANK_MARKER) {
            return Err(ValidationError::MissingBlankMarker);
        }
        if answer.is_empty() {
            return Err(ValidationError::EmptyField("answer"));
        }
        Ok(Self { text, answer })
    }
}

/// A structurally valid question. The only way to get one is through the
/// checked constructors above, so every instance satisfies its variant's rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Question {
    MultipleChoice(MultipleChoice),
    FillInBlank(FillInBlank),
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        match self {
            Question::MultipleChoice(_) => QuestionKind::MultipleChoice,
            Question::FillInBlank(_) => QuestionKind::FillInBlank,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Question::MultipleChoice(q) => &q.text,
            Question::FillInBlank(q) => &q.text,
        }
    }

    pub fn correct_answer(&self) -> &str {
        match self {
            Question::MultipleChoice(q) => &q.correct_answer,
            Question::FillInBlank(q) => &q.answer,
        }
    }

    /// Empty for fill-in-the-blank questions.
    pub fn options(&self) -> &[String] {
        match self {
            Question::MultipleChoice(q) => q.options(),
            Question::FillInBlank(_) => &[],
        }
    }

    pub fn is_correct(&self, answer: Option<&str>) -> bool {
        answer == Some(self.correct_answer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_kind_labels() {
        assert_eq!(
            "MCQ".parse::<QuestionKind>().unwrap(),
            QuestionKind::MultipleChoice
        );
        assert_eq!(
            "Fill in the Blank".parse::<QuestionKind>().unwrap(),
            QuestionKind::FillInBlank
        );
        assert!(matches!(
            "essay".parse::<QuestionKind>(),
            Err(QuizError::UnknownKind(k)) if k == "essay"
        ));
    }

    #[test]
    fn accepts_well_formed_mcq() {
        let question = MultipleChoice::new(
            "Capital of France?".into(),
            options(&["Berlin", "Paris", "Rome", "Madrid"]),
            "Paris".into(),
        )
        .unwrap();
        assert_eq!(question.options().len(), 4);
    }

    #[test]
    fn rejects_mcq_with_three_options() {
        let result = MultipleChoice::new(
            "Capital of France?".into(),
            options(&["Berlin", "Paris", "Rome"]),
            "Paris".into(),
        );
        assert_eq!(
            result,
            Err(ValidationError::WrongOptionCount {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn rejects_mcq_with_duplicate_options() {
        let result = MultipleChoice::new(
            "Capital of France?".into(),
            options(&["Paris", "Paris", "Rome", "Madrid"]),
            "Paris".into(),
        );
        assert_eq!(
            result,
            Err(ValidationError::DuplicateOption("Paris".into()))
        );
    }

    #[test]
    fn rejects_mcq_with_recased_answer() {
        let result = MultipleChoice::new(
            "Capital of France?".into(),
            options(&["Berlin", "Paris", "Rome", "Madrid"]),
            "paris".into(),
        );
        assert_eq!(
            result,
            Err(ValidationError::AnswerNotInOptions("paris".into()))
        );
    }

    #[test]
    fn rejects_fill_in_blank_without_marker() {
        let result = FillInBlank::new("The capital of France is Paris.".into(), "Paris".into());
        assert_eq!(result, Err(ValidationError::MissingBlankMarker));
    }

    #[test]
    fn rejects_fill_in_blank_without_answer() {
        let result = FillInBlank::new("The capital of France is ____.".into(), "".into());
        assert_eq!(result, Err(ValidationError::EmptyField("answer")));
    }

    #[test]
    fn deserialization_runs_structural_checks() {
        let json = r#"{"MultipleChoice":{"text":"Q?","options":["a","b"],"correct_answer":"a"}}"#;
        assert!(serde_json::from_str::<Question>(json).is_err());

        let json = r#"{"FillInBlank":{"text":"The sky is ____.","answer":"blue"}}"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.correct_answer(), "blue");
        assert!(question.options().is_empty());
    }

    #[test]
    fn correctness_is_exact() {
        let question = Question::FillInBlank(
            FillInBlank::new("The sky is ____.".into(), "blue".into()).unwrap(),
        );
        assert!(question.is_correct(Some("blue")));
        assert!(!question.is_correct(Some("Blue")));
        assert!(!question.is_correct(Some("blue ")));
        assert!(!question.is_correct(None));
    }
}
