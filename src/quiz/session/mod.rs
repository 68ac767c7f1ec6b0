use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::quiz::ai_helper::ModelClient;
use crate::quiz::error::{ExportError, QuizError};
use crate::quiz::export;
use crate::quiz::generator::QuestionGenerator;
use crate::quiz::{Question, QuestionKind};


/// One scored question, as shown after submission and written on export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub question_number: usize,
    pub question: String,
    pub question_type: QuestionKind,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub options: Vec<String>,
    pub is_correct: bool,
}

/// Questions, answers and results of one chat's quiz.
///
/// Indexes are 0-based; question numbers shown to the user are `index + 1`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizSession {
    questions: Vec<Question>,
    user_answers: BTreeMap<usize, String>,
    results: Vec<ResultRow>,
}

impl QuizSession {
    pub fn new() -> Self {
        Default::default()
    }

    /// Replaces the question set with `count` freshly generated questions.
    ///
    /// Questions are requested one after the other. If any request fails the
    /// session is left empty; questions generated before the failure are
    /// dropped.
    pub async fn generate_questions<C: ModelClient>(
        &mut self,
        generator: &QuestionGenerator<C>,
        kind: QuestionKind,
        topic: &str,
        difficulty: &str,
        count: usize,
    ) -> Result<(), QuizError> {
        self.questions.clear();
        self.user_answers.clear();
        self.results.clear();

        let difficulty = difficulty.trim().to_lowercase();
        let mut questions = Vec::with_capacity(count);
        for _ in 0..count {
            match generator.generate(kind, topic, &difficulty).await {
                Ok(question) => questions.push(question),
                Err(e) => {
                    error!("Error generating questions: {}", e);
                    return Err(e);
                }
            }
        }

        info!("Generated {} {} questions about {}", count, kind, topic);
        self.questions = questions;
        Ok(())
    }

    /// Stores the latest answer for a question. Blank values are ignored so
    /// they never erase an answer already given.
    pub fn record_answer(&mut self, index: usize, value: &str) -> Result<(), QuizError> {
        if index >= self.questions.len() {
            return Err(QuizError::NoSuchQuestion(index));
        }
        if value.trim().is_empty() {
            return Ok(());
        }
        self.user_answers.insert(index, value.to_string());
        Ok(())
    }

    /// Recomputes every result row from the current questions and answers.
    pub fn evaluate(&mut self) {
        self.results = self
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let user_answer = self.user_answers.get(&index).cloned();
                ResultRow {
                    question_number: index + 1,
                    question: question.text().to_string(),
                    question_type: question.kind(),
                    is_correct: question.is_correct(user_answer.as_deref()),
                    user_answer,
                    correct_answer: question.correct_answer().to_string(),
                    options: question.options().to_vec(),
                }
            })
            .collect();
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn results(&self) -> &[ResultRow] {
        &self.results
    }

    pub fn correct_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_correct).count()
    }

    /// `None` until there is at least one evaluated question.
    pub fn score_percentage(&self) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        Some(100.0 * self.correct_count() as f64 / self.results.len() as f64)
    }

    /// Writes the results to `{dir}/{name}_{timestamp}.csv` and returns the path.
    pub fn export_results(&self, dir: &Path, name: &str) -> Result<PathBuf, ExportError> {
        export::write_results(&self.results, dir, name)
    }
}
