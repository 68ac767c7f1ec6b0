use log::{error, info, warn};

use crate::quiz::ai_helper::ModelClient;
use crate::quiz::error::{QuizError, ValidationError};
use crate::quiz::schema::{self, Candidate};
use crate::quiz::{prompts, Question, QuestionKind};

#[cfg(test)]
mod tests;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Where a single question request stands. Each loop iteration of
/// [`QuestionGenerator::generate`] performs exactly one transition.
#[derive(Debug)]
enum Attempt {
    Requesting { attempt: u32 },
    Parsing { attempt: u32, raw: String },
    Validating { attempt: u32, candidate: Candidate },
    Rejected { attempt: u32, reason: ValidationError },
    Accepted(Question),
    Failed { attempts: u32 },
}

pub struct QuestionGenerator<C> {
    client: C,
    max_retries: u32,
}

impl<C: ModelClient> QuestionGenerator<C> {
    pub fn new(client: C, max_retries: u32) -> Self {
        Self {
            client,
            max_retries,
        }
    }

    /// Asks the model for one question until a structurally valid one comes
    /// back or `max_retries` attempts have been spent.
    ///
    /// Backend failures end the request at once. Rejected candidates are
    /// logged and retried.
    pub async fn generate(
        &self,
        kind: QuestionKind,
        topic: &str,
        difficulty: &str,
    ) -> Result<Question, QuizError> {
        let prompt = prompts::resolve(kind, topic, difficulty);

        let mut state = self.first_attempt();
        loop {
            state = match state {
                Attempt::Requesting { attempt } => {
                    info!(
                        "Generating {} question for topic: {} and difficulty: {} (attempt {}/{})",
                        kind, topic, difficulty, attempt, self.max_retries
                    );
                    let raw = self.client.complete(&prompt).await.map_err(|e| {
                        error!("Model request failed for topic {}: {}", topic, e);
                        QuizError::Backend(Box::new(e))
                    })?;
                    Attempt::Parsing { attempt, raw }
                }
                Attempt::Parsing { attempt, raw } => match schema::parse_candidate(kind, &raw) {
                    Ok(candidate) => Attempt::Validating { attempt, candidate },
                    Err(reason) => {
                        warn!("Unparseable {} response: {:?}", kind, raw);
                        Attempt::Rejected { attempt, reason }
                    }
                },
                Attempt::Validating { attempt, candidate } => match candidate.to_question() {
                    Ok(question) => Attempt::Accepted(question),
                    Err(reason) => {
                        warn!("Invalid {} response: {:?}", kind, candidate);
                        Attempt::Rejected { attempt, reason }
                    }
                },
                Attempt::Rejected { attempt, reason } => {
                    warn!("Rejected attempt {}/{}: {}", attempt, self.max_retries, reason);
                    self.after_rejection(attempt)
                }
                Attempt::Accepted(question) => return Ok(question),
                Attempt::Failed { attempts } => {
                    error!(
                        "Giving up on {} question for topic: {} and difficulty: {}",
                        kind, topic, difficulty
                    );
                    return Err(QuizError::Exhausted {
                        kind,
                        topic: topic.to_string(),
                        difficulty: difficulty.to_string(),
                        attempts,
                    });
                }
            };
        }
    }

    fn first_attempt(&self) -> Attempt {
        if self.max_retries == 0 {
            Attempt::Failed { attempts: 0 }
        } else {
            Attempt::Requesting { attempt: 1 }
        }
    }

    fn after_rejection(&self, attempt: u32) -> Attempt {
        if attempt < self.max_retries {
            Attempt::Requesting {
                attempt: attempt + 1,
            }
        } else {
            Attempt::Failed { attempts: attempt }
        }
    }
}
