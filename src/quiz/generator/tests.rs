use super::*;
use crate::quiz::ai_helper::mock::MockModelClient;
use crate::quiz::BLANK_MARKER;

const VALID_MCQ: &str = r#"```json
{
    "question": "What is the capital of France?",
    "options": ["London", "Berlin", "Paris", "Madrid"],
    "correct_answer": "Paris"
}
```"#;

const THREE_OPTION_MCQ: &str = r#"{
    "question": "What is the capital of France?",
    "options": ["London", "Berlin", "Paris"],
    "correct_answer": "Paris"
}"#;

const DUPLICATE_OPTION_MCQ: &str = r#"{
    "question": "What is the capital of France?",
    "options": ["Paris", "Paris", "Berlin", "London"],
    "correct_answer": "Paris"
}"#;

const SCALAR_OPTIONS_MCQ: &str = r#"{
    "question": "What is the capital of France?",
    "options": "Paris",
    "correct_answer": "Paris"
}"#;

const RECASED_ANSWER_MCQ: &str = r#"{
    "question": "What is the capital of France?",
    "options": ["London", "Berlin", "Paris", "Madrid"],
    "correct_answer": "paris"
}"#;

const VALID_FILL_BLANK: &str =
    r#"{"question": {"description": "The capital of France is ____."}, "answer": " Paris "}"#;

const NO_MARKER_FILL_BLANK: &str =
    r#"{"question": "The capital of France is Paris.", "answer": "Paris"}"#;

fn generator(client: &MockModelClient, max_retries: u32) -> QuestionGenerator<MockModelClient> {
    QuestionGenerator::new(client.clone(), max_retries)
}

#[tokio::test]
async fn accepts_first_valid_response() {
    let client = MockModelClient::new().reply(VALID_MCQ);
    let question = generator(&client, 3)
        .generate(QuestionKind::MultipleChoice, "geography", "easy")
        .await
        .unwrap();

    assert_eq!(client.call_count(), 1);
    assert_eq!(question.kind(), QuestionKind::MultipleChoice);
    assert_eq!(question.options().len(), 4);
    assert!(question.options().iter().any(|o| o == question.correct_answer()));
}

#[tokio::test]
async fn sends_resolved_prompt() {
    let client = MockModelClient::new().reply(VALID_MCQ);
    generator(&client, 3)
        .generate(QuestionKind::MultipleChoice, "geography", "easy")
        .await
        .unwrap();

    assert_eq!(
        client.prompts(),
        vec![prompts::resolve(
            QuestionKind::MultipleChoice,
            "geography",
            "easy"
        )]
    );
}

#[tokio::test]
async fn retries_until_valid() {
    let client = MockModelClient::new()
        .reply(THREE_OPTION_MCQ)
        .reply("Sorry, I can't do that.")
        .reply(VALID_MCQ);
    let question = generator(&client, 3)
        .generate(QuestionKind::MultipleChoice, "geography", "easy")
        .await
        .unwrap();

    assert_eq!(client.call_count(), 3);
    assert_eq!(question.correct_answer(), "Paris");
}

#[tokio::test]
async fn recased_answer_forces_new_generation() {
    let client = MockModelClient::new()
        .reply(RECASED_ANSWER_MCQ)
        .reply(VALID_MCQ);
    let question = generator(&client, 3)
        .generate(QuestionKind::MultipleChoice, "geography", "easy")
        .await
        .unwrap();

    assert_eq!(client.call_count(), 2);
    assert_eq!(question.correct_answer(), "Paris");
}

#[tokio::test]
async fn duplicate_options_force_new_generation() {
    let client = MockModelClient::new()
        .reply(DUPLICATE_OPTION_MCQ)
        .reply(VALID_MCQ);
    let question = generator(&client, 3)
        .generate(QuestionKind::MultipleChoice, "geography", "easy")
        .await
        .unwrap();

    assert_eq!(client.call_count(), 2);
    assert_eq!(question.options(), &["London", "Berlin", "Paris", "Madrid"]);
}

#[tokio::test]
async fn scalar_options_force_new_generation() {
    let client = MockModelClient::new()
        .reply(SCALAR_OPTIONS_MCQ)
        .reply(VALID_MCQ);
    let question = generator(&client, 3)
        .generate(QuestionKind::MultipleChoice, "geography", "easy")
        .await
        .unwrap();

    assert_eq!(client.call_count(), 2);
    assert_eq!(question.options().len(), 4);
}

#[tokio::test]
async fn fails_after_exactly_max_retries() {
    let client = MockModelClient::new().reply(THREE_OPTION_MCQ);
    let result = generator(&client, 5)
        .generate(QuestionKind::MultipleChoice, "geography", "hard")
        .await;

    assert_eq!(client.call_count(), 5);
    match result {
        Err(QuizError::Exhausted {
            kind,
            topic,
            difficulty,
            attempts,
        }) => {
            assert_eq!(kind, QuestionKind::MultipleChoice);
            assert_eq!(topic, "geography");
            assert_eq!(difficulty, "hard");
            assert_eq!(attempts, 5);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[tokio::test]
async fn unparseable_responses_are_retried() {
    let client = MockModelClient::new().reply("no json here");
    let result = generator(&client, 2)
        .generate(QuestionKind::FillInBlank, "rust", "medium")
        .await;

    assert_eq!(client.call_count(), 2);
    assert!(matches!(result, Err(QuizError::Exhausted { attempts: 2, .. })));
}

#[tokio::test]
async fn backend_failure_short_circuits() {
    let client = MockModelClient::new().fail("rate limited").reply(VALID_MCQ);
    let result = generator(&client, 3)
        .generate(QuestionKind::MultipleChoice, "geography", "easy")
        .await;

    assert_eq!(client.call_count(), 1);
    match result {
        Err(QuizError::Backend(cause)) => assert!(cause.to_string().contains("rate limited")),
        other => panic!("expected backend failure, got {:?}", other),
    }
}

#[tokio::test]
async fn backend_failure_after_rejection_is_still_fatal() {
    let client = MockModelClient::new()
        .reply(THREE_OPTION_MCQ)
        .fail("connection reset")
        .reply(VALID_MCQ);
    let result = generator(&client, 3)
        .generate(QuestionKind::MultipleChoice, "geography", "easy")
        .await;

    assert_eq!(client.call_count(), 2);
    assert!(matches!(result, Err(QuizError::Backend(_))));
}

#[tokio::test]
async fn zero_retries_never_calls_the_model() {
    let client = MockModelClient::new().reply(VALID_MCQ);
    let result = generator(&client, 0)
        .generate(QuestionKind::MultipleChoice, "geography", "easy")
        .await;

    assert_eq!(client.call_count(), 0);
    assert!(matches!(result, Err(QuizError::Exhausted { attempts: 0, .. })));
}

#[tokio::test]
async fn fill_in_blank_needs_marker() {
    let client = MockModelClient::new()
        .reply(NO_MARKER_FILL_BLANK)
        .reply(VALID_FILL_BLANK);
    let question = generator(&client, 3)
        .generate(QuestionKind::FillInBlank, "geography", "easy")
        .await
        .unwrap();

    assert_eq!(client.call_count(), 2);
    assert!(question.text().contains(BLANK_MARKER));
    assert_eq!(question.text(), "The capital of France is ____.");
    assert_eq!(question.correct_answer(), "Paris");
}

#[tokio::test]
async fn requested_kind_decides_the_schema() {
    // A fill-in-the-blank payload lacks the MCQ fields
    let client = MockModelClient::new().reply(VALID_FILL_BLANK);
    let result = generator(&client, 2)
        .generate(QuestionKind::MultipleChoice, "geography", "easy")
        .await;

    assert!(matches!(result, Err(QuizError::Exhausted { .. })));
}
