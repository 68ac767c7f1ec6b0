use crate::quiz::{QuestionKind, BLANK_MARKER};

const MCQ_TEMPLATE: &str = "Generate a {difficulty} multiple-choice question about {topic}.

Return ONLY a JSON object with exactly these fields:
- \"question\": a clear, specific question
- \"options\": an array of exactly 4 distinct possible answers
- \"correct_answer\": the correct answer, copied exactly as it appears in \"options\"

Example format:
{
    \"question\": \"What is the capital of France?\",
    \"options\": [\"London\", \"Berlin\", \"Paris\", \"Madrid\"],
    \"correct_answer\": \"Paris\"
}

Your response must be valid JSON with no additional text.";

const FILL_BLANK_TEMPLATE: &str = "Generate a {difficulty} fill-in-the-blank question about {topic}.

Return ONLY a JSON object with exactly these fields:
- \"question\": a sentence with {blank} (four underscores) marking where the missing word or phrase goes
- \"answer\": the correct word or phrase that belongs in the blank

Example format:
{
    \"question\": \"The capital of France is {blank}.\",
    \"answer\": \"Paris\"
}

Your response must be valid JSON with no additional text.";

/// Builds the instruction sent to the model for one question.
pub fn resolve(kind: QuestionKind, topic: &str, difficulty: &str) -> String {
    let template = match kind {
        QuestionKind::MultipleChoice => MCQ_TEMPLATE,
        QuestionKind::FillInBlank => FILL_BLANK_TEMPLATE,
    };
    // Topic last: placeholder-looking text inside it must stay verbatim.
    template
        .replace("{blank}", BLANK_MARKER)
        .replace("{difficulty}", difficulty)
        .replace("{topic}", topic)
}
