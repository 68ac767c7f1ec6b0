mod quiz;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use dotenv::dotenv;
use quiz::ai_helper::ChatGptClient;
use quiz::generator::QuestionGenerator;
use quiz::session::QuizSession;
use quiz::QuestionKind;
use settings::Settings;
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{ChatAction, InputFile, KeyboardButton, KeyboardMarkup, KeyboardRemove},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type QuizStorage = Arc<ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type Generator = Arc<QuestionGenerator<ChatGptClient>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveKind,
    ReceiveTopic {
        kind: QuestionKind,
    },
    ReceiveDifficulty {
        kind: QuestionKind,
        topic: String,
    },
    ReceiveCount {
        kind: QuestionKind,
        topic: String,
        difficulty: String,
    },
    Answering {
        session: QuizSession,
        question_number: usize,
    },
    ReceiveSaveChoice {
        session: QuizSession,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The environment may already be populated, a missing .env is fine
    dotenv().ok();

    pretty_env_logger::init();
    log::info!("Starting quiz bot...");

    let settings = Settings::from_env()?;
    let bot = Bot::from_env();

    log::info!("Opening dialogue storage at {}", settings.db_path);
    let storage: QuizStorage = SqliteStorage::open(&settings.db_path, Json)
        .await?
        .erase();

    let client = ChatGptClient::new(
        &settings.chatgpt_api_key,
        settings.engine,
        settings.model_timeout,
    )?;
    let generator: Generator = Arc::new(QuestionGenerator::new(client, settings.max_retries));
    let results_dir = Arc::new(settings.results_dir);

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveKind].endpoint(receive_kind))
            .branch(dptree::case![State::ReceiveTopic { kind }].endpoint(receive_topic))
            .branch(
                dptree::case![State::ReceiveDifficulty { kind, topic }]
                    .endpoint(receive_difficulty),
            )
            .branch(
                dptree::case![State::ReceiveCount {
                    kind,
                    topic,
                    difficulty
                }]
                .endpoint(
                    move |bot: Bot,
                          dialogue: QuizDialogue,
                          (kind, topic, difficulty): (QuestionKind, String, String),
                          msg: Message| {
                        receive_count(
                            generator.clone(),
                            bot,
                            dialogue,
                            (kind, topic, difficulty),
                            msg,
                        )
                    },
                ),
            )
            .branch(
                dptree::case![State::Answering {
                    session,
                    question_number
                }]
                .endpoint(answer_question),
            )
            .branch(dptree::case![State::ReceiveSaveChoice { session }].endpoint(
                move |bot: Bot, dialogue: QuizDialogue, session: QuizSession, msg: Message| {
                    receive_save_choice(results_dir.clone(), bot, dialogue, session, msg)
                },
            )),
    )
    .dependencies(dptree::deps![storage])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

const MCQ_CHOICE: &str = "MCQ";
const FILL_BLANK_CHOICE: &str = "Fill in the Blank";
const DIFFICULTIES: [&str; 3] = ["Easy", "Medium", "Hard"];
const MAX_QUESTIONS: usize = 20;
const SAVE_RESULTS: &str = "Save results";
const NEW_QUIZ: &str = "New quiz";
const RESULTS_BASENAME: &str = "quiz_results";

fn results_name(chat_id: ChatId) -> String {
    format!("{}_{}", RESULTS_BASENAME, chat_id.0)
}

fn kind_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(MCQ_CHOICE),
        KeyboardButton::new(FILL_BLANK_CHOICE),
    ]])
}

const GREETING_TEXT: &str = "Hi! I'm your study buddy. Tell me a topic and I'll quiz you on it.\nWhich type of questions would you like?";
async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(kind_keyboard())
        .await?;

    dialogue.update(State::ReceiveKind).await?;
    Ok(())
}

async fn receive_kind(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    match msg.text().map(str::parse::<QuestionKind>) {
        Some(Ok(kind)) => {
            bot.send_message(msg.chat.id, "What topic should the quiz be about?")
                .reply_markup(KeyboardRemove::new())
                .await?;
            dialogue.update(State::ReceiveTopic { kind }).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please choose one of the options")
                .reply_markup(kind_keyboard())
                .await?;
        }
    }
    Ok(())
}

async fn receive_topic(
    bot: Bot,
    dialogue: QuizDialogue,
    kind: QuestionKind,
    msg: Message,
) -> HandlerResult {
    let topic = match msg.text().map(str::trim) {
        Some(topic) if !topic.is_empty() => topic.to_string(),
        _ => {
            bot.send_message(msg.chat.id, "Please enter the topic as text")
                .await?;
            return Ok(());
        }
    };

    let keyboard = KeyboardMarkup::new(vec![DIFFICULTIES
        .iter()
        .map(|d| KeyboardButton::new(*d))
        .collect::<Vec<_>>()]);
    bot.send_message(msg.chat.id, "Choose the difficulty")
        .reply_markup(keyboard)
        .await?;

    dialogue
        .update(State::ReceiveDifficulty { kind, topic })
        .await?;
    Ok(())
}

async fn receive_difficulty(
    bot: Bot,
    dialogue: QuizDialogue,
    (kind, topic): (QuestionKind, String),
    msg: Message,
) -> HandlerResult {
    let difficulty = msg
        .text()
        .and_then(|text| DIFFICULTIES.iter().find(|d| d.eq_ignore_ascii_case(text.trim())));
    let difficulty = match difficulty {
        Some(difficulty) => difficulty.to_lowercase(),
        None => {
            bot.send_message(msg.chat.id, "Please choose one of the options")
                .await?;
            return Ok(());
        }
    };

    let keyboard = KeyboardMarkup::new(vec![
        vec![KeyboardButton::new("5"), KeyboardButton::new("10")],
        vec![KeyboardButton::new("15"), KeyboardButton::new("20")],
    ]);
    bot.send_message(
        msg.chat.id,
        format!("How many questions? (1 to {})", MAX_QUESTIONS),
    )
    .reply_markup(keyboard)
    .await?;

    dialogue
        .update(State::ReceiveCount {
            kind,
            topic,
            difficulty,
        })
        .await?;
    Ok(())
}

async fn receive_count(
    generator: Generator,
    bot: Bot,
    dialogue: QuizDialogue,
    (kind, topic, difficulty): (QuestionKind, String, String),
    msg: Message,
) -> HandlerResult {
    let count = match msg.text().map(|text| text.trim().parse::<usize>()) {
        Some(Ok(count)) if (1..=MAX_QUESTIONS).contains(&count) => count,
        _ => {
            bot.send_message(
                msg.chat.id,
                format!("Please enter a number from 1 to {}", MAX_QUESTIONS),
            )
            .await?;
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, "Generating your quiz, this may take a moment...")
        .reply_markup(KeyboardRemove::new())
        .await?;
    // Only a hint for the user, failing to send it changes nothing
    let _ = bot
        .send_chat_action(msg.chat.id, ChatAction::Typing)
        .await;

    let mut session = QuizSession::new();
    let generated = session
        .generate_questions(generator.as_ref(), kind, &topic, &difficulty, count)
        .await;

    if let Err(e) = generated {
        log::error!("Quiz generation failed for chat {}: {}", msg.chat.id.0, e);
        bot.send_message(
            msg.chat.id,
            format!("Sorry, I couldn't generate the quiz: {}\nLet's try again.", e),
        )
        .reply_markup(kind_keyboard())
        .await?;
        dialogue.update(State::ReceiveKind).await?;
        return Ok(());
    }

    send_question(&bot, msg.chat.id, &session, 0).await?;
    dialogue
        .update(State::Answering {
            session,
            question_number: 0,
        })
        .await?;
    Ok(())
}

async fn send_question(
    bot: &Bot,
    chat_id: ChatId,
    session: &QuizSession,
    index: usize,
) -> HandlerResult {
    let Some(question) = session.questions().get(index) else {
        return Ok(());
    };
    let text = format!(
        "Question {} of {}:\n{}",
        index + 1,
        session.questions().len(),
        question.text()
    );

    if question.options().is_empty() {
        bot.send_message(chat_id, format!("{}\n\nType the missing word or phrase.", text))
            .reply_markup(KeyboardRemove::new())
            .await?;
    } else {
        let keyboard = KeyboardMarkup::new(
            question
                .options()
                .iter()
                .map(|option| vec![KeyboardButton::new(option.clone())])
                .collect::<Vec<_>>(),
        );
        bot.send_message(chat_id, text)
            .reply_markup(keyboard)
            .await?;
    }
    Ok(())
}

async fn answer_question(
    bot: Bot,
    dialogue: QuizDialogue,
    (mut session, question_number): (QuizSession, usize),
    msg: Message,
) -> HandlerResult {
    let answer = match msg.text() {
        Some(answer) if !answer.trim().is_empty() => answer,
        _ => {
            bot.send_message(msg.chat.id, "Please answer with text").await?;
            return Ok(());
        }
    };
    session.record_answer(question_number, answer)?;

    let next = question_number + 1;
    if next < session.questions().len() {
        send_question(&bot, msg.chat.id, &session, next).await?;
        dialogue
            .update(State::Answering {
                session,
                question_number: next,
            })
            .await?;
        return Ok(());
    }

    session.evaluate();
    send_results(&bot, msg.chat.id, &session).await?;

    let keyboard = KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(SAVE_RESULTS),
        KeyboardButton::new(NEW_QUIZ),
    ]]);
    bot.send_message(msg.chat.id, "What would you like to do next?")
        .reply_markup(keyboard)
        .await?;

    dialogue.update(State::ReceiveSaveChoice { session }).await?;
    Ok(())
}

async fn send_results(bot: &Bot, chat_id: ChatId, session: &QuizSession) -> HandlerResult {
    let score = session.score_percentage().unwrap_or(0.0);
    bot.send_message(
        chat_id,
        format!(
            "Quiz finished!\nScore: {:.2}% ({} of {} correct)",
            score,
            session.correct_count(),
            session.results().len()
        ),
    )
    .await?;

    for result in session.results() {
        let text = if result.is_correct {
            format!(
                "✅ Question {}: {}\nCorrect answer: {}",
                result.question_number, result.question, result.correct_answer
            )
        } else {
            format!(
                "❌ Question {}: {}\nYour answer: {}\nCorrect answer: {}",
                result.question_number,
                result.question,
                result.user_answer.as_deref().unwrap_or("(no answer)"),
                result.correct_answer
            )
        };
        bot.send_message(chat_id, text).await?;
    }
    Ok(())
}

async fn receive_save_choice(
    results_dir: Arc<PathBuf>,
    bot: Bot,
    dialogue: QuizDialogue,
    session: QuizSession,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(SAVE_RESULTS) => {
            match session.export_results(&results_dir, &results_name(msg.chat.id)) {
                Ok(path) => {
                    bot.send_document(msg.chat.id, InputFile::file(path))
                        .await?;
                }
                Err(e) => {
                    log::error!("Could not export results for chat {}: {}", msg.chat.id.0, e);
                    bot.send_message(msg.chat.id, format!("Could not save results: {}", e))
                        .await?;
                }
            }
        }
        Some(NEW_QUIZ) => {}
        _ => {
            bot.send_message(msg.chat.id, "Please choose one of the options")
                .await?;
            return Ok(());
        }
    }

    bot.send_message(msg.chat.id, "Which type of questions for the next quiz?")
        .reply_markup(kind_keyboard())
        .await?;
    dialogue.update(State::ReceiveKind).await?;
    Ok(())
}
