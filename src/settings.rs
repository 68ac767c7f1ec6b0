use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chatgpt::config::ChatGPTEngine;
use thiserror::Error;

use crate::quiz::generator::DEFAULT_MAX_RETRIES;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Everything read from the environment at startup.
pub struct Settings {
    pub chatgpt_api_key: String,
    pub engine: ChatGPTEngine,
    pub model_timeout: Duration,
    pub max_retries: u32,
    pub results_dir: PathBuf,
    pub db_path: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let chatgpt_api_key = lookup("CHATGPT_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(SettingsError::Missing("CHATGPT_API_KEY"))?;

        let engine = match lookup("QUIZ_MODEL") {
            None => ChatGPTEngine::Gpt35Turbo,
            Some(model) => parse_engine(&model).ok_or(SettingsError::Invalid {
                name: "QUIZ_MODEL",
                value: model,
            })?,
        };

        let timeout_secs = parse_or(&lookup, "QUIZ_MODEL_TIMEOUT_SECS", 15)?;
        let max_retries = parse_or(&lookup, "QUIZ_MAX_RETRIES", DEFAULT_MAX_RETRIES)?;

        Ok(Settings {
            chatgpt_api_key,
            engine,
            model_timeout: Duration::from_secs(timeout_secs),
            max_retries,
            results_dir: lookup("QUIZ_RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("results")),
            db_path: lookup("QUIZ_DB_PATH").unwrap_or_else(|| "db.sqlite".to_string()),
        })
    }
}

fn parse_engine(model: &str) -> Option<ChatGPTEngine> {
    match model.trim() {
        "gpt-3.5-turbo" => Some(ChatGPTEngine::Gpt35Turbo),
        "gpt-4" => Some(ChatGPTEngine::Gpt4),
        "gpt-4-32k" => Some(ChatGPTEngine::Gpt4_32k),
        _ => None,
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, SettingsError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(SettingsError::Invalid { name, value }),
        },
    }
}
