use std::future::Future;
use std::time::Duration;

use chatgpt::client::ChatGPT;
use chatgpt::config::ChatGPTEngine;
use chatgpt::types::CompletionResponse;
use log::debug;

/// One request to a language model: prompt in, raw text out.
///
/// Implementations must not retry and must not look at the content. Errors
/// from the backend are returned as they are.
pub trait ModelClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

pub struct ChatGptClient {
    chat_gpt: ChatGPT,
}

impl ChatGptClient {
    pub fn new(
        api_key: &str,
        engine: ChatGPTEngine,
        timeout: Duration,
    ) -> Result<Self, chatgpt::err::Error> {
        let mut chat_gpt = ChatGPT::new(api_key)?;

        chat_gpt.config.engine = engine;
        chat_gpt.config.timeout = timeout;

        Ok(Self { chat_gpt })
    }
}

impl ModelClient for ChatGptClient {
    type Error = chatgpt::err::Error;

    async fn complete(&self, prompt: &str) -> Result<String, Self::Error> {
        let response: CompletionResponse = self.chat_gpt.send_message(prompt).await?;
        let content = response.message().clone().content;

        debug!("Completion: {:?}", content);

        Ok(content)
    }
}
