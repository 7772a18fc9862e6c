pub mod openai;
pub mod mock;
mod error;

pub use self::error::{ classify_error, CompletionError, ConfigError };

use async_trait::async_trait;
use std::sync::Arc;
use super::{ CompletionParams, LlmConfig };
use self::openai::OpenAIChatClient;
use crate::models::chat::ChatMessage;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends the full message list once and returns the generated text verbatim.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams
    ) -> Result<String, CompletionError>;

    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, ConfigError> {
    let specific_client = OpenAIChatClient::from_config(config)?;
    Ok(Arc::new(specific_client))
}
