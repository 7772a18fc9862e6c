use crate::cli::Args;
use crate::llm::{ CompletionParams, LlmConfig };
use crate::llm::chat::{ ChatClient, CompletionError, ConfigError, new_client as new_chat_client };
use crate::models::chat::{ ChatMessage, Conversation };

use log::{ info, warn, error };
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("message is empty")]
    EmptyPrompt,
    #[error("chat client is not configured: {0}")]
    NotConfigured(String),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Drives one user turn against the completion endpoint.
///
/// Client construction failure is kept rather than propagated, so the server
/// still starts and every page can explain why chat is unavailable.
#[derive(Clone)]
pub struct ChatAgent {
    chat_client: Result<Arc<dyn ChatClient>, Arc<ConfigError>>,
    system_prompt: String,
}

impl ChatAgent {
    pub fn new(args: &Args) -> Self {
        let chat_config = LlmConfig {
            api_key: args.openai_api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: args.chat_base_url.clone(),
            max_tokens: args.max_tokens,
            timeout: Duration::from_secs(args.request_timeout_secs),
        };

        let chat_client = match new_chat_client(&chat_config) {
            Ok(client) => {
                info!(
                    "Chat client configured: BaseURL={:?}, MaxTokens={}, Timeout={:?}",
                    client.get_base_url().as_deref().unwrap_or("adapter default"),
                    chat_config.max_tokens,
                    chat_config.timeout
                );
                if chat_config.api_key.is_none() {
                    warn!("OPENAI_API_KEY is not set; chat requests will be rejected as unauthorized.");
                }
                Ok(client)
            }
            Err(e) => {
                error!("Error configuring OpenAI API: {}", e);
                Err(Arc::new(e))
            }
        };

        Self {
            chat_client,
            system_prompt: args.system_prompt.clone(),
        }
    }

    pub fn with_client(chat_client: Arc<dyn ChatClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            chat_client: Ok(chat_client),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn unconfigured(reason: ConfigError) -> Self {
        Self {
            chat_client: Err(Arc::new(reason)),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn setup_error(&self) -> Option<&ConfigError> {
        self.chat_client.as_ref().err().map(|e| &**e)
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Appends the user message, calls the endpoint once and appends the reply.
    ///
    /// On a completion failure the user message stays and nothing else is
    /// appended. Empty prompts and an unconfigured client leave the
    /// conversation untouched.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        prompt: &str,
        params: &CompletionParams
    ) -> Result<ChatMessage, TurnError> {
        if prompt.trim().is_empty() {
            return Err(TurnError::EmptyPrompt);
        }
        let client = self.chat_client
            .as_ref()
            .map_err(|reason| TurnError::NotConfigured(reason.to_string()))?;

        conversation.append(ChatMessage::user(prompt));
        let messages = conversation.request_messages(&self.system_prompt);

        info!(
            "Session {}: turn with model={}, temperature={}, history={}",
            conversation.id,
            params.model,
            params.temperature,
            conversation.len()
        );

        match client.complete(&messages, params).await {
            Ok(text) => {
                let reply = ChatMessage::assistant(text);
                conversation.append(reply.clone());
                Ok(reply)
            }
            Err(e) => {
                match &e {
                    CompletionError::RateLimited(_) => warn!("Session {}: {}", conversation.id, e),
                    _ => error!("Session {}: {}", conversation.id, e),
                }
                Err(TurnError::Completion(e))
            }
        }
    }
}
