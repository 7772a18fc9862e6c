use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION}};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatClient, CompletionError, ConfigError};
use crate::llm::{clamp_temperature, CompletionParams, LlmConfig};
use crate::models::chat::ChatMessage;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAIChatClient {
    http: HttpClient,
    api_key: Option<String>,
    base_url: String,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OpenAIMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIErrorBody {
    error: OpenAIErrorDetail,
}

#[derive(Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

fn upstream_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<OpenAIErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
}

impl OpenAIChatClient {
    pub fn new(
        api_key: Option<String>,
        base_url: Option<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", key))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            api_key,
            base_url: api_url,
            max_tokens,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.api_key.clone(),
            config.base_url.clone(),
            config.max_tokens,
            config.timeout,
        )
    }

    fn endpoint(&self) -> String {
        if self.base_url.ends_with("/chat/completions") {
            self.base_url.clone()
        } else {
            format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
        }
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams
    ) -> Result<String, CompletionError> {
        // a missing key is reported on first use rather than at startup
        if self.api_key.is_none() {
            return Err(CompletionError::Unauthorized(
                "No API key provided. Set OPENAI_API_KEY.".to_string()
            ));
        }

        let req = OpenAIChatRequest {
            model: params.model.as_str().to_string(),
            messages: messages.iter().map(OpenAIMessage::from).collect(),
            temperature: clamp_temperature(params.temperature),
            max_tokens: self.max_tokens,
        };

        let url = self.endpoint();
        debug!(
            "OpenAI request: url={}, model={}, temperature={}, messages={}",
            url,
            req.model,
            req.temperature,
            req.messages.len()
        );

        let resp = self.http.post(&url)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let detail = upstream_error_message(&body).unwrap_or(body);
            let text = format!("Error code: {} - {}", status.as_u16(), detail.trim());
            return Err(CompletionError::from_status(status, text));
        }

        let resp = resp.json::<OpenAIResponse>().await?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::Other("No response from OpenAI API".to_string()))
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
