use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ ChatClient, CompletionError };
use crate::llm::CompletionParams;
use crate::models::chat::ChatMessage;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub params: CompletionParams,
}

/// Scripted client: replays queued results in order and records every call.
#[derive(Default)]
pub struct MockChatClient {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I>(replies: I) -> Self
        where I: IntoIterator<Item = Result<String, CompletionError>>
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams
    ) -> Result<String, CompletionError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                params: *params,
            });
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Err(CompletionError::Other("no scripted reply".to_string())))
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}
