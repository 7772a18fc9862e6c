mod session_store;

pub use self::session_store::{ SessionStore, SharedSession };

use crate::llm::CompletionParams;
use crate::models::chat::{ ChatMessage, Conversation };
use crate::models::notice::Notice;

/// Everything one browser session owns. Dropped when the session expires.
#[derive(Debug)]
pub struct ChatSession {
    pub conversation: Conversation,
    pub params: CompletionParams,
    pub notice: Option<Notice>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            conversation: Conversation::new(id),
            params: CompletionParams::default(),
            notice: None,
        }
    }

    pub fn clear(&mut self) {
        self.conversation.clear();
        self.notice = None;
    }

    /// Returns the pending notice and forgets it, so it is shown once.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            params: self.params,
            messages: self.conversation.all().to_vec(),
        }
    }
}

/// Read-only copy of a session taken when a turn starts. Rendered in place
/// of the live session while that turn holds its lock.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub params: CompletionParams,
    pub messages: Vec<ChatMessage>,
}
