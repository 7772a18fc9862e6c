use crate::llm::chat::CompletionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::Info => "notice-info",
            Severity::Warning => "notice-warning",
            Severity::Error => "notice-error",
        }
    }
}

/// One-shot message shown above the chat input after a turn.
#[derive(Clone, Debug)]
pub enum Notice {
    Completion(CompletionError),
    Busy,
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Notice::Completion(CompletionError::RateLimited(_)) => Severity::Warning,
            Notice::Completion(_) => Severity::Error,
            Notice::Busy => Severity::Info,
        }
    }

    pub fn headline(&self) -> String {
        match self {
            Notice::Completion(CompletionError::RateLimited(_)) =>
                "⏳ Rate limit exceeded. Please wait a moment and try again.".to_string(),
            Notice::Completion(CompletionError::Unauthorized(_)) =>
                "🔑 Invalid API key. Please check your OpenAI API key.".to_string(),
            Notice::Completion(CompletionError::ConnectionFailed(_)) =>
                "🌐 Connection error. Please check your internet connection or try disabling VPN/proxy.".to_string(),
            Notice::Completion(CompletionError::Other(raw)) =>
                format!("Error generating response: {}", raw),
            Notice::Busy => "A response is still being generated. Please wait.".to_string(),
        }
    }

    /// Raw error text for the collapsible details block, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            Notice::Completion(CompletionError::RateLimited(raw)) => Some(raw.as_str()),
            _ => None,
        }
    }
}
