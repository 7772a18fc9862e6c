use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// API key for the OpenAI-compatible chat completion endpoint.
    /// When absent the server still starts; each chat turn reports an invalid key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of the chat completion API (e.g., https://api.openai.com)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let the client handle it if None
    pub chat_base_url: Option<String>,

    /// Timeout in seconds for a single completion request.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,

    /// Maximum number of tokens the model may generate per reply.
    #[arg(long, env = "MAX_TOKENS", default_value = "4096")]
    pub max_tokens: u32,

    /// System message prepended to every conversation before it is sent.
    #[arg(long, env = "SYSTEM_PROMPT", default_value = "You are a helpful AI assistant.")]
    pub system_prompt: String,

    // --- Session Args ---
    /// Seconds of inactivity after which a browser session and its history are dropped.
    #[arg(long, env = "SESSION_TTL_SECS", default_value = "3600")]
    pub session_ttl_secs: u64,

    // --- General App Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:8501")]
    pub server_addr: String,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Optional path to the TLS certificate file (PEM format) for serving HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for serving HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
