pub mod agent;
pub mod models;
pub mod server;
pub mod llm;
pub mod cli;
pub mod history;

use agent::ChatAgent;
use cli::Args;
use history::SessionStore;
use log::info;
use server::{ AppState, Server };
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat Base URL: {}", args.chat_base_url.as_deref().unwrap_or("https://api.openai.com"));
    info!(
        "API Key: {}",
        if args.openai_api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) { "set" } else { "missing" }
    );
    info!("Request Timeout: {}s", args.request_timeout_secs);
    info!("Max Tokens: {}", args.max_tokens);
    info!("Session TTL: {}s", args.session_ttl_secs);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let agent = ChatAgent::new(&args);
    let state = AppState::new(agent, SessionStore::new());
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, state, args.clone());
    server.run().await?;

    Ok(())
}
