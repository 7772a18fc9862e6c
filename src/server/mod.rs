pub mod api;
pub mod cookie;
pub mod page;
pub mod render;

use crate::agent::ChatAgent;
use crate::cli::Args;
use crate::history::{ SessionStore, SharedSession };
use crate::llm::{ CompletionParams, SupportedModel };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use axum::{ http::HeaderMap, routing::{ get, post }, Router };
use tower_http::cors::{ Any, CorsLayer };
use log::{ debug, info, error };
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<ChatAgent>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(agent: ChatAgent, sessions: SessionStore) -> Self {
        Self {
            agent: Arc::new(agent),
            sessions,
        }
    }

    pub async fn resolve_session(&self, headers: &HeaderMap) -> (Uuid, SharedSession) {
        self.sessions.get_or_create(cookie::session_id(headers)).await
    }
}

/// Applies sidebar choices on top of the session's last settings.
/// Unknown models keep the previous selection; temperature is clamped.
pub fn merge_params(
    current: CompletionParams,
    model: Option<&str>,
    temperature: Option<f32>
) -> CompletionParams {
    let model = match model {
        Some(raw) =>
            raw.parse::<SupportedModel>().unwrap_or_else(|e| {
                debug!("{}; keeping {}", e, current.model);
                current.model
            }),
        None => current.model,
    };
    CompletionParams::new(model, temperature.unwrap_or(current.temperature))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(page::index))
        .route("/chat", post(page::chat))
        .route("/clear", post(page::clear))
        .route("/healthz", get(|| async { "ok" }))
        .nest("/api", api::routes().layer(cors))
        .with_state(state)
}

pub struct Server {
    addr: String,
    state: AppState,
    args: Args,
}

impl Server {
    pub fn new(addr: String, state: AppState, args: Args) -> Self {
        Self { addr, state, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let ttl = Duration::from_secs(self.args.session_ttl_secs);
        let _sweeper = self.state.sessions.spawn_sweeper(ttl);
        let app = router(self.state.clone());

        if self.args.enable_tls {
            let (cert_path, key_path) = match (&self.args.tls_cert_path, &self.args.tls_key_path) {
                (Some(cert), Some(key)) => (cert, key),
                (Some(_), None) | (None, Some(_)) => {
                    error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                    return Err("Missing TLS certificate or key path".into());
                }
                (None, None) => {
                    error!("--enable-tls was set but no certificate/key paths provided.");
                    return Err("TLS enabled without cert/key".into());
                }
            };
            info!(
                "TLS enabled. Loading certificate from '{}' and key from '{}'",
                cert_path,
                key_path
            );
            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                cert_path,
                key_path
            ).await?;

            info!("Chat UI listening on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await?;
        } else {
            let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                e
            })?;
            info!("Chat UI listening on: http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::DEFAULT_SYSTEM_PROMPT;
    use crate::llm::chat::{ classify_error, ChatClient, CompletionError };
    use crate::llm::chat::mock::MockChatClient;
    use crate::models::chat::ChatMessage;
    use async_trait::async_trait;
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use tokio::sync::Notify;
    use axum::body::{ to_bytes, Body };
    use axum::http::{ header, Request, StatusCode };
    use axum::response::Response;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(mock: Arc<MockChatClient>) -> (Router, AppState) {
        let state = AppState::new(
            ChatAgent::with_client(mock, DEFAULT_SYSTEM_PROMPT),
            SessionStore::new(),
        );
        (router(state.clone()), state)
    }

    async fn body_text(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn cookie_of(resp: &Response) -> String {
        let raw = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    async fn get_page(router: &Router, cookie: &str) -> String {
        let req = Request::get("/").header(header::COOKIE, cookie).body(Body::empty()).unwrap();
        body_text(router.clone().oneshot(req).await.unwrap()).await
    }

    async fn post_form(router: &Router, path: &str, cookie: &str, form: &str) -> Response {
        let req = Request::post(path)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        router.clone().oneshot(req).await.unwrap()
    }

    async fn post_json(router: &Router, path: &str, cookie: &str, json: &str) -> Response {
        let req = Request::post(path)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap();
        router.clone().oneshot(req).await.unwrap()
    }

    async fn new_session(router: &Router) -> String {
        let resp = router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        cookie_of(&resp)
    }

    #[test]
    fn merge_params_keeps_previous_on_bad_input() {
        let current = CompletionParams::new(SupportedModel::Gpt4o, 0.2);
        assert_eq!(merge_params(current, Some("gpt-9"), None), current);
        let merged = merge_params(current, Some("gpt-3.5-turbo"), Some(9.0));
        assert_eq!(merged.model, SupportedModel::Gpt35Turbo);
        assert_eq!(merged.temperature, 2.0);
    }

    #[tokio::test]
    async fn first_visit_renders_shell_and_sets_cookie() {
        let (router, _) = app(Arc::new(MockChatClient::new()));
        let resp = router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(cookie_of(&resp).starts_with("chat_session="));
        let html = body_text(resp).await;
        assert!(html.contains("AI Chat Assistant"));
        assert!(html.contains("<option value=\"gpt-4o-mini\" selected>"));
        assert!(html.contains("value=\"0.7\""));
        assert!(html.contains("Send a message..."));
    }

    #[tokio::test]
    async fn chat_turn_appends_both_messages() {
        let mock = Arc::new(MockChatClient::with_replies(vec![Ok("Hi there".to_string())]));
        let (router, _) = app(mock.clone());
        let cookie = new_session(&router).await;

        let resp = post_form(&router, "/chat", &cookie, "prompt=Hello&model=gpt-4o&temperature=1.5").await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");

        let html = get_page(&router, &cookie).await;
        assert!(html.contains("<div class=\"content\">Hello</div>"));
        assert!(html.contains("<div class=\"content\">Hi there</div>"));
        assert!(html.contains("<option value=\"gpt-4o\" selected>"));

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].params.model, SupportedModel::Gpt4o);
        assert_eq!(calls[0].params.temperature, 1.5);
    }

    #[tokio::test]
    async fn temperature_from_form_is_clamped() {
        let mock = Arc::new(MockChatClient::with_replies(vec![Ok("ok".to_string())]));
        let (router, _) = app(mock.clone());
        let cookie = new_session(&router).await;

        post_form(&router, "/chat", &cookie, "prompt=hot&temperature=5").await;
        assert_eq!(mock.calls()[0].params.temperature, 2.0);
    }

    #[tokio::test]
    async fn rate_limit_shows_warning_once_and_keeps_user_message() {
        let mock = Arc::new(MockChatClient::with_replies(vec![
            Err(classify_error("Rate limit exceeded (429)")),
        ]));
        let (router, state) = app(mock);
        let cookie = new_session(&router).await;

        post_form(&router, "/chat", &cookie, "prompt=Hello").await;

        let html = get_page(&router, &cookie).await;
        assert!(html.contains("notice-warning"));
        assert!(html.contains("Rate limit exceeded. Please wait a moment and try again."));
        assert!(html.contains("Rate limit exceeded (429)"));
        assert!(!html.contains("class=\"chat-message assistant"));

        let id = cookie.trim_start_matches("chat_session=").parse::<Uuid>().unwrap();
        let session = state.sessions.get(&id).await.unwrap();
        assert_eq!(session.lock().await.conversation.len(), 1);

        let html = get_page(&router, &cookie).await;
        assert!(!html.contains("class=\"notice notice-warning"));
        assert!(html.contains("<div class=\"content\">Hello</div>"));
    }

    #[tokio::test]
    async fn clear_resets_the_conversation() {
        let mock = Arc::new(MockChatClient::with_replies(vec![Ok("Hi there".to_string())]));
        let (router, _) = app(mock);
        let cookie = new_session(&router).await;

        post_form(&router, "/chat", &cookie, "prompt=Hello").await;
        let resp = post_form(&router, "/clear", &cookie, "").await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let html = get_page(&router, &cookie).await;
        assert!(!html.contains("class=\"chat-message"));
        assert!(!html.contains("Hello"));
    }

    #[tokio::test]
    async fn user_text_is_escaped() {
        let mock = Arc::new(MockChatClient::with_replies(vec![Ok("fine".to_string())]));
        let (router, _) = app(mock);
        let cookie = new_session(&router).await;

        post_form(&router, "/chat", &cookie, "prompt=%3Cscript%3Ealert(1)%3C%2Fscript%3E").await;
        let html = get_page(&router, &cookie).await;
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>alert(1)"));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let mock = Arc::new(MockChatClient::with_replies(vec![Ok("for alice".to_string())]));
        let (router, _) = app(mock);
        let alice = new_session(&router).await;
        let bob = new_session(&router).await;

        post_form(&router, "/chat", &alice, "prompt=secret").await;
        let html = get_page(&router, &bob).await;
        assert!(!html.contains("secret"));
    }

    #[tokio::test]
    async fn unconfigured_client_disables_chat() {
        let bad_key = reqwest::header::HeaderValue::from_str("Bearer sk-\nbroken").unwrap_err();
        let state = AppState::new(ChatAgent::unconfigured(bad_key.into()), SessionStore::new());
        let router = router(state);
        let cookie = new_session(&router).await;

        let html = get_page(&router, &cookie).await;
        assert!(html.contains("Error configuring OpenAI API: Invalid API key format"));
        assert!(html.contains("Please check your API key and try again."));

        let resp = post_json(&router, "/api/chat", &cookie, r#"{"content":"Hello"}"#).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn api_chat_returns_tagged_messages() {
        let mock = Arc::new(MockChatClient::with_replies(vec![
            Ok("Hi there".to_string()),
            Err(classify_error("Rate limit exceeded (429)")),
        ]));
        let (router, _) = app(mock.clone());
        let cookie = new_session(&router).await;

        let resp = post_json(
            &router,
            "/api/chat",
            &cookie,
            r#"{"content":"Hello","model":"gpt-4-turbo","temperature":0.1}"#
        ).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(body["type"], "response");
        assert_eq!(body["content"], "Hi there");

        let resp = post_json(&router, "/api/chat", &cookie, r#"{"content":"Again"}"#).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(body["type"], "error");
        assert_eq!(body["kind"], "rate_limited");
        assert_eq!(body["detail"], "Rate limit exceeded (429)");

        // the second call reused the settings chosen by the first
        assert_eq!(mock.calls()[1].params.model, SupportedModel::Gpt4Turbo);

        let req = Request::get("/api/messages").header(header::COOKIE, &cookie).body(Body::empty()).unwrap();
        let body: Value = serde_json::from_str(&body_text(router.clone().oneshot(req).await.unwrap()).await).unwrap();
        let roles: Vec<&str> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
    }

    #[tokio::test]
    async fn api_rejects_empty_content() {
        let (router, _) = app(Arc::new(MockChatClient::new()));
        let cookie = new_session(&router).await;
        let resp = post_json(&router, "/api/chat", &cookie, r#"{"content":"  "}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn turn_in_flight_is_reported_busy() {
        let (router, state) = app(Arc::new(MockChatClient::new()));
        let (id, session) = state.sessions.get_or_create(None).await;
        let cookie = format!("chat_session={}", id);

        let _guard = session.lock().await;
        let resp = post_json(&router, "/api/chat", &cookie, r#"{"content":"Hello"}"#).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(body["type"], "processing");

        let html = get_page(&router, &cookie).await;
        assert!(html.contains("class=\"spinner active\""));
        assert!(html.contains("http-equiv=\"refresh\""));

        let req = Request::get("/api/messages").header(header::COOKIE, &cookie).body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(body["type"], "processing");

        let resp = post_json(&router, "/api/clear", &cookie, "").await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    /// Answers the first call at once and holds every later call until released.
    #[derive(Default)]
    struct HeldSecondTurn {
        calls: AtomicUsize,
        release: Notify,
    }

    #[async_trait]
    impl ChatClient for HeldSecondTurn {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _params: &CompletionParams
        ) -> Result<String, CompletionError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
                self.release.notified().await;
            }
            Ok("Hi there".to_string())
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn busy_page_keeps_history_and_settings() {
        let client = Arc::new(HeldSecondTurn::default());
        let state = AppState::new(
            ChatAgent::with_client(client.clone(), DEFAULT_SYSTEM_PROMPT),
            SessionStore::new(),
        );
        let router = router(state.clone());
        let cookie = new_session(&router).await;
        let id = cookie.trim_start_matches("chat_session=").parse::<Uuid>().unwrap();
        let session = state.sessions.get(&id).await.unwrap();

        post_form(&router, "/chat", &cookie, "prompt=Hello&model=gpt-4o&temperature=1.2").await;

        let turn = {
            let (router, cookie) = (router.clone(), cookie.clone());
            tokio::spawn(async move { post_form(&router, "/chat", &cookie, "prompt=Second").await.status() })
        };
        while session.try_lock().is_ok() {
            tokio::task::yield_now().await;
        }

        let html = get_page(&router, &cookie).await;
        assert!(html.contains("class=\"spinner active\""));
        assert!(html.contains("<option value=\"gpt-4o\" selected>"));
        assert!(html.contains("value=\"1.2\""));
        assert!(html.contains("<div class=\"content\">Hello</div>"));
        assert!(html.contains("<div class=\"content\">Hi there</div>"));

        client.release.notify_one();
        assert_eq!(turn.await.unwrap(), StatusCode::SEE_OTHER);
        assert_eq!(session.lock().await.conversation.len(), 4);
    }

    #[tokio::test]
    async fn api_models_and_session_end() {
        let (router, _) = app(Arc::new(MockChatClient::new()));
        let cookie = new_session(&router).await;

        let req = Request::get("/api/models").body(Body::empty()).unwrap();
        let body: Value = serde_json::from_str(&body_text(router.clone().oneshot(req).await.unwrap()).await).unwrap();
        assert_eq!(body["models"].as_array().unwrap().len(), 4);
        assert_eq!(body["default_model"], "gpt-4o-mini");

        let req = Request::delete("/api/session").header(header::COOKIE, &cookie).body(Body::empty()).unwrap();
        assert_eq!(router.clone().oneshot(req).await.unwrap().status(), StatusCode::NO_CONTENT);
        let req = Request::delete("/api/session").header(header::COOKIE, &cookie).body(Body::empty()).unwrap();
        assert_eq!(router.clone().oneshot(req).await.unwrap().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let (router, _) = app(Arc::new(MockChatClient::new()));
        let resp = router
            .clone()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(resp).await, "ok");
    }
}
