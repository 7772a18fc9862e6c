use axum::{
    extract::State,
    http::{ header::SET_COOKIE, HeaderMap, StatusCode },
    response::{ IntoResponse, Response },
    routing::{ delete, get, post },
    Json,
    Router,
};
use log::{ info, warn };

use super::cookie::{ session_cookie, session_id };
use super::{ merge_params, AppState };
use crate::agent::TurnError;
use crate::llm::chat::CompletionError;
use crate::llm::{
    SupportedModel,
    DEFAULT_TEMPERATURE,
    MAX_TEMPERATURE,
    MIN_TEMPERATURE,
    TEMPERATURE_STEP,
};
use crate::models::api::{ ChatRequest, ModelsResponse, ServerMessage };
use crate::models::notice::Notice;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/messages", get(messages_handler))
        .route("/clear", post(clear_handler))
        .route("/models", get(models_handler))
        .route("/session", delete(end_session_handler))
}

fn turn_error_response(err: TurnError) -> (StatusCode, ServerMessage) {
    match err {
        TurnError::EmptyPrompt => (StatusCode::BAD_REQUEST, ServerMessage::Error {
            kind: "empty_prompt".into(),
            message: "Message content must not be empty".into(),
            detail: None,
        }),
        TurnError::NotConfigured(reason) => (StatusCode::SERVICE_UNAVAILABLE, ServerMessage::Error {
            kind: "not_configured".into(),
            message: format!(
                "Error configuring OpenAI API: {}. Please check your API key and try again.",
                reason
            ),
            detail: None,
        }),
        TurnError::Completion(e) => {
            let code = match e {
                CompletionError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            };
            let kind = e.kind().to_string();
            let detail = Some(e.raw().to_string());
            let message = Notice::Completion(e).headline();
            (code, ServerMessage::Error { kind, message, detail })
        }
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Response {
    let (id, session) = state.resolve_session(&headers).await;
    let cookie = [(SET_COOKIE, session_cookie(id))];

    let Ok(mut guard) = session.try_lock() else {
        warn!("Session {}: API turn rejected, previous turn still in flight", id);
        return (StatusCode::CONFLICT, cookie, Json(ServerMessage::Processing)).into_response();
    };

    let params = merge_params(guard.params, req.model.as_deref(), req.temperature);
    guard.params = params;
    state.sessions.record_snapshot(&id, guard.snapshot()).await;

    let (code, body) = match state.agent.run_turn(&mut guard.conversation, &req.content, &params).await {
        Ok(reply) => (StatusCode::OK, ServerMessage::Response {
            content: reply.content,
            timestamp: reply.timestamp,
        }),
        Err(e) => turn_error_response(e),
    };

    (code, cookie, Json(body)).into_response()
}

async fn messages_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, session) = state.resolve_session(&headers).await;
    let cookie = [(SET_COOKIE, session_cookie(id))];
    let conversation = match session.try_lock() {
        Ok(guard) => guard.conversation.clone(),
        Err(_) => {
            return (StatusCode::CONFLICT, cookie, Json(ServerMessage::Processing)).into_response();
        }
    };
    (cookie, Json(conversation)).into_response()
}

async fn clear_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, session) = state.resolve_session(&headers).await;
    let cookie = [(SET_COOKIE, session_cookie(id))];
    let resp = match session.try_lock() {
        Ok(mut guard) => {
            guard.clear();
            (StatusCode::NO_CONTENT, cookie).into_response()
        }
        Err(_) => (StatusCode::CONFLICT, cookie, Json(ServerMessage::Processing)).into_response(),
    };
    resp
}

async fn models_handler() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: SupportedModel::ALL.to_vec(),
        default_model: SupportedModel::default(),
        min_temperature: MIN_TEMPERATURE,
        max_temperature: MAX_TEMPERATURE,
        temperature_step: TEMPERATURE_STEP,
        default_temperature: DEFAULT_TEMPERATURE,
    })
}

async fn end_session_handler(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    match session_id(&headers) {
        Some(id) if state.sessions.remove(&id).await => {
            info!("Session {} ended by client", id);
            StatusCode::NO_CONTENT
        }
        _ => StatusCode::NOT_FOUND,
    }
}
