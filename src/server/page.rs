use axum::{
    extract::{ Form, State },
    http::{ header::SET_COOKIE, HeaderMap },
    response::{ Html, IntoResponse, Redirect, Response },
};
use log::{ debug, warn };
use serde::Deserialize;
use uuid::Uuid;

use super::cookie::session_cookie;
use super::render::{ render_page, PageView };
use super::{ merge_params, AppState };
use crate::agent::TurnError;
use crate::history::ChatSession;
use crate::models::notice::Notice;

#[derive(Deserialize, Debug)]
pub struct ChatForm {
    #[serde(default)]
    pub prompt: String,
    pub model: Option<String>,
    pub temperature: Option<String>,
}

fn redirect_home(id: Uuid) -> Response {
    ([(SET_COOKIE, session_cookie(id))], Redirect::to("/")).into_response()
}

pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, session) = state.resolve_session(&headers).await;
    let setup_error = state.agent.setup_error().map(|e| e.to_string());
    let setup_error = setup_error.as_deref();

    let html = match session.try_lock() {
        Ok(mut guard) => {
            let notice = guard.take_notice();
            render_page(&PageView {
                messages: guard.conversation.all(),
                params: &guard.params,
                notice: notice.as_ref(),
                setup_error,
                busy: false,
            })
        }
        Err(_) => {
            let snapshot = state.sessions.snapshot(&id).await.unwrap_or_default();
            render_page(&PageView {
                messages: &snapshot.messages,
                params: &snapshot.params,
                notice: Some(&Notice::Busy),
                setup_error,
                busy: true,
            })
        }
    };

    ([(SET_COOKIE, session_cookie(id))], Html(html)).into_response()
}

pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> Response {
    let (id, session) = state.resolve_session(&headers).await;
    let Ok(mut guard) = session.try_lock() else {
        warn!("Session {}: turn rejected, previous turn still in flight", id);
        return redirect_home(id);
    };

    let temperature = form.temperature
        .as_deref()
        .and_then(|t| t.trim().parse::<f32>().ok());
    let params = merge_params(guard.params, form.model.as_deref(), temperature);
    guard.params = params;
    state.sessions.record_snapshot(&id, guard.snapshot()).await;

    let ChatSession { conversation, notice, .. } = &mut *guard;
    match state.agent.run_turn(conversation, &form.prompt, &params).await {
        Ok(_) => {
            *notice = None;
        }
        Err(TurnError::Completion(e)) => {
            *notice = Some(Notice::Completion(e));
        }
        Err(e) => {
            debug!("Session {}: turn skipped: {}", id, e);
        }
    }

    redirect_home(id)
}

pub async fn clear(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, session) = state.resolve_session(&headers).await;
    match session.try_lock() {
        Ok(mut guard) => {
            guard.clear();
            debug!("Session {}: conversation cleared", id);
        }
        Err(_) => warn!("Session {}: clear ignored, turn in flight", id),
    }
    redirect_home(id)
}
