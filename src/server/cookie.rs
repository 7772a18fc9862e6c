use axum::http::{ header::COOKIE, HeaderMap };
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "chat_session";

/// Reads the session id from the `Cookie` header, ignoring malformed values.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let mut kv = pair.trim().splitn(2, '=');
            match (kv.next(), kv.next()) {
                (Some(name), Some(value)) if name == SESSION_COOKIE => {
                    Uuid::parse_str(value.trim()).ok()
                }
                _ => None,
            }
        })
        .next()
}

pub fn session_cookie(id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}
