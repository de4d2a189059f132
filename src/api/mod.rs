// ── Chatmark: HTTP API ─────────────────────────────────────────────────────
// Router assembly, shared state, and the login gate.
//
// Route map:
//   POST /login              → auth::login           (public)
//   GET  /chat/messages      → chat::get_messages
//   PUT  /chat/messages      → chat::put_messages
//   GET  /chat/models        → chat::get_models
//   GET  /chat/history       → chat::get_history
//   GET  /chatbox            → chat::get_chatbox
//   GET  /dashboard          → dashboard::get_dashboard
//   POST /upload             → upload::upload_file
//   GET  /uploads/:filename  → upload::download_file
//   GET  /ws                 → ws::ws_handler
//
// Everything except /login sits behind the cookie gate: no `login=yes`
// cookie means a 401 envelope before the handler runs.

pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod upload;
pub mod ws;

use std::sync::Arc;

use axum::extract::Request;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::error::{ChatError, ChatResult};
use crate::response::ApiResponse;
use crate::store::MessageStore;

// ── Shared state ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MessageStore>,
    pub config: Arc<ServerConfig>,
    pub chatbox: Arc<Value>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: MessageStore, chatbox: Value) -> Self {
        AppState {
            store: Arc::new(store),
            config: Arc::new(config),
            chatbox: Arc::new(chatbox),
        }
    }
}

// ── Router ─────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> ChatResult<Router> {
    let origin: HeaderValue = state
        .config
        .allowed_origin
        .parse()
        .map_err(|_| ChatError::Config(format!("bad allowed_origin '{}'", state.config.allowed_origin)))?;

    // Credentialed CORS — wildcard lists are rejected by the browser (and by
    // tower-http), so everything is explicit.
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT_LANGUAGE]);

    let protected = Router::new()
        .route("/chat/messages", get(chat::get_messages).put(chat::put_messages))
        .route("/chat/models", get(chat::get_models))
        .route("/chat/history", get(chat::get_history))
        .route("/chatbox", get(chat::get_chatbox))
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/upload", post(upload::upload_file))
        .route("/uploads/:filename", get(upload::download_file))
        .route("/ws", get(ws::ws_handler))
        .route_layer(middleware::from_fn(require_login));

    Ok(Router::new()
        .route("/login", post(auth::login))
        .merge(protected)
        .layer(cors)
        .with_state(state))
}

// ── Login gate ─────────────────────────────────────────────────────────────

pub(crate) const LOGIN_COOKIE: &str = "login";

/// Extract a cookie value by name from the request headers.
pub(crate) fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    for header in headers.get_all(header::COOKIE) {
        let Ok(value) = header.to_str() else { continue };
        for cookie in value.split(';') {
            if let Some(rest) = cookie.trim().strip_prefix(name) {
                if let Some(val) = rest.strip_prefix('=') {
                    return Some(val.trim());
                }
            }
        }
    }
    None
}

pub(crate) fn is_logged_in(headers: &HeaderMap) -> bool {
    cookie_value(headers, LOGIN_COOKIE) == Some("yes")
}

async fn require_login(request: Request, next: Next) -> Response {
    if is_logged_in(request.headers()) {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::fail(401, "not logged in")),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "theme=dark; login=yes; lang=en".parse().unwrap());
        assert_eq!(cookie_value(&headers, "login"), Some("yes"));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn login_check_requires_exact_value() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "login=no".parse().unwrap());
        assert!(!is_logged_in(&headers));
        headers.insert(header::COOKIE, "login=yes".parse().unwrap());
        assert!(is_logged_in(&headers));
    }
}
