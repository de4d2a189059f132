// ── Chatmark: Login Route ──────────────────────────────────────────────────
// Single hardcoded credential check. On success the `login=yes` cookie is
// set (HttpOnly, 1 h) and the gate in api::require_login opens.

use axum::extract::{Form, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{info, warn};
use serde::Deserialize;

use crate::response::ApiResponse;

use super::{AppState, LOGIN_COOKIE};

const LOGIN_USER: &str = "admin";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    if form.username == LOGIN_USER && form.password == state.config.password {
        info!("[auth] '{}' logged in", form.username);
        let cookie = format!(
            "{LOGIN_COOKIE}=yes; HttpOnly; Max-Age=3600; Path=/; SameSite=None; Secure"
        );
        (
            StatusCode::OK,
            [(SET_COOKIE, cookie)],
            Json(ApiResponse::ack("login successful")),
        )
            .into_response()
    } else {
        warn!("[auth] failed login attempt for '{}'", form.username);
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::fail(401, "login failed")),
        )
            .into_response()
    }
}
