// ── Chatmark: Upload Routes ────────────────────────────────────────────────
// Multipart write + readback by filename. The server ID is the filename;
// uploads land directly in the configured directory with no deduplication.
// Filenames pass through `sanitize` on both paths to block traversal.

use std::path::Path as FsPath;

use axum::extract::{Multipart, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::info;
use serde_json::json;

use crate::error::{ChatError, ChatResult};
use crate::response::ApiResponse;

use super::AppState;

/// Reduce a client-supplied filename to its final path component.
/// Rejects anything empty or dot-only after stripping.
fn sanitize(name: &str) -> Option<String> {
    let name = FsPath::new(name).file_name()?.to_str()?;
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

// ── POST /upload ───────────────────────────────────────────────────────────

pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ChatResult<Json<ApiResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ChatError::malformed(format!("bad multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .and_then(sanitize)
            .ok_or_else(|| ChatError::malformed("invalid filename"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ChatError::malformed(format!("bad multipart body: {e}")))?;

        let path = state.config.upload_dir.join(&filename);
        tokio::fs::write(&path, &bytes).await?;
        info!("[upload] wrote {} ({} bytes)", path.display(), bytes.len());

        let download_url = format!("{}/uploads/{}", state.config.public_base_url, filename);
        return Ok(Json(ApiResponse::ok_msg(
            "upload successful",
            json!({
                "serverId": filename,
                "downloadUrl": download_url,
                "preview": download_url,
                "previewType": "image",
            }),
        )));
    }

    Err(ChatError::malformed("missing 'file' field"))
}

// ── GET /uploads/:filename ─────────────────────────────────────────────────

pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ChatResult<Response> {
    let name =
        sanitize(&filename).ok_or_else(|| ChatError::not_found(format!("file '{filename}'")))?;
    let path = state.config.upload_dir.join(&name);

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            Ok(([(CONTENT_TYPE, "application/octet-stream")], bytes).into_response())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ChatError::not_found(format!("file '{name}'")))
        }
        Err(e) => Err(e.into()),
    }
}
