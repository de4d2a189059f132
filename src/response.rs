// ── Chatmark: Wire Envelope ────────────────────────────────────────────────
// Every REST response is wrapped in `{success, code, msg, data?}` so clients
// can branch on `success`/`code` without inspecting the HTTP status.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub code: u16,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResponse {
    /// Successful response carrying a payload.
    pub fn ok(data: impl Serialize) -> Self {
        ApiResponse {
            success: true,
            code: 200,
            msg: "ok".into(),
            data: serde_json::to_value(data).ok(),
        }
    }

    /// Successful response with a custom message and payload.
    pub fn ok_msg(msg: impl Into<String>, data: impl Serialize) -> Self {
        ApiResponse {
            success: true,
            code: 200,
            msg: msg.into(),
            data: serde_json::to_value(data).ok(),
        }
    }

    /// Successful acknowledgment with no payload.
    pub fn ok_empty() -> Self {
        ApiResponse { success: true, code: 200, msg: "ok".into(), data: None }
    }

    /// Successful acknowledgment with a custom message and no payload.
    pub fn ack(msg: impl Into<String>) -> Self {
        ApiResponse { success: true, code: 200, msg: msg.into(), data: None }
    }

    /// Failure envelope with a wire code and human-readable message.
    pub fn fail(code: u16, msg: impl Into<String>) -> Self {
        ApiResponse { success: false, code, msg: msg.into(), data: None }
    }
}
