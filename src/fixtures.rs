// ── Chatmark: Canned Data ──────────────────────────────────────────────────
// Builds the demo dataset every endpoint serves. The store is constructed
// here and handed to the router explicitly — no process-global fixture state,
// so tests can build their own isolated instances.

use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ChatResult;
use crate::store::{Conversation, MessageRecord, MessageStore, Position};

const AI_NAME: &str = "AI Assistant";
const AI_AVATAR: &str = "/src/assets/AI.png";
const USER_AVATAR: &str = "/src/assets/human.jpg";

fn ai(content: &str) -> MessageRecord {
    MessageRecord::new(Position::Left, AI_NAME, AI_AVATAR, content)
}

fn user(name: &str, content: &str) -> MessageRecord {
    MessageRecord::new(Position::Right, name, USER_AVATAR, content)
}

fn conversation(title: &str, date: &str, root: Option<&str>) -> Conversation {
    Conversation {
        title: title.into(),
        update_date: date.parse().expect("fixture date"),
        model: "gpt4".into(),
        root: root.map(String::from),
    }
}

/// Build the demo store.
///
/// `mark1` carries the full demo graph — main chain 0 → 1 → 2 with a branch
/// alternative "4" under "0" and two alternatives "3" (continued by "6") and
/// "5" under "1". The remaining marks populate the history sidebar; a couple
/// hold short chains, the rest are empty.
pub fn demo_store() -> ChatResult<MessageStore> {
    let store = MessageStore::new();

    store.add_conversation("mark1", conversation("Today's Chat", "2025-11-18T20:46:00+08:00", None))?;
    store.insert_root("mark1", "0", user("You", "Hey, can you walk me through the plan for today?"))?;
    store.append("0", "1", ai("Sure — there are three items on the list. Want the short or the long version?"))?;
    store.append("1", "2", user("You", "Short version, please."))?;

    // Regenerate alternatives: "4" replaces the opener, "3"/"5" replace the reply.
    let mut opener_alt = user(AI_NAME, "This is a test message");
    opener_alt.allow_regenerate = Some(false);
    store.branch("0", "4", opener_alt)?;
    store.branch("1", "3", ai("This is the third message"))?;
    store.append("3", "6", ai("And this one continues the alternative."))?;
    store.branch("1", "5", MessageRecord::new(Position::Left, "Pikachu", USER_AVATAR, "This message lives on the backend"))?;

    store.add_conversation("mark2", conversation("Yesterday's Discussion", "2025-11-17T20:46:00+08:00", None))?;
    store.insert_root("mark2", "10", user("You", "Did the deploy go out last night?"))?;
    store.append("10", "11", ai("It did — rolled out to all regions without alerts."))?;

    store.add_conversation("mark3", conversation("Weekly Review", "2025-11-13T20:46:00+08:00", None))?;
    store.insert_root("mark3", "20", user("You", "Let's start the weekly review."))?;

    // Empty conversations: history entries with no loaded messages yet.
    store.add_conversation("mark4", conversation("Monthly Plan", "2025-10-29T20:46:00+08:00", None))?;
    store.add_conversation("mark5", conversation("Old Project", "2025-09-18T20:46:00+08:00", None))?;
    store.add_conversation("mark6", conversation("Team Meeting Notes", "2025-11-16T20:46:00+08:00", None))?;
    store.add_conversation("mark7", conversation("Client Feedback Session", "2025-11-15T20:46:00+08:00", None))?;
    store.add_conversation("mark8", conversation("Weekend Planning", "2025-11-11T20:46:00+08:00", None))?;

    Ok(store)
}

// ── Model catalog ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub avatar: String,
    pub tags: Vec<String>,
}

fn model(id: &str, name: &str, description: &str, tags: &[&str]) -> ModelInfo {
    ModelInfo {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        avatar: AI_AVATAR.into(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// Static model catalog for `GET /chat/models`.
pub fn model_catalog() -> Vec<ModelInfo> {
    vec![
        model("grok", "Grok", "Built by xAI", &["Grok", "Code", "Chat"]),
        model("gpt4", "GPT-4", "Advanced AI model by OpenAI", &["GPT", "OpenAI", "Chat"]),
        model("claude", "Claude", "AI assistant by Anthropic", &["Fast", "Anthropic", "Chat"]),
        model("llama3", "Llama 3", "Meta's open-source language model", &["Meta", "Open Source", "Research"]),
        model("gemini", "Gemini", "Google's multimodal AI model", &["Google", "Multimodal", "Search"]),
        model("mistral", "Mistral", "High-performance open model", &["Open", "Efficient", "Code"]),
        model("palm2", "PaLM 2", "Google's next-generation language model", &["Google", "Language", "Multilingual"]),
        model("command", "Command R+", "AI model for enterprise use", &["Enterprise", "Rapid", "Efficient"]),
    ]
}

// ── Chatbox & dashboard config ─────────────────────────────────────────────

/// Load the chatbox config fixture, falling back to the built-in default when
/// no file is configured or the file cannot be read.
pub fn load_chatbox(path: Option<&Path>) -> Value {
    if let Some(path) = path {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    info!("[fixtures] Loaded chatbox config from {}", path.display());
                    return value;
                }
                Err(e) => warn!("[fixtures] Bad JSON in {}: {}", path.display(), e),
            },
            Err(e) => warn!("[fixtures] Cannot read {}: {}", path.display(), e),
        }
    }
    default_chatbox()
}

fn default_chatbox() -> Value {
    json!({
        "tipMessage": "This is a mock backend — replies are canned.",
        "ignoreAttachmentTools": false,
        "extra_tools": []
    })
}

/// Static dashboard config for `GET /dashboard`.
pub fn dashboard_config() -> Value {
    json!({
        "sidebar": {
            "logoType": "image",
            "logo": "/public/logo.png"
        }
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────
