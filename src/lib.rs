// ── Chatmark ───────────────────────────────────────────────────────────────
// Mock backend for a chat web application. Canned REST + WebSocket API over
// an in-memory doubly linked message store with branch (regenerate)
// semantics and bidirectional pagination.

pub mod api;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod page;
pub mod response;
pub mod store;

pub use config::ServerConfig;
pub use error::{ChatError, ChatResult};
pub use page::{fetch_page, PageResult};
pub use store::{Conversation, MessageRecord, MessageStore, Position};
