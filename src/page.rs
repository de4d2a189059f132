// ── Chatmark: Page Assembler ───────────────────────────────────────────────
// Turns a mark plus an optional directional cursor into an ordered window of
// messages. Pure logic over the store — the route layer only parses params
// and serializes the result.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ChatResult};
use crate::store::{MessageRecord, MessageStore};

/// One page of a conversation.
///
/// `messages_order` is always chain order (oldest→newest) for the returned
/// window; `messages` maps every returned ID to its full record. `have_more`
/// is only present on the initial (no-cursor) load and means "a backward page
/// may still exist", not "the forward walk was truncated". Absent implies
/// `false` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub messages: HashMap<String, MessageRecord>,
    pub messages_order: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub have_more: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Assemble a page for `mark_id`.
///
/// Exactly one of `prev_id`/`next_id` is treated as the active cursor;
/// `next_id` wins if both are supplied. No cursor means initial load: the
/// full forward walk from the mark's root anchor. An unknown mark or cursor
/// is a hard `NotFound` — never a silent default page.
pub fn fetch_page(
    store: &MessageStore,
    mark_id: &str,
    prev_id: Option<&str>,
    next_id: Option<&str>,
) -> ChatResult<PageResult> {
    let conversation = store.conversation(mark_id)?;

    if let Some(next_id) = next_id {
        // Forward continuation: the window from `next_id` to the next tail.
        let window: Vec<_> = store.walk_forward(next_id)?.collect();
        return Ok(window_page(window));
    }

    if let Some(prev_id) = prev_id {
        // Backward continuation: everything strictly before `prev_id`,
        // reordered oldest→newest for prepending to a rendered view.
        let mut window: Vec<_> = store.walk_backward(prev_id)?.collect();
        window.reverse();
        return Ok(window_page(window));
    }

    // Initial load: full forward walk from the root anchor.
    let root = match conversation.root.clone() {
        Some(root) => root,
        None => {
            return Ok(PageResult {
                messages: HashMap::new(),
                messages_order: Vec::new(),
                have_more: Some(false),
                model: Some(conversation.model),
            });
        }
    };
    let window: Vec<_> = store
        .walk_forward(&root)
        .map_err(|_| ChatError::not_found(format!("root of mark '{mark_id}'")))?
        .collect();

    let mut page = window_page(window);
    page.have_more = Some(true);
    page.model = Some(conversation.model);
    Ok(page)
}

fn window_page(window: Vec<(String, MessageRecord)>) -> PageResult {
    let messages_order: Vec<String> = window.iter().map(|(id, _)| id.clone()).collect();
    let messages: HashMap<String, MessageRecord> = window.into_iter().collect();
    PageResult { messages, messages_order, have_more: None, model: None }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Conversation, Position};

    fn record(content: &str) -> MessageRecord {
        MessageRecord::new(Position::Left, "AI Assistant", "/assets/AI.png", content)
    }

    /// Store with root "0" → "1" → "2" (tail) under "mark1".
    fn store() -> MessageStore {
        let store = MessageStore::new();
        store
            .add_conversation(
                "mark1",
                Conversation {
                    title: "Test".into(),
                    update_date: "2025-11-18T20:46:00+08:00".parse().unwrap(),
                    model: "gpt4".into(),
                    root: None,
                },
            )
            .unwrap();
        store.insert_root("mark1", "0", record("zero")).unwrap();
        store.append("0", "1", record("one")).unwrap();
        store.append("1", "2", record("two")).unwrap();
        store
    }

    #[test]
    fn initial_load_walks_full_chain() {
        let store = store();
        let page = fetch_page(&store, "mark1", None, None).unwrap();
        assert_eq!(page.messages_order, vec!["0", "1", "2"]);
        assert_eq!(page.have_more, Some(true));
        assert_eq!(page.model.as_deref(), Some("gpt4"));
        assert_eq!(page.messages.len(), 3);
        assert_eq!(page.messages["1"].content, "one");
    }

    #[test]
    fn next_cursor_returns_forward_window() {
        let store = store();
        let page = fetch_page(&store, "mark1", None, Some("1")).unwrap();
        assert_eq!(page.messages_order, vec!["1", "2"]);
        assert_eq!(page.messages_order.first().map(String::as_str), Some("1"));
        assert_eq!(page.have_more, None);
    }

    #[test]
    fn prev_cursor_returns_preceding_window_in_chain_order() {
        let store = store();
        let page = fetch_page(&store, "mark1", Some("2"), None).unwrap();
        assert_eq!(page.messages_order, vec!["0", "1"]);
        assert!(!page.messages.contains_key("2"));
    }

    #[test]
    fn prev_cursor_at_head_is_empty() {
        let store = store();
        let page = fetch_page(&store, "mark1", Some("0"), None).unwrap();
        assert!(page.messages_order.is_empty());
        assert!(page.messages.is_empty());
    }

    #[test]
    fn next_wins_when_both_cursors_supplied() {
        let store = store();
        let page = fetch_page(&store, "mark1", Some("2"), Some("1")).unwrap();
        assert_eq!(page.messages_order, vec!["1", "2"]);
    }

    #[test]
    fn unknown_mark_is_not_found() {
        let store = store();
        let err = fetch_page(&store, "mark404", None, None).unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[test]
    fn unknown_next_cursor_is_not_found() {
        let store = store();
        let err = fetch_page(&store, "mark1", None, Some("does-not-exist")).unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[test]
    fn unknown_prev_cursor_is_not_found() {
        let store = store();
        let err = fetch_page(&store, "mark1", Some("does-not-exist"), None).unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[test]
    fn empty_conversation_pages_empty_without_more() {
        let store = store();
        store
            .add_conversation(
                "fresh",
                Conversation {
                    title: "Fresh".into(),
                    update_date: "2025-11-18T21:00:00+08:00".parse().unwrap(),
                    model: "gpt4".into(),
                    root: None,
                },
            )
            .unwrap();
        let page = fetch_page(&store, "fresh", None, None).unwrap();
        assert!(page.messages_order.is_empty());
        assert_eq!(page.have_more, Some(false));
    }

    #[test]
    fn branch_window_follows_its_own_forward_links() {
        let store = store();
        // Branch "3" under "1", continued by "6" — the regenerate shape.
        store.branch("1", "3", record("alt")).unwrap();
        store.append("3", "6", record("alt tail")).unwrap();

        let page = fetch_page(&store, "mark1", None, Some("3")).unwrap();
        assert_eq!(page.messages_order, vec!["3", "6"]);
    }
}
