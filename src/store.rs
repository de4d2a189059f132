// ── Chatmark: Message Store ────────────────────────────────────────────────
// In-memory store for the append-structured conversation log.
//
// The store owns every record; links between records are plain ID strings,
// never native references, so there is nothing cyclic to manage. A single
// `RwLock` guards the whole dataset: walks hold the read guard for a stable
// snapshot, and `append`/`branch` do their tail check and link write inside
// one write-guard critical section, which is what makes two racing appends
// resolve as one success + one `Conflict`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset};
use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ChatResult};

// ── Records ────────────────────────────────────────────────────────────────

/// Which side of the chat view a message renders on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

/// One message in a conversation chain.
///
/// `prev_message`/`next_message` form the doubly linked main chain;
/// `child_messages` holds alternative-branch siblings (regenerate semantics)
/// in insertion order. The record's own ID lives in the store's map key, not
/// in the record, matching the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub prev_message: Option<String>,
    pub next_message: Option<String>,
    pub position: Position,
    pub content: String,
    pub name: String,
    pub avatar: String,
    /// Alternative-branch message IDs, wire name `messages`.
    #[serde(rename = "messages", default)]
    pub child_messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_regenerate: Option<bool>,
}

impl MessageRecord {
    pub fn new(
        position: Position,
        name: impl Into<String>,
        avatar: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        MessageRecord {
            prev_message: None,
            next_message: None,
            position,
            content: content.into(),
            name: name.into(),
            avatar: avatar.into(),
            child_messages: Vec::new(),
            allow_regenerate: None,
        }
    }
}

// ── Conversations ──────────────────────────────────────────────────────────

/// A conversation: a mark (opaque root anchor ID) plus display metadata.
/// `root` is `None` for a freshly allocated mark with no messages yet.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub title: String,
    pub update_date: DateTime<FixedOffset>,
    pub model: String,
    pub root: Option<String>,
}

/// Entry of the `GET /chat/history` conversation index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub mark_id: String,
    pub title: String,
    pub update_date: DateTime<FixedOffset>,
}

// ── Store ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct StoreInner {
    records: HashMap<String, MessageRecord>,
    conversations: HashMap<String, Conversation>,
}

/// Shared message store. All methods take `&self`; handlers hold it in an
/// `Arc` and the internal lock does the rest.
#[derive(Default)]
pub struct MessageStore {
    inner: RwLock<StoreInner>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a record by ID.
    pub fn get(&self, id: &str) -> ChatResult<MessageRecord> {
        self.inner
            .read()
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| ChatError::not_found(format!("message '{id}'")))
    }

    /// Lazy walk along `next_message` links starting at `start_id` (inclusive).
    ///
    /// Holds the store's read guard for the lifetime of the iterator, so the
    /// walk sees one consistent snapshot and is restartable: walking again
    /// from the same ID yields the same sequence as long as the store is
    /// unchanged. Guarded against link cycles — each record is visited at
    /// most once.
    pub fn walk_forward(&self, start_id: &str) -> ChatResult<ForwardWalk<'_>> {
        let guard = self.inner.read();
        if !guard.records.contains_key(start_id) {
            return Err(ChatError::not_found(format!("message '{start_id}'")));
        }
        Ok(ForwardWalk { guard, next: Some(start_id.to_string()), seen: HashSet::new() })
    }

    /// Lazy walk along `prev_message` links, yielding the records strictly
    /// before `start_id`, newest first. Same snapshot and cycle rules as
    /// `walk_forward`.
    pub fn walk_backward(&self, start_id: &str) -> ChatResult<BackwardWalk<'_>> {
        let guard = self.inner.read();
        let start = guard
            .records
            .get(start_id)
            .ok_or_else(|| ChatError::not_found(format!("message '{start_id}'")))?;
        let next = start.prev_message.clone();
        Ok(BackwardWalk { guard, next, seen: HashSet::new() })
    }

    /// Insert `record` under `id` as the new link following `after_id`.
    ///
    /// Fails with `Conflict` if `after_id` already has a `next_message`
    /// (callers must branch explicitly instead) or if `id` is already taken —
    /// IDs are immutable and never reused.
    pub fn append(&self, after_id: &str, id: &str, mut record: MessageRecord) -> ChatResult<()> {
        let mut inner = self.inner.write();
        if inner.records.contains_key(id) {
            return Err(ChatError::conflict(format!("message ID '{id}' already exists")));
        }
        let after = inner
            .records
            .get_mut(after_id)
            .ok_or_else(|| ChatError::not_found(format!("message '{after_id}'")))?;
        if let Some(existing) = &after.next_message {
            return Err(ChatError::conflict(format!(
                "message '{after_id}' already links forward to '{existing}'"
            )));
        }
        after.next_message = Some(id.to_string());
        record.prev_message = Some(after_id.to_string());
        record.next_message = None;
        inner.records.insert(id.to_string(), record);
        Ok(())
    }

    /// Insert `record` under `id` as an alternative branch of `after_id`,
    /// without touching the main chain. Branch order is insertion order.
    pub fn branch(&self, after_id: &str, id: &str, mut record: MessageRecord) -> ChatResult<()> {
        let mut inner = self.inner.write();
        if inner.records.contains_key(id) {
            return Err(ChatError::conflict(format!("message ID '{id}' already exists")));
        }
        let after = inner
            .records
            .get_mut(after_id)
            .ok_or_else(|| ChatError::not_found(format!("message '{after_id}'")))?;
        after.child_messages.push(id.to_string());
        record.prev_message = Some(after_id.to_string());
        record.next_message = None;
        inner.records.insert(id.to_string(), record);
        Ok(())
    }

    // ── Conversation registry ──────────────────────────────────────────────

    /// Register a conversation under `mark_id`. `Conflict` if the mark is
    /// already taken.
    pub fn add_conversation(&self, mark_id: &str, conversation: Conversation) -> ChatResult<()> {
        let mut inner = self.inner.write();
        if inner.conversations.contains_key(mark_id) {
            return Err(ChatError::conflict(format!("mark '{mark_id}' already exists")));
        }
        inner.conversations.insert(mark_id.to_string(), conversation);
        Ok(())
    }

    /// Insert the root record of a so-far-empty conversation.
    pub fn insert_root(&self, mark_id: &str, id: &str, mut record: MessageRecord) -> ChatResult<()> {
        let mut inner = self.inner.write();
        if inner.records.contains_key(id) {
            return Err(ChatError::conflict(format!("message ID '{id}' already exists")));
        }
        let conversation = inner
            .conversations
            .get_mut(mark_id)
            .ok_or_else(|| ChatError::not_found(format!("mark '{mark_id}'")))?;
        if let Some(existing) = &conversation.root {
            return Err(ChatError::conflict(format!(
                "mark '{mark_id}' already has root '{existing}'"
            )));
        }
        conversation.root = Some(id.to_string());
        record.prev_message = None;
        record.next_message = None;
        inner.records.insert(id.to_string(), record);
        Ok(())
    }

    pub fn conversation(&self, mark_id: &str) -> ChatResult<Conversation> {
        self.inner
            .read()
            .conversations
            .get(mark_id)
            .cloned()
            .ok_or_else(|| ChatError::not_found(format!("mark '{mark_id}'")))
    }

    /// Conversation index, newest first.
    pub fn conversation_summaries(&self) -> Vec<ConversationSummary> {
        let inner = self.inner.read();
        let mut entries: Vec<ConversationSummary> = inner
            .conversations
            .iter()
            .map(|(mark_id, c)| ConversationSummary {
                mark_id: mark_id.clone(),
                title: c.title.clone(),
                update_date: c.update_date,
            })
            .collect();
        entries.sort_by(|a, b| b.update_date.cmp(&a.update_date));
        entries
    }
}

// ── Walk iterators ─────────────────────────────────────────────────────────

pub struct ForwardWalk<'a> {
    guard: RwLockReadGuard<'a, StoreInner>,
    next: Option<String>,
    seen: HashSet<String>,
}

impl Iterator for ForwardWalk<'_> {
    type Item = (String, MessageRecord);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        if !self.seen.insert(id.clone()) {
            return None;
        }
        let record = self.guard.records.get(&id)?.clone();
        self.next = record.next_message.clone();
        Some((id, record))
    }
}

pub struct BackwardWalk<'a> {
    guard: RwLockReadGuard<'a, StoreInner>,
    next: Option<String>,
    seen: HashSet<String>,
}

impl Iterator for BackwardWalk<'_> {
    type Item = (String, MessageRecord);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        if !self.seen.insert(id.clone()) {
            return None;
        }
        let record = self.guard.records.get(&id)?.clone();
        self.next = record.prev_message.clone();
        Some((id, record))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(content: &str) -> MessageRecord {
        MessageRecord::new(Position::Left, "AI Assistant", "/assets/AI.png", content)
    }

    fn conversation() -> Conversation {
        Conversation {
            title: "Test".into(),
            update_date: "2025-11-18T20:46:00+08:00".parse().unwrap(),
            model: "gpt4".into(),
            root: None,
        }
    }

    fn chain_store() -> MessageStore {
        let store = MessageStore::new();
        store.add_conversation("mark1", conversation()).unwrap();
        store.insert_root("mark1", "0", record("zero")).unwrap();
        store.append("0", "1", record("one")).unwrap();
        store.append("1", "2", record("two")).unwrap();
        store
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = MessageStore::new();
        assert!(matches!(store.get("nope"), Err(ChatError::NotFound(_))));
    }

    #[test]
    fn append_links_both_directions() {
        let store = chain_store();
        let zero = store.get("0").unwrap();
        let one = store.get("1").unwrap();
        assert_eq!(zero.next_message.as_deref(), Some("1"));
        assert_eq!(one.prev_message.as_deref(), Some("0"));
        assert_eq!(one.next_message.as_deref(), Some("2"));
        assert!(store.get("2").unwrap().next_message.is_none());
    }

    #[test]
    fn chain_consistency_holds_for_every_link() {
        let store = chain_store();
        let walk: Vec<_> = store.walk_forward("0").unwrap().collect();
        for (id, rec) in &walk {
            if let Some(next) = &rec.next_message {
                let next_rec = store.get(next).unwrap();
                assert_eq!(next_rec.prev_message.as_deref(), Some(id.as_str()));
            }
        }
    }

    #[test]
    fn append_on_linked_record_conflicts() {
        let store = chain_store();
        let err = store.append("0", "9", record("nine")).unwrap_err();
        assert!(matches!(err, ChatError::Conflict(_)));
    }

    #[test]
    fn append_never_reuses_an_id() {
        let store = chain_store();
        let err = store.append("2", "1", record("dup")).unwrap_err();
        assert!(matches!(err, ChatError::Conflict(_)));
    }

    #[test]
    fn concurrent_appends_resolve_one_success_one_conflict() {
        let store = Arc::new(chain_store());
        let mut handles = Vec::new();
        for id in ["3", "3-alt"] {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || store.append("2", id, record("tail"))));
        }
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(ChatError::Conflict(_))))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
    }

    #[test]
    fn branch_keeps_main_chain_and_records_order() {
        let store = chain_store();
        store.branch("1", "3", record("alt one")).unwrap();
        store.branch("1", "5", record("alt two")).unwrap();

        let one = store.get("1").unwrap();
        assert_eq!(one.child_messages, vec!["3", "5"]);
        // Main chain untouched
        assert_eq!(one.next_message.as_deref(), Some("2"));
        assert_eq!(store.get("3").unwrap().prev_message.as_deref(), Some("1"));
    }

    #[test]
    fn walk_forward_visits_chain_in_order() {
        let store = chain_store();
        let ids: Vec<String> = store.walk_forward("0").unwrap().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
    }

    #[test]
    fn walk_forward_from_middle() {
        let store = chain_store();
        let ids: Vec<String> = store.walk_forward("1").unwrap().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn walk_forward_is_restartable() {
        let store = chain_store();
        let first: Vec<String> = store.walk_forward("0").unwrap().map(|(id, _)| id).collect();
        let second: Vec<String> = store.walk_forward("0").unwrap().map(|(id, _)| id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn walk_forward_unknown_start_is_not_found() {
        let store = chain_store();
        assert!(matches!(store.walk_forward("404"), Err(ChatError::NotFound(_))));
    }

    #[test]
    fn walk_backward_yields_predecessors_newest_first() {
        let store = chain_store();
        let ids: Vec<String> = store.walk_backward("2").unwrap().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["1", "0"]);
    }

    #[test]
    fn insert_root_twice_conflicts() {
        let store = chain_store();
        let err = store.insert_root("mark1", "9", record("nine")).unwrap_err();
        assert!(matches!(err, ChatError::Conflict(_)));
    }

    #[test]
    fn summaries_sort_newest_first() {
        let store = MessageStore::new();
        let older = Conversation {
            update_date: "2025-11-10T00:00:00+08:00".parse().unwrap(),
            ..conversation()
        };
        store.add_conversation("old", older).unwrap();
        store.add_conversation("new", conversation()).unwrap();
        let marks: Vec<String> =
            store.conversation_summaries().into_iter().map(|s| s.mark_id).collect();
        assert_eq!(marks, vec!["new", "old"]);
    }
}
