//! Cache collaborator for generated content
//!
//! Generated subtopic lists, lesson pages, practice sets and chat histories
//! are cached so that revisiting a page does not call the generation service
//! again. Storage is behind [`ContentCache`]; [`GenerationCache`] is the typed
//! view handlers use.
//!
//! Every entry belongs to a scope: [`PUBLIC_SCOPE`] for anonymous callers or
//! one scope per signed-in user. A [`GenerationCache`] only ever reads,
//! writes, counts and clears entries of its own scope.
//!
//! Values are stored as JSON. A value that no longer deserializes into the
//! expected type reads as a miss.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};

use crate::models::{ChatMessage, GeneratedSubtopic, PracticeQuestion, PracticeSet, SubtopicContent};

/// Common prefix of every cache key
pub const KEY_PREFIX: &str = "learning-app-";

/// Scope of entries written without a signed-in user
pub const PUBLIC_SCOPE: &str = "public";

/// Key-value storage for cached content
pub trait ContentCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    fn clear(&self, key: &str);
    /// Remove every key starting with `prefix`; returns how many were removed
    fn clear_prefix(&self, prefix: &str) -> usize;
    /// Approximate size (serialized JSON bytes) of the keys starting with `prefix`
    fn size_bytes(&self, prefix: &str) -> usize;
}

/// In-process [`ContentCache`]
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value);
    }

    fn clear(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
    }

    fn clear_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    fn size_bytes(&self, prefix: &str) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| key.len() + value.to_string().len())
            .sum()
    }
}

/// Kinds of cached content, each keyed by a unit or subtopic key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheKey {
    Subtopics(String),
    Content(String),
    Practice(String),
    Chat(String),
}

impl CacheKey {
    /// Key prefixes of all kinds
    pub const KIND_PREFIXES: [&'static str; 4] = [
        "learning-app-subtopics-",
        "learning-app-content-",
        "learning-app-practice-questions-",
        "learning-app-chat-history-",
    ];

    /// Key prefix shared by every entry of this kind
    pub fn kind_prefix(&self) -> &'static str {
        match self {
            CacheKey::Subtopics(_) => Self::KIND_PREFIXES[0],
            CacheKey::Content(_) => Self::KIND_PREFIXES[1],
            CacheKey::Practice(_) => Self::KIND_PREFIXES[2],
            CacheKey::Chat(_) => Self::KIND_PREFIXES[3],
        }
    }

    fn id(&self) -> &str {
        match self {
            CacheKey::Subtopics(id) | CacheKey::Content(id) | CacheKey::Practice(id) | CacheKey::Chat(id) => id,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind_prefix(), self.id())
    }
}

/// Typed access to cached generated content within one scope
///
/// Clones and [`scoped`](Self::scoped) views share the store. Read-modify-write
/// updates (`append_practice`, `push_chat`) are serialized across all of them,
/// so concurrent appends to the same entry are never lost.
#[derive(Clone)]
pub struct GenerationCache {
    store: Arc<dyn ContentCache>,
    scope: String,
    updates: Arc<Mutex<()>>,
}

impl GenerationCache {
    /// Public-scope cache over `store`
    pub fn new(store: Arc<dyn ContentCache>) -> Self {
        Self {
            store,
            scope: PUBLIC_SCOPE.to_string(),
            updates: Arc::new(Mutex::new(())),
        }
    }

    /// Cache backed by a fresh [`MemoryCache`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    /// View of the same store restricted to `scope`
    pub fn scoped(&self, scope: impl Into<String>) -> Self {
        Self {
            store: self.store.clone(),
            scope: scope.into(),
            updates: self.updates.clone(),
        }
    }

    /// View for a signed-in user, or the public scope without one
    pub fn for_user(&self, user_id: Option<&str>) -> Self {
        match user_id {
            Some(id) => self.scoped(format!("user-{}", id)),
            None => self.scoped(PUBLIC_SCOPE),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    fn key(&self, kind: fn(String) -> CacheKey, id: &str) -> CacheKey {
        kind(format!("{}/{}", self.scope, id))
    }

    /// Key prefixes covering every entry of this scope
    fn scope_prefixes(&self) -> impl Iterator<Item = String> + '_ {
        CacheKey::KIND_PREFIXES
            .into_iter()
            .map(move |kind| format!("{}{}/", kind, self.scope))
    }

    fn read<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let value = self.store.get(&key.to_string())?;
        match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                self.store.clear(&key.to_string());
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &CacheKey, item: &T) {
        match serde_json::to_value(item) {
            Ok(value) => {
                debug!("Caching {}", key);
                self.store.set(&key.to_string(), value);
            }
            Err(e) => warn!("Failed to cache {}: {}", key, e),
        }
    }

    pub fn subtopics(&self, unit_key: &str) -> Option<Vec<GeneratedSubtopic>> {
        self.read(&self.key(CacheKey::Subtopics, unit_key))
    }

    pub fn set_subtopics(&self, unit_key: &str, subtopics: &[GeneratedSubtopic]) {
        self.write(&self.key(CacheKey::Subtopics, unit_key), &subtopics)
    }

    pub fn content(&self, subtopic_key: &str) -> Option<SubtopicContent> {
        self.read(&self.key(CacheKey::Content, subtopic_key))
    }

    pub fn set_content(&self, subtopic_key: &str, content: &SubtopicContent) {
        self.write(&self.key(CacheKey::Content, subtopic_key), content)
    }

    pub fn practice(&self, subtopic_key: &str) -> Option<PracticeSet> {
        self.read(&self.key(CacheKey::Practice, subtopic_key))
    }

    pub fn set_practice(&self, subtopic_key: &str, set: &PracticeSet) {
        self.write(&self.key(CacheKey::Practice, subtopic_key), set)
    }

    /// Add questions to the cached set, or start a new set
    pub fn append_practice(&self, subtopic_key: &str, questions: Vec<PracticeQuestion>) -> PracticeSet {
        let key = self.key(CacheKey::Practice, subtopic_key);
        let _guard = self.updates.lock().unwrap_or_else(|e| e.into_inner());

        let set = match self.read::<PracticeSet>(&key) {
            Some(mut existing) => {
                existing.append(questions);
                existing
            }
            None => PracticeSet::new(subtopic_key.to_string(), questions),
        };
        self.write(&key, &set);
        set
    }

    pub fn chat_history(&self, subtopic_key: &str) -> Vec<ChatMessage> {
        self.read(&self.key(CacheKey::Chat, subtopic_key)).unwrap_or_default()
    }

    pub fn push_chat(&self, subtopic_key: &str, message: ChatMessage) {
        let key = self.key(CacheKey::Chat, subtopic_key);
        let _guard = self.updates.lock().unwrap_or_else(|e| e.into_inner());

        let mut history: Vec<ChatMessage> = self.read(&key).unwrap_or_default();
        history.push(message);
        self.write(&key, &history)
    }

    /// Drop the cached subtopic list of a unit
    ///
    /// Lesson pages are keyed by subtopic only, so they are not reachable
    /// from the unit and stay cached.
    pub fn clear_unit(&self, unit_key: &str) {
        self.store.clear(&self.key(CacheKey::Subtopics, unit_key).to_string())
    }

    /// Drop every entry of this scope; returns how many were removed
    pub fn clear_all(&self) -> usize {
        self.scope_prefixes()
            .map(|prefix| self.store.clear_prefix(&prefix))
            .sum()
    }

    /// Human-readable size of this scope, e.g. `"1.5 KB"`
    pub fn size_kb(&self) -> String {
        let bytes: usize = self.scope_prefixes().map(|prefix| self.store.size_bytes(&prefix)).sum();
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatRole, SegmentMap};
    use chrono::Utc;

    fn question(id: &str) -> PracticeQuestion {
        PracticeQuestion {
            id: id.to_string(),
            question: "q".to_string(),
            answer: "a".to_string(),
        }
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(CacheKey::Subtopics("unit-1".into()).to_string(), "learning-app-subtopics-unit-1");
        assert_eq!(CacheKey::Content("limits".into()).to_string(), "learning-app-content-limits");
        assert_eq!(
            CacheKey::Practice("limits".into()).to_string(),
            "learning-app-practice-questions-limits"
        );
        assert_eq!(CacheKey::Chat("limits".into()).to_string(), "learning-app-chat-history-limits");
    }

    #[test]
    fn test_memory_cache_get_set_clear() {
        let cache = MemoryCache::new();
        assert!(cache.get("k").is_none());
        cache.set("k", serde_json::json!({"a": 1}));
        assert_eq!(cache.get("k"), Some(serde_json::json!({"a": 1})));
        cache.clear("k");
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_clear_prefix_counts() {
        let cache = MemoryCache::new();
        cache.set("learning-app-content-a", Value::Null);
        cache.set("learning-app-content-b", Value::Null);
        cache.set("other", Value::Null);
        assert_eq!(cache.size_bytes("other"), "other".len() + "null".len());
        assert_eq!(cache.clear_prefix("learning-app-content-"), 2);
        assert!(cache.get("other").is_some());
    }

    #[test]
    fn test_typed_roundtrip_content() {
        let cache = GenerationCache::in_memory();
        let mut segments = SegmentMap::new();
        segments.insert("example".into(), "x".into());
        let content = SubtopicContent {
            subtopic_id: "limits".into(),
            segments,
            generated_at: Utc::now(),
        };

        cache.set_content("limits", &content);
        assert_eq!(cache.content("limits"), Some(content));
        assert!(cache.content("other").is_none());
    }

    #[test]
    fn test_unreadable_entry_is_a_miss() {
        let store = Arc::new(MemoryCache::new());
        store.set("learning-app-content-public/limits", serde_json::json!("not a content object"));
        let cache = GenerationCache::new(store.clone());

        assert!(cache.content("limits").is_none());
        assert!(store.get("learning-app-content-public/limits").is_none());
    }

    #[test]
    fn test_append_practice() {
        let cache = GenerationCache::in_memory();
        let first = cache.append_practice("euler", vec![question("euler-q1")]);
        assert_eq!(first.questions.len(), 1);

        let second = cache.append_practice("euler", vec![question("euler-q1"), question("euler-q2")]);
        assert_eq!(second.questions.len(), 3);
        assert_eq!(second.questions[2].id, "euler-q3");
        assert_eq!(cache.practice("euler").map(|s| s.questions.len()), Some(3));
    }

    #[test]
    fn test_chat_history_accumulates() {
        let cache = GenerationCache::in_memory();
        assert!(cache.chat_history("limits").is_empty());
        cache.push_chat("limits", ChatMessage::new(ChatRole::User, "why?"));
        cache.push_chat("limits", ChatMessage::new(ChatRole::Assistant, "because"));

        let history = cache.chat_history("limits");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, ChatRole::Assistant);
    }

    #[test]
    fn test_clear_all_and_size() {
        let cache = GenerationCache::in_memory();
        assert_eq!(cache.size_kb(), "0.0 KB");
        cache.push_chat("limits", ChatMessage::new(ChatRole::User, "hi"));
        cache.set_practice("limits", &PracticeSet::new("limits".into(), vec![question("limits-q1")]));
        assert_ne!(cache.size_kb(), "0.0 KB");

        assert_eq!(cache.clear_all(), 2);
        assert!(cache.practice("limits").is_none());
    }

    #[test]
    fn test_scopes_are_isolated() {
        let cache = GenerationCache::in_memory();
        let alice = cache.for_user(Some("alice-id"));
        let bob = cache.for_user(Some("bob-id"));

        alice.push_chat("limits", ChatMessage::new(ChatRole::User, "private"));
        alice.set_practice("limits", &PracticeSet::new("limits".into(), vec![question("limits-q1")]));
        cache.set_practice("limits", &PracticeSet::new("limits".into(), vec![question("limits-q1")]));

        assert!(bob.chat_history("limits").is_empty());
        assert!(cache.chat_history("limits").is_empty());
        assert_eq!(bob.size_kb(), "0.0 KB");

        assert_eq!(bob.clear_all(), 0);
        assert_eq!(alice.clear_all(), 2);
        assert!(cache.practice("limits").is_some(), "Public entries survive a user clear");
    }

    #[test]
    fn test_concurrent_chat_pushes_are_kept() {
        let cache = GenerationCache::in_memory();

        std::thread::scope(|s| {
            for t in 0..8 {
                let cache = cache.clone();
                s.spawn(move || {
                    for i in 0..200 {
                        cache.push_chat("s", ChatMessage::new(ChatRole::User, format!("{t}-{i}")));
                    }
                });
            }
        });

        assert_eq!(cache.chat_history("s").len(), 1600);
    }

    #[test]
    fn test_concurrent_practice_appends_are_kept() {
        let cache = GenerationCache::in_memory();

        std::thread::scope(|s| {
            for _ in 0..4 {
                let view = cache.for_user(Some("alice-id"));
                s.spawn(move || {
                    for _ in 0..50 {
                        view.append_practice("euler", vec![question("euler-q1")]);
                    }
                });
            }
        });

        let set = cache.for_user(Some("alice-id")).practice("euler").unwrap();
        assert_eq!(set.questions.len(), 200);
        assert_eq!(set.questions[199].id, "euler-q200");
    }
}
