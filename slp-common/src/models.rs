//! Generated content data model
//!
//! Field names serialize in camelCase; this is the JSON shape the web
//! client consumes and the shape stored in the content cache.

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One subtopic of a unit, produced by the list parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSubtopic {
    pub id: String,
    #[serde(rename = "unitId")]
    pub parent_unit_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
}

/// Ordered mapping of segment key to segment body
///
/// Keys are unique. Inserting an existing key replaces its body but keeps
/// its original position, so iteration order is order of first appearance.
/// Serializes as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentMap {
    entries: Vec<(String, String)>,
}

impl SegmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the previous body for `key`
    pub fn insert(&mut self, key: String, body: String) -> Option<String> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, body)),
            None => {
                self.entries.push((key, body));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, body)| body.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for SegmentMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, body) in &self.entries {
            map.serialize_entry(key, body)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SegmentMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SegmentMapVisitor;

        impl<'de> Visitor<'de> for SegmentMapVisitor {
            type Value = SegmentMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of segment keys to text")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SegmentMap, A::Error> {
                let mut segments = SegmentMap::new();
                while let Some((key, body)) = access.next_entry::<String, String>()? {
                    segments.insert(key, body);
                }
                Ok(segments)
            }
        }

        deserializer.deserialize_map(SegmentMapVisitor)
    }
}

/// Generated lesson page for one subtopic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtopicContent {
    pub subtopic_id: String,
    pub segments: SegmentMap,
    pub generated_at: DateTime<Utc>,
}

/// One practice question with its worked answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeQuestion {
    pub id: String,
    pub question: String,
    pub answer: String,
}

/// Practice questions for one subtopic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSet {
    pub subtopic_id: String,
    pub questions: Vec<PracticeQuestion>,
    pub generated_at: DateTime<Utc>,
}

impl PracticeSet {
    pub fn new(subtopic_id: String, questions: Vec<PracticeQuestion>) -> Self {
        Self {
            subtopic_id,
            questions,
            generated_at: Utc::now(),
        }
    }

    /// Append another batch of questions
    ///
    /// Appended questions are renumbered `{prefix}-q{n}` continuing after the
    /// existing ones, where `prefix` is taken from the incoming ids, so ids
    /// stay unique within the set.
    pub fn append(&mut self, more: Vec<PracticeQuestion>) {
        let offset = self.questions.len();
        for (i, mut question) in more.into_iter().enumerate() {
            if let Some((prefix, _)) = question.id.rsplit_once("-q") {
                question.id = format!("{}-q{}", prefix, offset + i + 1);
            }
            self.questions.push(question);
        }
        self.generated_at = Utc::now();
    }
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message of a per-subtopic tutoring conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}
