//! Labeled-segment parser (`CONCEPT INTRODUCTION:` style sections)

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{normalize, segment_key, ParseError};
use crate::models::SegmentMap;

static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("valid regex"));

/// One recognized section header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentLabel {
    /// Header text as it appears in model output, e.g. `WHY IT MATTERS`
    pub label: String,
    /// Short description shown to the model when asking for this section
    pub description: String,
}

impl SegmentLabel {
    pub fn new(label: &str, description: &str) -> Self {
        Self {
            label: label.to_string(),
            description: description.to_string(),
        }
    }

    /// Canonical map key: lowercase, spaces to underscores
    pub fn key(&self) -> String {
        segment_key(&self.label)
    }
}

/// Fixed set of section headers the segment parser recognizes
///
/// Also names the keys used when the text has no recognizable headers and
/// is split into paragraphs instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelVocabulary {
    pub labels: Vec<SegmentLabel>,
    /// Key for the first fallback paragraph
    pub introduction_key: String,
    /// Key for the second fallback paragraph
    pub method_key: String,
    /// Key for all remaining fallback paragraphs
    pub example_key: String,
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        Self {
            labels: vec![
                SegmentLabel::new("CONCEPT INTRODUCTION", "Core definition and fundamental understanding"),
                SegmentLabel::new("WHY IT MATTERS", "Real-world relevance and mathematical significance"),
                SegmentLabel::new("COMMON FORM", "Standard notation, formulas, or typical presentations"),
                SegmentLabel::new("HOW TO SOLVE", "Step-by-step problem-solving approach"),
                SegmentLabel::new("EXAMPLE", "Worked problem demonstrating the concept"),
                SegmentLabel::new("VISUALIZATION TIPS", "Ways to picture or understand the concept"),
                SegmentLabel::new("APPLICATIONS", "Where and how this concept is used"),
            ],
            introduction_key: "concept_introduction".to_string(),
            method_key: "how_to_solve".to_string(),
            example_key: "example".to_string(),
        }
    }
}

impl LabelVocabulary {
    /// Vocabulary with custom labels and the default fallback keys
    pub fn with_labels(labels: Vec<SegmentLabel>) -> Self {
        Self {
            labels,
            ..Self::default()
        }
    }
}

/// A located header: where its text starts and where its content starts
struct LabelMatch {
    label_start: usize,
    content_start: usize,
    key: String,
}

/// Parse labeled sections into an ordered segment map
///
/// Every occurrence of `LABEL:` at the start of a line (case-insensitive)
/// opens a section that runs until the next recognized header or the end of
/// the text. Sections whose trimmed content is empty are skipped. A label
/// that occurs twice keeps its first position and its last content.
///
/// Without any recognized header the text is split into paragraphs: first
/// paragraph to the introduction key, second to the method key, the rest
/// joined into the example key.
///
/// Fails with [`ParseError::EmptyResult`] only when the text is empty after
/// normalization.
pub fn parse_segments(raw: &str, vocabulary: &LabelVocabulary) -> Result<SegmentMap, ParseError> {
    let mut matches = find_labels(raw, vocabulary);
    matches.sort_by_key(|m| m.label_start);

    let mut segments = SegmentMap::new();
    for (i, current) in matches.iter().enumerate() {
        let end = matches
            .get(i + 1)
            .map(|next| next.label_start)
            .unwrap_or(raw.len());
        // A header whose trailing whitespace ran into the next header
        if current.content_start >= end {
            continue;
        }
        let content = raw[current.content_start..end].trim();
        if !content.is_empty() {
            segments.insert(current.key.clone(), content.to_string());
        }
    }

    if !segments.is_empty() {
        debug!(
            "Parsed {} labeled segments: {:?}",
            segments.len(),
            segments.keys().collect::<Vec<_>>()
        );
        return Ok(segments);
    }

    let cleaned = normalize(raw);
    if cleaned.is_empty() {
        return Err(ParseError::empty("segments"));
    }

    let paragraphs: Vec<&str> = BLANK_LINE
        .split(&cleaned)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    match paragraphs.as_slice() {
        [] => return Err(ParseError::empty("segments")),
        [only] => {
            segments.insert(vocabulary.introduction_key.clone(), only.to_string());
        }
        [first, second, rest @ ..] => {
            segments.insert(vocabulary.introduction_key.clone(), first.to_string());
            segments.insert(vocabulary.method_key.clone(), second.to_string());
            if !rest.is_empty() {
                segments.insert(vocabulary.example_key.clone(), rest.join("\n\n"));
            }
        }
    }

    debug!("No labeled segments found, used paragraph fallback ({} paragraphs)", paragraphs.len());
    Ok(segments)
}

fn find_labels(raw: &str, vocabulary: &LabelVocabulary) -> Vec<LabelMatch> {
    let mut found = Vec::new();

    for label in &vocabulary.labels {
        let pattern = format!(r"^[ \t]*{}:\s*", regex::escape(label.label.trim()));
        let regex = match RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
        {
            Ok(regex) => regex,
            Err(e) => {
                debug!("Skipping segment label {:?}: {}", label.label, e);
                continue;
            }
        };

        let key = label.key();
        found.extend(regex.find_iter(raw).map(|m| LabelMatch {
            label_start: m.start(),
            content_start: m.end(),
            key: key.clone(),
        }));
    }

    found
}
