//! Model-output parsing
//!
//! Turns free-form text returned by the generation service into typed records.
//! Every parser is a pure text-in/records-out transform: no I/O, no shared
//! mutable state, linear in the input length.
//!
//! | Parser            | Input shape                         | Bad record handling |
//! |-------------------|-------------------------------------|---------------------|
//! | [`parse_list`]     | `Title ||| Description` lines       | batch-fatal         |
//! | [`parse_segments`] | `LABEL:` headed sections            | dropped             |
//! | [`parse_pairs`]    | `QUESTION n:` / `ANSWER n:` blocks   | dropped             |
//!
//! The list parser failing the whole batch on one malformed line while the
//! other two drop bad records is intentional; callers rely on both behaviors.

mod list;
mod normalize;
mod pairs;
mod segments;

pub use list::{parse_list, ListContext, LIST_SEPARATOR};
pub use normalize::normalize;
pub use pairs::parse_pairs;
pub use segments::{parse_segments, LabelVocabulary, SegmentLabel};

use thiserror::Error;

/// Parsing failures
///
/// Distinct from upstream failures: these mean the model answered, but the
/// answer could not be turned into usable records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Zero usable records after every strategy was tried
    #[error("No usable {kind} found in generated text")]
    EmptyResult { kind: &'static str },

    /// A single record failed minimal validation (batch-fatal for lists)
    #[error("Malformed record: {line}")]
    MalformedRecord { line: String },
}

impl ParseError {
    pub(crate) fn empty(kind: &'static str) -> Self {
        ParseError::EmptyResult { kind }
    }
}

/// Identifier form of a title: lowercase, whitespace runs become `-`
///
/// `"Laplace  Transforms"` → `"laplace-transforms"`
pub fn slug(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Segment key form of a label: lowercase, whitespace runs become `_`
pub fn segment_key(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_collapses_whitespace() {
        assert_eq!(slug("First-Order Differential  Equations"), "first-order-differential-equations");
        assert_eq!(slug("  Limits\t"), "limits");
        assert_eq!(slug(""), "");
    }

    #[test]
    fn test_segment_key() {
        assert_eq!(segment_key("CONCEPT INTRODUCTION"), "concept_introduction");
        assert_eq!(segment_key("Example"), "example");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ParseError::empty("subtopics").to_string(),
            "No usable subtopics found in generated text"
        );
        let err = ParseError::MalformedRecord { line: "Limits |||".to_string() };
        assert_eq!(err.to_string(), "Malformed record: Limits |||");
    }
}
