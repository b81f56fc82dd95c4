//! Delimited-list parser (`Title ||| Description` lines)

use super::{normalize, slug, ParseError};
use crate::models::GeneratedSubtopic;

/// Separator between title and description on one line
pub const LIST_SEPARATOR: &str = "|||";

/// Parent the parsed records belong to
#[derive(Debug, Clone)]
pub struct ListContext {
    /// Identifier stored on every record as its parent
    pub parent_id: String,
    /// Title used to derive record identifiers
    pub parent_title: String,
}

impl ListContext {
    /// Context whose parent id is the slug of its title
    pub fn from_title(parent_title: &str) -> Self {
        Self {
            parent_id: slug(parent_title),
            parent_title: parent_title.to_string(),
        }
    }
}

/// Parse `Title ||| Description` lines into subtopic records
///
/// Lines without the separator are ignored. A line that has the separator but
/// an empty title or description fails the whole batch with
/// [`ParseError::MalformedRecord`]. Zero separator lines fails with
/// [`ParseError::EmptyResult`].
///
/// Ids are `{slug(parent_title)}-subtopic-{n}` with `n` starting at 1, in
/// source order.
pub fn parse_list(raw: &str, context: &ListContext) -> Result<Vec<GeneratedSubtopic>, ParseError> {
    let cleaned = normalize(raw);
    let id_prefix = slug(&context.parent_title);

    let records = cleaned
        .lines()
        .filter(|line| !line.trim().is_empty() && line.contains(LIST_SEPARATOR))
        .enumerate()
        .map(|(index, line)| {
            let (title, description) = line
                .split_once(LIST_SEPARATOR)
                .map(|(t, d)| (t.trim(), d.trim()))
                .unwrap_or_default();

            if title.is_empty() || description.is_empty() {
                return Err(ParseError::MalformedRecord {
                    line: line.trim().to_string(),
                });
            }

            Ok(GeneratedSubtopic {
                id: format!("{}-subtopic-{}", id_prefix, index + 1),
                parent_unit_id: context.parent_id.clone(),
                title: title.to_string(),
                description: description.to_string(),
                is_completed: false,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if records.is_empty() {
        return Err(ParseError::empty("subtopics"));
    }

    Ok(records)
}
